//! Background generation job.
//!
//! A list moves `pending -> ready` exactly once, after its candidates (if
//! any) are stored. A failed run leaves the list pending for the job
//! framework to retry.

use std::collections::HashMap;
use std::sync::Arc;

use invitelist_core::config::ScoringConfig;
use invitelist_core::db::store::StoreError;
use invitelist_core::services::{IdentityLookup, PageResolver};
use invitelist_core::{
    AuthorId, Clock, ErrorCode, InvitationListStore, ListId, ListStatus, Score, Worklist,
};
use invitelist_triage::{DebugSink, InvitationScorer, RevisionSource, rank};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::payload::{JobPayload, PayloadError, decode_worklist};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job payload is missing '{0}'")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("worklist pages could not be reloaded: {0:#}")]
    Pages(#[source] anyhow::Error),

    #[error("scoring failed: {0:#}")]
    Scoring(#[source] anyhow::Error),

    #[error("identity lookup failed: {0:#}")]
    Identity(#[source] anyhow::Error),
}

impl JobError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingParameter(_) => ErrorCode::MissingJobParameter,
            Self::Payload(err) => err.code(),
            Self::Store(err) => err.code(),
            Self::Pages(_) | Self::Scoring(_) | Self::Identity(_) => {
                ErrorCode::CollaboratorFailure
            }
        }
    }
}

/// Everything a job needs besides its payload.
///
/// Each worker owns its own store connection.
pub struct JobEnv<'a> {
    pub store: &'a InvitationListStore,
    pub pages: Arc<dyn PageResolver>,
    pub revisions: Arc<dyn RevisionSource>,
    pub identities: Arc<dyn IdentityLookup>,
    pub clock: Arc<dyn Clock>,
    pub scoring: ScoringConfig,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub list_id: ListId,
    /// Authors the scorer returned.
    pub candidates: usize,
    /// Candidates stored after identity resolution.
    pub stored: usize,
}

pub struct GenerationJob {
    list_id: ListId,
    serialized_worklist: String,
    debug_sink: Option<DebugSink>,
}

impl std::fmt::Debug for GenerationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationJob")
            .field("list_id", &self.list_id)
            .field("debug_sink", &self.debug_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl GenerationJob {
    /// Validate a queued payload.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::MissingParameter`] naming the first absent field.
    pub fn from_payload(payload: JobPayload) -> Result<Self, JobError> {
        let list_id = payload
            .list_id
            .ok_or(JobError::MissingParameter("list_id"))?;
        let serialized_worklist = payload
            .serialized_worklist
            .ok_or(JobError::MissingParameter("serialized_worklist"))?;

        Ok(Self {
            list_id,
            serialized_worklist,
            debug_sink: None,
        })
    }

    #[must_use]
    pub const fn list_id(&self) -> ListId {
        self.list_id
    }

    /// Forward the scorer's diagnostic trace to `sink`.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    /// Score the worklist's contributors, store them, and mark the list ready.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the list stays pending in that case.
    #[instrument(skip_all, fields(list_id = self.list_id.0))]
    pub fn run(self, env: &JobEnv<'_>) -> Result<JobOutcome, JobError> {
        let Self {
            list_id,
            serialized_worklist,
            debug_sink,
        } = self;

        let refs = decode_worklist(&serialized_worklist)?;
        let stored_pages = refs.len();
        let worklist = Worklist::rehydrate(refs, env.pages.as_ref()).map_err(JobError::Pages)?;
        if worklist.page_count() < stored_pages {
            debug!(
                dropped = stored_pages - worklist.page_count(),
                "worklist pages no longer available"
            );
        }

        let mut scorer =
            InvitationScorer::new(env.revisions.clone(), env.clock.clone(), env.scoring);
        scorer.set_debug_sink(debug_sink);
        let scores = scorer.generate(&worklist).map_err(JobError::Scoring)?;

        let candidates = scores.len();
        let mut stored = 0;
        if candidates > 0 {
            let users = resolve_authors(env.identities.as_ref(), &scores)?;
            stored = users.len();
            env.store.store_invitation_list_users(list_id, &users)?;
        }

        env.store.update_status(list_id, ListStatus::Ready)?;

        info!(candidates, stored, "invitation list ready");
        Ok(JobOutcome {
            list_id,
            candidates,
            stored,
        })
    }
}

/// Map author names to identities, dropping names with no account.
///
/// Should two names resolve to one identity, the higher score is kept.
fn resolve_authors(
    identities: &dyn IdentityLookup,
    scores: &HashMap<String, Score>,
) -> Result<HashMap<AuthorId, Score>, JobError> {
    let ranked = rank(scores);
    let names: Vec<String> = ranked.iter().map(|(name, _)| name.clone()).collect();
    let resolved = identities
        .resolve_names(&names)
        .map_err(JobError::Identity)?;

    let mut users: HashMap<AuthorId, Score> = HashMap::with_capacity(ranked.len());
    for (name, score) in ranked {
        match resolved.get(&name).copied().flatten() {
            Some(author) => {
                let entry = users.entry(author).or_insert(score);
                *entry = (*entry).max(score);
            }
            None => warn!(author = %name, "dropping candidate without a central identity"),
        }
    }
    Ok(users)
}
