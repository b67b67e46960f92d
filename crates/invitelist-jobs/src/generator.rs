//! Request-time list creation.
//!
//! # Check order
//!
//! 1. capability (`PermissionDenied`)
//! 2. name not blank
//! 3. name length in bytes
//! 4. event page resolves on the local source
//! 5. the page carries an event registration
//! 6. registration not deleted
//! 7. event not over
//! 8. requester organizes the event
//!
//! The first failing check wins. Nothing is written or queued unless every
//! check passes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use invitelist_core::config::ListConfig;
use invitelist_core::db::store::StoreError;
use invitelist_core::services::{
    Capability, EventLookup, EventRegistration, PageResolver, PermissionChecker, Requester,
    TitleLookup,
};
use invitelist_core::{
    Clock, ErrorCode, EventId, InvitationListStore, ListId, Page, SourceId, Worklist,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::payload::{JobPayload, PayloadError, encode_worklist};
use crate::queue::JobQueue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListValidationError {
    #[error("invitation list name is empty")]
    EmptyName,

    #[error("invitation list name is {actual} bytes, limit is {max}")]
    NameTooLong { max: usize, actual: usize },

    #[error("'{0}' is not an event page")]
    InvalidEventPage(String),

    #[error("event {0} has been deleted")]
    EventDeleted(EventId),

    #[error("event {0} has already ended")]
    EventEnded(EventId),

    #[error("requester is not an organizer of event {0}")]
    NotOrganizer(EventId),
}

impl ListValidationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyName => ErrorCode::EmptyListName,
            Self::NameTooLong { .. } => ErrorCode::ListNameTooLong,
            Self::InvalidEventPage(_) => ErrorCode::InvalidEventPage,
            Self::EventDeleted(_) => ErrorCode::EventDeleted,
            Self::EventEnded(_) => ErrorCode::EventEnded,
            Self::NotOrganizer(_) => ErrorCode::NotOrganizer,
        }
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("requester may not generate invitation lists")]
    PermissionDenied,

    #[error(transparent)]
    Validation(#[from] ListValidationError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("lookup failed: {0:#}")]
    Lookup(#[source] anyhow::Error),

    #[error("could not queue generation job: {0:#}")]
    Enqueue(#[source] anyhow::Error),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

impl GeneratorError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied => ErrorCode::PermissionDenied,
            Self::Validation(err) => err.code(),
            Self::Storage(err) => err.code(),
            Self::Lookup(_) | Self::Enqueue(_) => ErrorCode::CollaboratorFailure,
            Self::Payload(err) => err.code(),
        }
    }
}

pub struct InvitationListGenerator<'a> {
    store: &'a InvitationListStore,
    permissions: Arc<dyn PermissionChecker>,
    pages: Arc<dyn PageResolver>,
    events: Arc<dyn EventLookup>,
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
    config: ListConfig,
}

impl<'a> InvitationListGenerator<'a> {
    #[must_use]
    pub fn new(
        store: &'a InvitationListStore,
        permissions: Arc<dyn PermissionChecker>,
        pages: Arc<dyn PageResolver>,
        events: Arc<dyn EventLookup>,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
        config: ListConfig,
    ) -> Self {
        Self {
            store,
            permissions,
            pages,
            events,
            queue,
            clock,
            config,
        }
    }

    /// Create a list after checking that `requester` may generate lists.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::PermissionDenied`] before anything else, then
    /// anything [`Self::create_unsafe`] returns.
    #[instrument(skip_all, fields(requester = %requester.name))]
    pub fn create_if_allowed(
        &self,
        name: &str,
        event_page: Option<&str>,
        worklist: &Worklist,
        requester: &Requester,
    ) -> Result<ListId, GeneratorError> {
        if !self
            .permissions
            .requester_can(Capability::GenerateInvitationLists, requester)
        {
            debug!("requester lacks the generation capability");
            return Err(GeneratorError::PermissionDenied);
        }
        self.create_unsafe(name, event_page, worklist, requester)
    }

    /// Create a list without the capability check.
    ///
    /// On success the list is stored PENDING together with its worklist and
    /// one generation job is queued. If queueing fails the list stays
    /// PENDING and [`GeneratorError::Enqueue`] is returned.
    ///
    /// # Errors
    ///
    /// Returns the first failed validation step, or a storage, lookup, or
    /// queue failure.
    pub fn create_unsafe(
        &self,
        name: &str,
        event_page: Option<&str>,
        worklist: &Worklist,
        requester: &Requester,
    ) -> Result<ListId, GeneratorError> {
        let name = check_name_not_empty(name)?;
        check_name_length(name, self.config.name_max_bytes)?;

        let event = match event_page {
            Some(title) => Some(self.check_event(title, requester)?),
            None => None,
        };

        let serialized = encode_worklist(worklist)?;
        let id = self
            .store
            .create_invitation_list_with_worklist(name, event, requester.id, worklist)?;

        self.queue
            .enqueue(JobPayload::new(id, serialized))
            .map_err(GeneratorError::Enqueue)?;

        info!(
            list_id = id.0,
            event = event.map(|e| e.0),
            pages = worklist.page_count(),
            "queued invitation list generation"
        );
        Ok(id)
    }

    fn check_event(&self, title: &str, requester: &Requester) -> Result<EventId, GeneratorError> {
        let page = resolve_event_page(self.pages.as_ref(), self.store.local_source(), title)?;
        let registration = self
            .events
            .registration_for_page(&page)
            .map_err(GeneratorError::Lookup)?;
        let registration = require_registration(registration, title)?;
        check_not_deleted(&registration)?;
        check_not_ended(&registration, self.clock.now())?;

        let organizer = self
            .permissions
            .is_organizer(registration.id, requester)
            .map_err(GeneratorError::Lookup)?;
        check_organizer(organizer, registration.id)?;
        Ok(registration.id)
    }
}

fn check_name_not_empty(name: &str) -> Result<&str, ListValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ListValidationError::EmptyName);
    }
    Ok(trimmed)
}

fn check_name_length(name: &str, max: usize) -> Result<(), ListValidationError> {
    if name.len() > max {
        return Err(ListValidationError::NameTooLong {
            max,
            actual: name.len(),
        });
    }
    Ok(())
}

fn resolve_event_page(
    pages: &dyn PageResolver,
    source: &SourceId,
    title: &str,
) -> Result<Page, GeneratorError> {
    match pages.resolve(source, title).map_err(GeneratorError::Lookup)? {
        TitleLookup::Found(page) => Ok(page),
        TitleLookup::InvalidTitle | TitleLookup::NotFound => {
            Err(ListValidationError::InvalidEventPage(title.to_string()).into())
        }
    }
}

fn require_registration(
    registration: Option<EventRegistration>,
    title: &str,
) -> Result<EventRegistration, ListValidationError> {
    registration.ok_or_else(|| ListValidationError::InvalidEventPage(title.to_string()))
}

const fn check_not_deleted(registration: &EventRegistration) -> Result<(), ListValidationError> {
    if registration.deletion_timestamp().is_some() {
        return Err(ListValidationError::EventDeleted(registration.id));
    }
    Ok(())
}

fn check_not_ended(
    registration: &EventRegistration,
    now: DateTime<Utc>,
) -> Result<(), ListValidationError> {
    if registration.is_past(now) {
        return Err(ListValidationError::EventEnded(registration.id));
    }
    Ok(())
}

const fn check_organizer(organizer: bool, event: EventId) -> Result<(), ListValidationError> {
    if !organizer {
        return Err(ListValidationError::NotOrganizer(event));
    }
    Ok(())
}
