//! Edit history contract.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use invitelist_core::{PageId, SourceId};

/// One revision of a worklist page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: u64,
    pub page_id: PageId,
    /// Registered author name; `None` for anonymous or hidden authors.
    pub author: Option<String>,
    pub author_is_bot: bool,
    pub timestamp: DateTime<Utc>,
    /// Signed byte size change relative to the parent revision.
    pub size_delta: i64,
}

pub trait RevisionSource: Send + Sync {
    /// Revisions of `pages` on `source` with `timestamp >= since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be queried.
    fn revisions_since(
        &self,
        source: &SourceId,
        pages: &[PageId],
        since: DateTime<Utc>,
    ) -> Result<Vec<Revision>>;

    /// Lifetime edit counts of the named accounts. Names missing from the
    /// result count as zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the account store cannot be queried.
    fn edit_counts(&self, authors: &[String]) -> Result<HashMap<String, u64>>;
}
