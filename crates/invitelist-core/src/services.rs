//! Contracts for the services this engine consumes.
//!
//! Each collaborator is injected into the component that uses it. Transport
//! or backend failures surface as `anyhow::Error`; domain outcomes (a title
//! that does not exist, a missing registration) are ordinary return values.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::model::ids::{AuthorId, EventId, PageId, SourceId};
use crate::model::page::Page;

/// Outcome of resolving a title string on one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleLookup {
    /// The title names an existing page (in any namespace).
    Found(Page),
    /// The string is not a syntactically valid title.
    InvalidTitle,
    /// Well-formed title with no page behind it.
    NotFound,
}

/// Title and page lookups against the content sources.
pub trait PageResolver: Send + Sync {
    /// Resolve a user-supplied title on `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be queried.
    fn resolve(&self, source: &SourceId, title: &str) -> Result<TitleLookup>;

    /// Current state of a page by identity; `None` once it has been deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be queried.
    fn current_page(&self, source: &SourceId, page_id: PageId) -> Result<Option<Page>>;
}

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requester {
    pub id: AuthorId,
    pub name: String,
}

impl Requester {
    #[must_use]
    pub fn new(id: AuthorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Capabilities checked before any work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    GenerateInvitationLists,
}

pub trait PermissionChecker: Send + Sync {
    fn requester_can(&self, capability: Capability, requester: &Requester) -> bool;

    /// # Errors
    ///
    /// Returns an error if the organizer store cannot be queried.
    fn is_organizer(&self, event: EventId, requester: &Requester) -> Result<bool>;
}

/// The slice of an event registration this engine looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRegistration {
    pub id: EventId,
    pub end: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EventRegistration {
    #[must_use]
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }

    #[must_use]
    pub const fn deletion_timestamp(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

pub trait EventLookup: Send + Sync {
    /// Registration attached to `page`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration store cannot be queried.
    fn registration_for_page(&self, page: &Page) -> Result<Option<EventRegistration>>;
}

/// Maps author names to central identities.
pub trait IdentityLookup: Send + Sync {
    /// Every input name appears in the output; unresolvable names map to
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity store cannot be queried.
    fn resolve_names(&self, names: &[String]) -> Result<HashMap<String, Option<AuthorId>>>;
}
