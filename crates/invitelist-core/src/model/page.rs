use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{PageId, SourceId};

/// Namespace number of regular content pages.
pub const MAIN_NAMESPACE: i32 = 0;

/// A page as currently known to its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    pub source: SourceId,
    pub id: PageId,
    pub namespace: i32,
    pub title: String,
}

impl Page {
    #[must_use]
    pub fn new(source: SourceId, id: PageId, namespace: i32, title: impl Into<String>) -> Self {
        Self {
            source,
            id,
            namespace,
            title: title.into(),
        }
    }

    /// Content page in the main namespace.
    #[must_use]
    pub fn article(source: SourceId, id: PageId, title: impl Into<String>) -> Self {
        Self::new(source, id, MAIN_NAMESPACE, title)
    }

    #[must_use]
    pub const fn is_mainspace(&self) -> bool {
        self.namespace == MAIN_NAMESPACE
    }

    /// Title-free reference used for persistence and job payloads.
    #[must_use]
    pub fn to_ref(&self) -> PageRef {
        PageRef {
            source: self.source.clone(),
            page_id: self.id,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.title)
    }
}

/// Stable reference to a page: source plus page ID, no title.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub source: SourceId,
    pub page_id: PageId,
}
