use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ids::{AuthorId, EventId, ListId, Score, SourceId};

/// Generation status of an invitation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Pending,
    Ready,
}

impl ListStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
        }
    }

    /// Status only moves forward: `pending -> ready`. Writing the current
    /// status again is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        !matches!((self, target), (Self::Ready, Self::Pending))
    }
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown list status '{0}': expected pending or ready")]
pub struct UnknownStatus(pub String);

impl FromStr for ListStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "ready" => Ok(Self::Ready),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationList {
    pub id: ListId,
    pub name: String,
    pub event: Option<EventId>,
    pub status: ListStatus,
    pub creator: AuthorId,
    /// Source (wiki) the list was created on.
    pub source: SourceId,
    pub created_at: DateTime<Utc>,
}

/// A persisted candidate and their score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoredInvitee {
    pub author: AuthorId,
    pub score: Score,
}
