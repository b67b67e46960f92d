//! Job payload and the versioned worklist encoding it carries.
//!
//! ```json
//! {"version":1,"pages":[{"source":"enwiki","page_id":12}]}
//! ```
//!
//! Only page identities travel; titles are looked up again when the job runs.

use invitelist_core::{ErrorCode, ListId, PageRef, Worklist};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WORKLIST_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unsupported worklist payload version {found}, expected {expected}", expected = WORKLIST_FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("malformed worklist payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl PayloadError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::UnsupportedPayloadVersion,
            Self::Malformed(_) => ErrorCode::MalformedPayload,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedWorklist {
    version: u32,
    pages: Vec<PageRef>,
}

/// Encode the page identities of `worklist`, grouped by ascending source.
///
/// # Errors
///
/// Returns [`PayloadError::Malformed`] if serialization fails.
pub fn encode_worklist(worklist: &Worklist) -> Result<String, PayloadError> {
    let body = SerializedWorklist {
        version: WORKLIST_FORMAT_VERSION,
        pages: worklist.page_refs(),
    };
    Ok(serde_json::to_string(&body)?)
}

/// Decode page identities previously written by [`encode_worklist`].
///
/// The version is checked before the page list is interpreted, so a future
/// layout with the same field names is still rejected.
///
/// # Errors
///
/// Returns [`PayloadError::UnsupportedVersion`] for unknown versions and
/// [`PayloadError::Malformed`] for anything that is not a valid payload.
pub fn decode_worklist(encoded: &str) -> Result<Vec<PageRef>, PayloadError> {
    #[derive(Deserialize)]
    struct Header {
        version: u32,
    }

    let header: Header = serde_json::from_str(encoded)?;
    if header.version != WORKLIST_FORMAT_VERSION {
        return Err(PayloadError::UnsupportedVersion {
            found: header.version,
        });
    }

    let body: SerializedWorklist = serde_json::from_str(encoded)?;
    Ok(body.pages)
}

/// Parameters of one generation job.
///
/// Both fields are optional on the wire so that a truncated payload is
/// reported as a missing parameter rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<ListId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_worklist: Option<String>,
}

impl JobPayload {
    #[must_use]
    pub const fn new(list_id: ListId, serialized_worklist: String) -> Self {
        Self {
            list_id: Some(list_id),
            serialized_worklist: Some(serialized_worklist),
        }
    }
}
