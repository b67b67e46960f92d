#![forbid(unsafe_code)]
//! invitelist-core library.
//!
//! Value types, collaborator contracts, worklist validation and the SQLite
//! invitation list store.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per component; `anyhow::Result` for
//!   collaborator calls and glue code.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod parser;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
pub use db::store::InvitationListStore;
pub use error::{ErrorClass, ErrorCode};
pub use model::ids::{AuthorId, EventId, ListId, PageId, Score, SourceId};
pub use model::list::{InvitationList, ListStatus, ScoredInvitee};
pub use model::page::{MAIN_NAMESPACE, Page, PageRef};
pub use model::worklist::{Worklist, WorklistError};
pub use parser::{WorklistIssue, WorklistParseError, WorklistParser, WorklistReport};
