#![forbid(unsafe_code)]
//! invitelist-triage library.
//!
//! Scans the edit history of worklist pages, attributes qualifying edits to
//! their authors and turns each author's contributions into a score.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod rank;
pub mod revisions;
pub mod score;
pub mod scorer;
pub mod trace;

pub use rank::rank;
pub use revisions::{Revision, RevisionSource};
pub use scorer::InvitationScorer;
pub use trace::DebugSink;
