#![forbid(unsafe_code)]
//! invitelist-jobs library.
//!
//! Request-time list creation and the background job that fills a list with
//! scored invitees.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at the public boundary; `anyhow` for
//!   collaborator failures underneath.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod generator;
pub mod job;
pub mod logging;
pub mod payload;
pub mod queue;
pub mod worker;

pub use generator::{GeneratorError, InvitationListGenerator, ListValidationError};
pub use job::{GenerationJob, JobEnv, JobError, JobOutcome};
pub use payload::{JobPayload, PayloadError, decode_worklist, encode_worklist};
pub use queue::{JobQueue, MemoryJobQueue};
pub use worker::{DrainReport, run_pending};
