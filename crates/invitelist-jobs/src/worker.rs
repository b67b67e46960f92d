use anyhow::Result;
use invitelist_core::ListId;
use tracing::{info, warn};

use crate::job::{GenerationJob, JobEnv, JobError, JobOutcome};
use crate::queue::MemoryJobQueue;

/// What one drain of the queue did.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub completed: Vec<JobOutcome>,
    /// Failed jobs with the list they belonged to, when the payload named one.
    pub failed: Vec<(Option<ListId>, JobError)>,
}

impl DrainReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run every waiting job in queue order.
///
/// A failing job is logged and recorded, and the drain moves on. Nothing is
/// retried here.
///
/// # Errors
///
/// Returns an error only if the queue itself cannot be read.
pub fn run_pending(queue: &MemoryJobQueue, env: &JobEnv<'_>) -> Result<DrainReport> {
    let mut report = DrainReport::default();

    while let Some(payload) = queue.pop()? {
        let list_id = payload.list_id;
        let result = GenerationJob::from_payload(payload).and_then(|job| job.run(env));
        match result {
            Ok(outcome) => report.completed.push(outcome),
            Err(err) => {
                warn!(
                    list_id = list_id.map(|id| id.0),
                    code = %err.code(),
                    error = %err,
                    "generation job failed"
                );
                report.failed.push((list_id, err));
            }
        }
    }

    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        "drained job queue"
    );
    Ok(report)
}
