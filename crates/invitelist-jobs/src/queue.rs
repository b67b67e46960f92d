//! Job queue contract and an in-process queue.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use anyhow::{Result, anyhow, bail};

use crate::payload::JobPayload;

/// Accepts generation jobs for later execution.
pub trait JobQueue: Send + Sync {
    /// Queue one job.
    ///
    /// # Errors
    ///
    /// Returns an error if the job could not be accepted.
    fn enqueue(&self, payload: JobPayload) -> Result<()>;
}

/// FIFO queue held in process memory.
///
/// Nothing survives a restart. Suited to tests and single-process embedders.
#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<VecDeque<JobPayload>>,
    max_capacity: Option<usize>,
}

fn poisoned<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("job queue lock poisoned")
}

impl MemoryJobQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that refuses jobs once `max_capacity` are waiting.
    #[must_use]
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::with_capacity(max_capacity)),
            max_capacity: Some(max_capacity),
        }
    }

    /// Take the oldest waiting job.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn pop(&self) -> Result<Option<JobPayload>> {
        Ok(self.jobs.lock().map_err(poisoned)?.pop_front())
    }

    /// Number of waiting jobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.jobs.lock().map_err(poisoned)?.len())
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl JobQueue for MemoryJobQueue {
    fn enqueue(&self, payload: JobPayload) -> Result<()> {
        let mut jobs = self.jobs.lock().map_err(poisoned)?;
        if let Some(max) = self.max_capacity {
            if jobs.len() >= max {
                bail!("job queue full ({max} waiting)");
            }
        }
        jobs.push_back(payload);
        drop(jobs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invitelist_core::ListId;

    fn payload(id: i64) -> JobPayload {
        JobPayload::new(ListId(id), "{}".to_string())
    }

    #[test]
    fn jobs_come_out_in_order() {
        let queue = MemoryJobQueue::new();
        queue.enqueue(payload(1)).expect("enqueue");
        queue.enqueue(payload(2)).expect("enqueue");

        assert_eq!(queue.len().expect("len"), 2);
        assert_eq!(queue.pop().expect("pop"), Some(payload(1)));
        assert_eq!(queue.pop().expect("pop"), Some(payload(2)));
        assert_eq!(queue.pop().expect("pop"), None);
        assert!(queue.is_empty().expect("is_empty"));
    }

    #[test]
    fn full_queue_rejects_jobs() {
        let queue = MemoryJobQueue::with_capacity(1);
        queue.enqueue(payload(1)).expect("first fits");
        let err = queue.enqueue(payload(2)).expect_err("second overflows");
        assert!(err.to_string().contains("full"));
        assert_eq!(queue.len().expect("len"), 1);
    }
}
