use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use log::warn;

use super::JobStatus;

/// Shared job-status table keyed by job id.
///
/// Implementations must refuse updates that would move a job backwards.
pub trait StatusStore: Send + Sync {
    /// Store `status` for `id`. Returns `false` when the transition is refused.
    fn set(&self, id: &str, status: JobStatus) -> bool;

    fn get(&self, id: &str) -> Option<JobStatus>;

    /// Forget every job.
    fn clear(&self);
}

/// In-process [`StatusStore`].
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    jobs: Mutex<HashMap<String, JobStatus>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusStore for MemoryStatusStore {
    fn set(&self, id: &str, status: JobStatus) -> bool {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = jobs.get(id) {
            if !current.state.can_transition_to(status.state) {
                warn!(
                    "job {}: refusing {:?} -> {:?}",
                    id, current.state, status.state
                );
                return false;
            }
        }
        jobs.insert(id.to_string(), status);
        true
    }

    fn get(&self, id: &str) -> Option<JobStatus> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn clear(&self) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
