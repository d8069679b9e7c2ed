use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

use super::{JobKind, JobResult, JobStatus, MemoryStatusStore, StatusStore};
use crate::error::{Result, StemError};

/// Handle a running job uses to publish progress.
#[derive(Clone)]
pub struct ProgressReporter {
    id: String,
    store: Arc<dyn StatusStore>,
}

impl ProgressReporter {
    pub fn new(id: impl Into<String>, store: Arc<dyn StatusStore>) -> Self {
        Self {
            id: id.into(),
            store,
        }
    }

    /// Reporter whose updates go nowhere anyone reads.
    pub fn detached() -> Self {
        Self::new("detached", Arc::new(MemoryStatusStore::new()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Record `progress` (0..=1) and a human-readable message.
    pub fn report(&self, progress: f32, message: impl Into<String>) {
        self.store.set(&self.id, JobStatus::running(progress, message));
    }
}

/// Schedules jobs onto a rayon thread pool and tracks them in a [`StatusStore`].
pub struct JobManager {
    store: Arc<dyn StatusStore>,
    thread_pool: rayon::ThreadPool,
}

impl JobManager {
    pub fn new(store: Arc<dyn StatusStore>, workers: usize) -> Result<Self> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("stemmux-worker-{}", i))
            .build()
            .map_err(|err| StemError::InvalidInput(format!("could not start job workers: {}", err)))?;

        Ok(Self { store, thread_pool })
    }

    pub fn workers(&self) -> usize {
        self.thread_pool.current_num_threads()
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Queue `job` and return its id. The job starts as pending.
    ///
    /// Errors and panics inside `job` end it as failed with a message
    /// prefixed by `kind`; they never reach other jobs.
    pub fn submit<F>(&self, kind: JobKind, job: F) -> Result<String>
    where
        F: FnOnce(&ProgressReporter) -> Result<JobResult> + Send + 'static,
    {
        let id = uuid::Uuid::new_v4().to_string();
        self.store
            .set(&id, JobStatus::pending(format!("{} queued", kind)));

        let reporter = ProgressReporter::new(id.clone(), Arc::clone(&self.store));
        self.thread_pool.spawn(move || run_job(kind, reporter, job));

        info!("queued {} job {}", kind, id);
        Ok(id)
    }

    pub fn status(&self, id: &str) -> Option<JobStatus> {
        self.store.get(id)
    }

    /// Poll until job `id` reaches a terminal state or `timeout` elapses.
    ///
    /// Returns the last status seen, or `None` for unknown ids.
    pub fn wait(&self, id: &str, poll: Duration, timeout: Option<Duration>) -> Option<JobStatus> {
        let started = Instant::now();
        loop {
            let status = self.status(id)?;
            let expired = timeout.map(|t| started.elapsed() >= t).unwrap_or(false);
            if status.state.is_terminal() || expired {
                return Some(status);
            }
            thread::sleep(poll);
        }
    }
}

fn run_job<F>(kind: JobKind, reporter: ProgressReporter, job: F)
where
    F: FnOnce(&ProgressReporter) -> Result<JobResult>,
{
    reporter.report(0.0, format!("{} started", kind));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&reporter)));
    let status = match outcome {
        Ok(Ok(result)) => {
            info!("{} job {} completed", kind, reporter.id());
            JobStatus::completed(kind.completion_message(), result)
        }
        Ok(Err(err)) => {
            error!("{} job {} failed: {}", kind, reporter.id(), err);
            JobStatus::failed(format!("{} failed: {}", kind, err))
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!("{} job {} panicked: {}", kind, reporter.id(), reason);
            JobStatus::failed(format!("{} failed: {}", kind, reason))
        }
    };
    reporter.store.set(reporter.id(), status);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}
