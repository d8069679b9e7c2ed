//! Background jobs: status bookkeeping and the thread pool that runs them.

mod manager;
mod store;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

pub use manager::{JobManager, ProgressReporter};
pub use store::{MemoryStatusStore, StatusStore};

use crate::mix::MixOutcome;
use crate::pipeline::RemuxOutcome;

/// Lifecycle of a job. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a status in `self` may be replaced by one in `next`.
    ///
    /// Running may be re-entered to update progress; terminal states are final.
    pub fn can_transition_to(self, next: JobState) -> bool {
        match self {
            Self::Pending => true,
            Self::Running => next != Self::Pending,
            Self::Completed | Self::Failed => false,
        }
    }
}

/// The kinds of work the pipeline schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Download,
    Separate,
    Merge,
    Remux,
    MixExport,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Download => "download",
            Self::Separate => "separation",
            Self::Merge => "merge",
            Self::Remux => "remux",
            Self::MixExport => "mix export",
        };
        f.write_str(label)
    }
}

impl JobKind {
    /// Status message recorded when a job of this kind completes.
    pub fn completion_message(self) -> &'static str {
        match self {
            Self::Download => "Download complete.",
            Self::Separate => "Separation and remux complete.",
            Self::Merge => "Stems merged successfully.",
            Self::Remux => "Remux complete.",
            Self::MixExport => "Mix export complete.",
        }
    }
}

/// Payload of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobResult {
    Download {
        video_path: PathBuf,
    },
    Separation {
        separated_dir: PathBuf,
        model: String,
        #[serde(flatten)]
        remux: RemuxOutcome,
    },
    Merge {
        multichannel_path: PathBuf,
        stem_order: Vec<String>,
        channel_layout: String,
    },
    Remux(RemuxOutcome),
    MixExport(MixOutcome),
}

/// Snapshot of a job as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    pub progress: f32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
}

impl JobStatus {
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            state: JobState::Pending,
            progress: 0.0,
            message: message.into(),
            result: None,
        }
    }

    pub fn running(progress: f32, message: impl Into<String>) -> Self {
        Self {
            state: JobState::Running,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            result: None,
        }
    }

    pub fn completed(message: impl Into<String>, result: JobResult) -> Self {
        Self {
            state: JobState::Completed,
            progress: 1.0,
            message: message.into(),
            result: Some(result),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            progress: 0.0,
            message: message.into(),
            result: None,
        }
    }
}
