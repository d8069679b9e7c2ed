use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::{RemuxedEntry, StemPipeline};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::jobs::{JobKind, JobManager, JobResult, JobStatus, MemoryStatusStore, StatusStore};
use crate::mix::MixRequest;
use crate::tools::{CommandRunner, ProcessRunner};

/// Job-oriented front end: every operation is queued and tracked by id.
pub struct StemService {
    pipeline: Arc<StemPipeline>,
    jobs: JobManager,
}

impl StemService {
    pub fn new(config: PipelineConfig, runner: Arc<dyn CommandRunner>, store: Arc<dyn StatusStore>) -> Result<Self> {
        config.ensure_dirs()?;
        let jobs = JobManager::new(store, config.workers)?;
        Ok(Self {
            pipeline: Arc::new(StemPipeline::new(config, runner)),
            jobs,
        })
    }

    /// Service running real processes with an in-memory status table.
    pub fn with_defaults(config: PipelineConfig) -> Result<Self> {
        Self::new(config, Arc::new(ProcessRunner), Arc::new(MemoryStatusStore::new()))
    }

    pub fn pipeline(&self) -> &StemPipeline {
        &self.pipeline
    }

    pub fn submit_download(&self, url: impl Into<String>) -> Result<String> {
        let pipeline = Arc::clone(&self.pipeline);
        let url = url.into();
        self.jobs.submit(JobKind::Download, move |progress| {
            let video_path = pipeline.download(&url, progress)?;
            Ok(JobResult::Download { video_path })
        })
    }

    pub fn submit_separate(&self, video: PathBuf, model: Option<String>) -> Result<String> {
        let pipeline = Arc::clone(&self.pipeline);
        self.jobs.submit(JobKind::Separate, move |progress| {
            let outcome = pipeline.separate(&video, model.as_deref(), progress)?;
            Ok(JobResult::Separation {
                separated_dir: outcome.separated_dir,
                model: outcome.model,
                remux: outcome.remux,
            })
        })
    }

    pub fn submit_merge(&self, dir: PathBuf) -> Result<String> {
        let pipeline = Arc::clone(&self.pipeline);
        self.jobs.submit(JobKind::Merge, move |progress| {
            let assembly = pipeline.merge(&dir, progress)?;
            Ok(JobResult::Merge {
                multichannel_path: assembly.path,
                channel_layout: assembly.layout.name().to_string(),
                stem_order: assembly.order,
            })
        })
    }

    pub fn submit_remux(&self, video: PathBuf, dir: PathBuf) -> Result<String> {
        let pipeline = Arc::clone(&self.pipeline);
        self.jobs.submit(JobKind::Remux, move |progress| {
            pipeline.remux(&video, &dir, progress).map(JobResult::Remux)
        })
    }

    pub fn submit_mix_export(&self, request: MixRequest) -> Result<String> {
        let pipeline = Arc::clone(&self.pipeline);
        self.jobs.submit(JobKind::MixExport, move |progress| {
            pipeline.mix_export(&request, progress).map(JobResult::MixExport)
        })
    }

    pub fn status(&self, id: &str) -> Option<JobStatus> {
        self.jobs.status(id)
    }

    /// Block until job `id` is terminal. `None` for unknown ids.
    pub fn wait(&self, id: &str, poll: Duration) -> Option<JobStatus> {
        self.jobs.wait(id, poll, None)
    }

    pub fn list_remuxed(&self) -> Result<Vec<RemuxedEntry>> {
        self.pipeline.list_remuxed()
    }

    /// Wipe the work directories and forget every job.
    pub fn cleanup(&self) -> Result<()> {
        self.pipeline.cleanup()?;
        self.jobs.store().clear();
        Ok(())
    }
}
