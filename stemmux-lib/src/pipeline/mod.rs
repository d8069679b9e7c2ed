//! Job bodies: what each scheduled operation actually does.
//!
//! [`StemPipeline`] owns the configuration and the command runner; every
//! operation is synchronous and meant to run on a worker thread.

mod catalog;
mod service;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::Serialize;

pub use catalog::{list_remuxed, RemuxedEntry};
pub use service::StemService;

use crate::assembly::{assemble_multichannel, ensure_multichannel, MultichannelAssembly};
use crate::config::PipelineConfig;
use crate::error::{Result, StemError};
use crate::jobs::ProgressReporter;
use crate::mix::{render_mix, MixOutcome, MixRequest};
use crate::tools::{download_video, remux_multichannel, separate_stems, CommandRunner};

/// Suffix appended to a video's base name for its multichannel remux.
pub const REMUXED_SUFFIX: &str = "_remuxed.mp4";

/// Result of remuxing a video with its assembled stems.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemuxOutcome {
    pub remuxed_path: PathBuf,
    pub stem_count: usize,
    pub stem_order: Vec<String>,
    pub channel_layout: String,
    pub multichannel_path: PathBuf,
}

/// Result of separating a video into stems.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparationOutcome {
    pub separated_dir: PathBuf,
    pub model: String,
    pub remux: RemuxOutcome,
}

/// Synchronous implementation of every pipeline operation.
pub struct StemPipeline {
    config: PipelineConfig,
    runner: Arc<dyn CommandRunner>,
}

impl StemPipeline {
    pub fn new(config: PipelineConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch `url` into the downloads directory.
    pub fn download(&self, url: &str, progress: &ProgressReporter) -> Result<PathBuf> {
        progress.report(0.0, "Starting download...");
        let path = download_video(self.runner.as_ref(), &self.config, url)?;
        progress.report(1.0, "Post-processing download...");
        Ok(path)
    }

    /// Separate `video` into stems with `model`, then remux the video with
    /// the assembled multichannel stream.
    pub fn separate(&self, video: &Path, model: Option<&str>, progress: &ProgressReporter) -> Result<SeparationOutcome> {
        require_file(video)?;
        let model = model
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(&self.config.default_model);

        progress.report(0.0, "Starting separation...");
        let separation = separate_stems(self.runner.as_ref(), &self.config, video, model)?;
        info!(
            "separated {} on {} into {}",
            video.display(),
            separation.device,
            separation.stem_dir.display()
        );

        progress.report(0.9, "Separation complete. Starting auto-remux...");
        let remux = self.remux_into(video, &separation.stem_dir, progress)?;

        Ok(SeparationOutcome {
            separated_dir: separation.stem_dir,
            model: separation.model,
            remux,
        })
    }

    /// Assemble the stems in `dir` into a multichannel stream.
    pub fn merge(&self, dir: &Path, progress: &ProgressReporter) -> Result<MultichannelAssembly> {
        require_dir(dir)?;
        progress.report(0.0, "Merging stems...");
        assemble_multichannel(dir)
    }

    /// Remux `video` with the multichannel stream of `dir`.
    pub fn remux(&self, video: &Path, dir: &Path, progress: &ProgressReporter) -> Result<RemuxOutcome> {
        require_file(video)?;
        require_dir(dir)?;
        self.remux_into(video, dir, progress)
    }

    /// Render a gain mix of the stems in `request.stem_dir`.
    pub fn mix_export(&self, request: &MixRequest, progress: &ProgressReporter) -> Result<MixOutcome> {
        progress.report(0.0, "Starting mix export...");
        render_mix(self.runner.as_ref(), &self.config, request)
    }

    /// Catalog of remuxed videos.
    pub fn list_remuxed(&self) -> Result<Vec<RemuxedEntry>> {
        list_remuxed(&self.config)
    }

    /// Remove and recreate every work directory.
    pub fn cleanup(&self) -> Result<()> {
        for dir in self.config.work_dirs() {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
            }
            std::fs::create_dir_all(dir)?;
        }
        info!("work directories cleaned");
        Ok(())
    }

    fn remux_into(&self, video: &Path, dir: &Path, progress: &ProgressReporter) -> Result<RemuxOutcome> {
        progress.report(0.92, "Preparing multichannel stems...");
        let assembly = ensure_multichannel(dir)?;

        let base = video
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| StemError::InvalidInput(format!("{} has no file name", video.display())))?;
        std::fs::create_dir_all(&self.config.remuxed_dir)?;
        let remuxed_path = self
            .config
            .remuxed_dir
            .join(format!("{}{}", base, REMUXED_SUFFIX));

        progress.report(0.95, "Remuxing stems into MP4...");
        remux_multichannel(
            self.runner.as_ref(),
            &self.config.ffmpeg,
            video,
            &assembly.path,
            assembly.layout.name(),
            &remuxed_path,
        )?;

        Ok(RemuxOutcome {
            remuxed_path,
            stem_count: assembly.order.len(),
            stem_order: assembly.order,
            channel_layout: assembly.layout.name().to_string(),
            multichannel_path: assembly.path,
        })
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(StemError::NotFound(format!("{}", path.display())))
    }
}

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(StemError::NotFound(format!("{}", path.display())))
    }
}
