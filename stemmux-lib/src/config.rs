//! Pipeline configuration: work directories, tool programs and pool sizing.

use std::path::{Path, PathBuf};

use log::debug;

use crate::constants::DEFAULT_MODEL;
use crate::error::Result;

const DEFAULT_WORKERS: usize = 2;
const DOWNLOADS: &str = "downloads";
const SEPARATED: &str = "separated";
const MIXES: &str = "mixes";
const REMUXED: &str = "remuxed";

/// Locations and external programs used by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub downloads_dir: PathBuf,
    pub separated_dir: PathBuf,
    pub mixes_dir: PathBuf,
    pub remuxed_dir: PathBuf,
    pub ffmpeg: String,
    pub ytdlp: String,
    pub python: String,
    pub default_model: String,
    /// Compute device handed to demucs. `None` checks for CUDA at run time.
    pub demucs_device: Option<String>,
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_work_dir(".")
    }
}

impl PipelineConfig {
    /// Default configuration rooted at `root`.
    pub fn with_work_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            downloads_dir: root.join(DOWNLOADS),
            separated_dir: root.join(SEPARATED),
            mixes_dir: root.join(MIXES),
            remuxed_dir: root.join(REMUXED),
            ffmpeg: "ffmpeg".to_string(),
            ytdlp: "yt-dlp".to_string(),
            python: "python3".to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            demucs_device: None,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Build a configuration from `STEMMUX_*` environment variables.
    ///
    /// Unset variables keep their defaults. `STEMMUX_WORK_DIR` moves all four
    /// work directories at once; the per-directory variables win over it.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("STEMMUX_WORK_DIR") {
            Some(root) => Self::with_work_dir(root),
            None => Self::default(),
        };

        if let Some(dir) = lookup("STEMMUX_DOWNLOADS_DIR") {
            config.downloads_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STEMMUX_SEPARATED_DIR") {
            config.separated_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STEMMUX_MIXES_DIR") {
            config.mixes_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STEMMUX_REMUXED_DIR") {
            config.remuxed_dir = PathBuf::from(dir);
        }
        if let Some(program) = lookup("STEMMUX_FFMPEG") {
            config.ffmpeg = program;
        }
        if let Some(program) = lookup("STEMMUX_YTDLP") {
            config.ytdlp = program;
        }
        if let Some(program) = lookup("STEMMUX_PYTHON") {
            config.python = program;
        }
        if let Some(model) = lookup("STEMMUX_MODEL") {
            config.default_model = model;
        }
        config.demucs_device = lookup("STEMMUX_DEVICE").filter(|device| !device.is_empty());
        if let Some(workers) = lookup("STEMMUX_WORKERS").and_then(|value| value.parse().ok()) {
            config.workers = workers;
        }
        config.workers = config.workers.max(1);

        config
    }

    /// Move all four work directories under `root`.
    pub fn set_work_dir(&mut self, root: impl AsRef<Path>) {
        let root = root.as_ref();
        self.downloads_dir = root.join(DOWNLOADS);
        self.separated_dir = root.join(SEPARATED);
        self.mixes_dir = root.join(MIXES);
        self.remuxed_dir = root.join(REMUXED);
    }

    /// The four work directories, in creation order.
    pub fn work_dirs(&self) -> [&Path; 4] {
        [
            &self.downloads_dir,
            &self.separated_dir,
            &self.mixes_dir,
            &self.remuxed_dir,
        ]
    }

    /// Create any missing work directory.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in self.work_dirs() {
            std::fs::create_dir_all(dir)?;
            debug!("work dir ready: {}", dir.display());
        }
        Ok(())
    }
}
