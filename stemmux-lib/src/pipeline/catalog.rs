use std::path::{Path, PathBuf};

use serde::Serialize;

use super::REMUXED_SUFFIX;
use crate::assembly::StemIndex;
use crate::config::PipelineConfig;
use crate::error::Result;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A remuxed video and, when it can be traced, the stems it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemuxedEntry {
    pub filename: String,
    pub path: PathBuf,
    pub size_mb: f64,
    pub separated_dir: Option<PathBuf>,
    pub stem_order: Option<Vec<String>>,
    pub channel_layout: Option<String>,
}

/// List every `.mp4` in the remuxed directory, sorted by file name.
pub fn list_remuxed(config: &PipelineConfig) -> Result<Vec<RemuxedEntry>> {
    if !config.remuxed_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in sorted_entries(&config.remuxed_dir)? {
        let Some(filename) = entry.file_name().and_then(|name| name.to_str()).map(str::to_string) else {
            continue;
        };
        if !filename.ends_with(".mp4") || !entry.is_file() {
            continue;
        }

        let size = std::fs::metadata(&entry)?.len();
        let base = filename
            .strip_suffix(REMUXED_SUFFIX)
            .or_else(|| filename.strip_suffix(".mp4"))
            .unwrap_or(&filename);
        let separated_dir = find_separated_dir(config, base)?;
        let index = separated_dir.as_deref().and_then(StemIndex::read);

        entries.push(RemuxedEntry {
            size_mb: (size as f64 / BYTES_PER_MB * 100.0).round() / 100.0,
            path: entry,
            stem_order: index.as_ref().map(|index| index.order.clone()),
            channel_layout: index.map(|index| index.channel_layout),
            separated_dir,
            filename,
        });
    }
    Ok(entries)
}

/// First `<separated>/<base>_*/<model>` directory, in name order.
fn find_separated_dir(config: &PipelineConfig, base: &str) -> Result<Option<PathBuf>> {
    if !config.separated_dir.is_dir() {
        return Ok(None);
    }
    let prefix = format!("{}_", base);
    for candidate in sorted_entries(&config.separated_dir)? {
        let matches = candidate
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(&prefix))
            .unwrap_or(false);
        let stems = candidate.join(&config.default_model);
        if matches && stems.is_dir() {
            return Ok(Some(stems));
        }
    }
    Ok(None)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}
