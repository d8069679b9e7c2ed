use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use super::{CommandRunner, Invocation};
use crate::config::PipelineConfig;
use crate::constants::{MULTICHANNEL_FILENAME, STEM_EXTENSION};
use crate::error::{Result, StemError};

const CUDA_CHECK: &str = "import torch; print('cuda' if torch.cuda.is_available() else 'cpu')";
const CPU: &str = "cpu";

/// Where a separation run left its stems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Separation {
    /// Unique directory handed to the model as its output root.
    pub output_dir: PathBuf,
    /// Directory holding the stem files themselves.
    pub stem_dir: PathBuf,
    pub model: String,
    pub device: String,
}

/// Compute device for the separation model.
///
/// A configured device wins; otherwise the Python environment is asked whether
/// CUDA is available, falling back to the CPU when it cannot answer.
pub fn resolve_device(runner: &dyn CommandRunner, config: &PipelineConfig) -> String {
    if let Some(device) = &config.demucs_device {
        return device.clone();
    }

    let check = Invocation::new("python", &config.python).args(["-c", CUDA_CHECK]);
    match runner.run(&check) {
        Ok(output) => match output.stdout.trim() {
            device @ ("cuda" | "cpu") => device.to_string(),
            other => {
                warn!("unexpected device check output {:?}; using cpu", other);
                CPU.to_string()
            }
        },
        Err(err) => {
            debug!("device check failed ({}); using cpu", err);
            CPU.to_string()
        }
    }
}

/// Run the separation model over `input` and locate the stems it wrote.
pub fn separate_stems(
    runner: &dyn CommandRunner,
    config: &PipelineConfig,
    input: &Path,
    model: &str,
) -> Result<Separation> {
    if !input.is_file() {
        return Err(StemError::NotFound(format!("{}", input.display())));
    }
    let base = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| StemError::InvalidInput(format!("{} has no file name", input.display())))?;

    let output_dir = config
        .separated_dir
        .join(format!("{}_{}", base, uuid::Uuid::new_v4().simple()));
    std::fs::create_dir_all(&output_dir)?;

    let device = resolve_device(runner, config);
    info!("separating {} with {} on {}", input.display(), model, device);

    let invocation = Invocation::new("demucs", &config.python)
        .args(["-m", "demucs.separate", "-n", model, "-d", device.as_str(), "-o"])
        .arg(&output_dir)
        .args(["--filename", "{stem}.{ext}"])
        .arg(input);
    runner.run(&invocation)?;

    let stem_dir = find_stem_dir(&output_dir)?.ok_or_else(|| {
        StemError::NotFound(format!(
            "separation produced no stem directory under {}",
            output_dir.display()
        ))
    })?;

    Ok(Separation {
        output_dir,
        stem_dir,
        model: model.to_string(),
        device,
    })
}

/// Shallowest directory under `root` (including `root`) holding stem files.
///
/// Siblings are visited in name order, so the result is deterministic.
pub fn find_stem_dir(root: &Path) -> Result<Option<PathBuf>> {
    let mut level = vec![root.to_path_buf()];
    while !level.is_empty() {
        let mut next = Vec::new();
        for dir in level {
            let mut has_stems = false;
            let mut children = Vec::new();
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    children.push(entry.path());
                } else if file_type.is_file() && is_stem_file(&entry.path()) {
                    has_stems = true;
                }
            }
            if has_stems {
                return Ok(Some(dir));
            }
            children.sort();
            next.extend(children);
        }
        level = next;
    }
    Ok(None)
}

fn is_stem_file(path: &Path) -> bool {
    let reserved = path.file_name().and_then(|name| name.to_str()) == Some(MULTICHANNEL_FILENAME);
    let audio = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(STEM_EXTENSION))
        .unwrap_or(false);
    audio && !reserved
}
