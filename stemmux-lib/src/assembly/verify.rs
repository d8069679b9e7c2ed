use std::path::Path;

use log::debug;

use crate::audio::read_audio_info;
use crate::error::{Result, StemError};
use crate::layout::layout_name_for_mask;

/// Check the assembled stream at `path` against the expected channel count
/// and layout name. Returns the layout name read back from the file.
pub fn verify_layout(path: &Path, expected_channels: usize, expected_layout: &str) -> Result<String> {
    let info = read_audio_info(path)?;

    let mask = info
        .channel_mask
        .filter(|mask| *mask != 0)
        .ok_or_else(|| {
            StemError::Layout(format!("{} carries no channel layout", path.display()))
        })?;
    let name = layout_name_for_mask(mask).ok_or_else(|| {
        StemError::Layout(format!(
            "{} has an unknown channel layout (mask {:#x})",
            path.display(),
            mask
        ))
    })?;

    if info.channels != expected_channels {
        return Err(StemError::Layout(format!(
            "{} has {} channels, expected {}",
            path.display(),
            info.channels,
            expected_channels
        )));
    }
    if name != expected_layout {
        return Err(StemError::Layout(format!(
            "{} has layout {}, expected {}",
            path.display(),
            name,
            expected_layout
        )));
    }

    debug!("verified {} as {} ({} ch)", path.display(), name, info.channels);
    Ok(name)
}
