//! Gain-mix rendering: rebuild a stereo (or mono) mixdown from individual
//! stems with per-stem gains and remux it under the source video.

mod buffer;
mod gains;

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

pub use buffer::MixBuffer;
pub use gains::{GainMap, DEFAULT_GAIN};

use crate::assembly::{ensure_multichannel, StemIndex};
use crate::audio::{read_audio_info, write_float_wav, AudioInfo, BlockReader};
use crate::config::PipelineConfig;
use crate::constants::BLOCK_FRAMES;
use crate::error::{Result, StemError};
use crate::stems::{discover_stems, StemSet};
use crate::tools::{remux_mix, CommandRunner};

/// Everything needed to export one mix.
#[derive(Debug, Clone, PartialEq)]
pub struct MixRequest {
    pub stem_dir: PathBuf,
    pub video: PathBuf,
    pub gains: GainMap,
    /// Plain file name of the exported video inside the mixes directory.
    pub output_name: String,
}

/// Result of a rendered and exported mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixOutcome {
    pub output_path: PathBuf,
    pub mixed_stems: Vec<String>,
    pub muted_stems: Vec<String>,
    /// Absolute peak before normalization.
    pub peak: f32,
    pub normalized: bool,
}

struct MixSource {
    name: String,
    path: PathBuf,
    info: AudioInfo,
}

/// Render `request` and export it next to the other mixes.
pub fn render_mix(runner: &dyn CommandRunner, config: &PipelineConfig, request: &MixRequest) -> Result<MixOutcome> {
    check_output_name(&request.output_name)?;
    request.gains.validate()?;
    if !request.video.is_file() {
        return Err(StemError::NotFound(format!("{}", request.video.display())));
    }
    if !request.stem_dir.is_dir() {
        return Err(StemError::NotFound(format!("{}", request.stem_dir.display())));
    }

    ensure_multichannel(&request.stem_dir)?;
    let discovered = discover_stems(&request.stem_dir)?;
    let order = stem_order(&request.stem_dir, &discovered);
    for stem in request.gains.stems() {
        if !order.iter().any(|name| name == stem) {
            warn!("gain given for unknown stem {}; ignoring it", stem);
        }
    }

    let sources = inspect_sources(&discovered, &order)?;
    let first = sources
        .first()
        .map(|source| source.info)
        .ok_or_else(|| StemError::NotFound(format!("no stems in {}", request.stem_dir.display())))?;
    let longest = sources.iter().map(|source| source.info.frames).max().unwrap_or(0);
    let frames = usize::try_from(longest)
        .map_err(|_| StemError::InvalidInput(format!("{} frames do not fit in memory", longest)))?;

    let mut buffer = MixBuffer::new(frames, first.channels);
    let (mixed_stems, muted_stems) = mix_sources(&mut buffer, &sources, &request.gains, mix_source)?;

    let peak = buffer.peak();
    let normalized = buffer.normalize();
    if normalized {
        info!("mix peaked at {:.3}; normalized", peak);
    }

    std::fs::create_dir_all(&config.mixes_dir)?;
    let output_path = config.mixes_dir.join(&request.output_name);
    let mixdown = tempfile::Builder::new()
        .prefix("temp_mixed_audio_")
        .suffix(".wav")
        .tempfile_in(&config.mixes_dir)?;
    let channels = u16::try_from(buffer.channels())
        .map_err(|_| StemError::FormatMismatch(format!("{} channels", buffer.channels())))?;
    write_float_wav(mixdown.path(), channels, first.sample_rate, buffer.samples())?;

    let remuxed = remux_mix(
        runner,
        &config.ffmpeg,
        &request.video,
        mixdown.path(),
        &output_path,
    );
    if let Err(err) = mixdown.close() {
        warn!("could not remove temporary mix audio: {}", err);
    }
    remuxed?;

    Ok(MixOutcome {
        output_path,
        mixed_stems,
        muted_stems,
        peak,
        normalized,
    })
}

fn check_output_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StemError::InvalidInput(format!(
            "output name {:?} must be a plain file name",
            name
        ))),
    }
}

/// Stem order from the index, or from `discovered` when the index is unusable.
fn stem_order(dir: &Path, discovered: &StemSet) -> Vec<String> {
    match StemIndex::read(dir) {
        Some(index) => index.order,
        None => {
            warn!("no usable stem index in {}; using discovery order", dir.display());
            discovered.names()
        }
    }
}

/// Open every stem of `order` that discovery found and check they agree.
fn inspect_sources(discovered: &StemSet, order: &[String]) -> Result<Vec<MixSource>> {
    let paths: HashMap<&str, &Path> = discovered
        .stems()
        .iter()
        .map(|stem| (stem.name.as_str(), stem.path.as_path()))
        .collect();

    let mut sources: Vec<MixSource> = Vec::with_capacity(order.len());
    for name in order {
        let Some(path) = paths.get(name.as_str()).map(|path| path.to_path_buf()) else {
            warn!("stem {} is indexed but no longer on disk", name);
            continue;
        };
        let info = read_audio_info(&path)?;
        if let Some(first) = sources.first() {
            if info.sample_rate != first.info.sample_rate || info.channels != first.info.channels {
                return Err(StemError::FormatMismatch(format!(
                    "stem {} is {} Hz/{} ch but {} is {} Hz/{} ch",
                    name,
                    info.sample_rate,
                    info.channels,
                    first.name,
                    first.info.sample_rate,
                    first.info.channels
                )));
            }
        }
        sources.push(MixSource {
            name: name.clone(),
            path,
            info,
        });
    }
    Ok(sources)
}

/// Add every source with a non-zero gain through `mix`. Muted sources are
/// never handed to `mix`. Returns the mixed and the muted stem names.
fn mix_sources<F>(
    buffer: &mut MixBuffer,
    sources: &[MixSource],
    gains: &GainMap,
    mut mix: F,
) -> Result<(Vec<String>, Vec<String>)>
where
    F: FnMut(&mut MixBuffer, &MixSource, f32) -> Result<()>,
{
    let mut mixed = Vec::new();
    let mut muted = Vec::new();
    for source in sources {
        let gain = gains.gain_for(&source.name);
        if gain == 0.0 {
            debug!("stem {} muted", source.name);
            muted.push(source.name.clone());
            continue;
        }
        mix(buffer, source, gain)?;
        mixed.push(source.name.clone());
    }
    Ok((mixed, muted))
}

fn mix_source(buffer: &mut MixBuffer, source: &MixSource, gain: f32) -> Result<()> {
    let mut reader = BlockReader::open(&source.path)?;
    let mut offset = 0;
    while let Some(block) = reader.next_block(BLOCK_FRAMES)? {
        offset += buffer.add_scaled(offset, &block, gain);
    }
    debug!("mixed {} at gain {} ({} frames)", source.name, gain, offset);
    Ok(())
}
