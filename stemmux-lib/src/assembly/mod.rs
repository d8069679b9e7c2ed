//! Multichannel assembly: one channel per stem in a single 24-bit stream.
//!
//! Assembly runs discovery and validation, folds every stem to mono, joins
//! the mono streams block by block, stamps the layout's speaker mask, verifies
//! the result and finally writes the [`StemIndex`] sidecar.

mod index;
mod verify;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info};
use serde::Serialize;
use tempfile::NamedTempFile;

pub use index::StemIndex;
pub use verify::verify_layout;

use crate::audio::{stamp_channel_mask, BlockReader, Pcm24Writer};
use crate::constants::{BLOCK_FRAMES, MULTICHANNEL_FILENAME};
use crate::error::{Result, StemError};
use crate::layout::{resolve_layout, ChannelLayout};
use crate::stems::{discover_stems, validate_stems, Stem, StemSet};

/// Location and shape of an assembled multichannel stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultichannelAssembly {
    pub path: PathBuf,
    pub index_path: PathBuf,
    pub order: Vec<String>,
    pub layout: ChannelLayout,
}

/// Path of the assembled stream inside a stem directory.
pub fn multichannel_path(dir: &Path) -> PathBuf {
    dir.join(MULTICHANNEL_FILENAME)
}

/// Assemble every stem in `dir` into `multichannel_stems.wav`.
pub fn assemble_multichannel(dir: &Path) -> Result<MultichannelAssembly> {
    let set = discover_stems(dir)?;
    let stems = validate_stems(&set)?;
    let sample_rate = check_formats(&stems)?;

    let layout = resolve_layout(stems.len());
    let mask = layout.speaker_mask().ok_or_else(|| {
        StemError::Layout(format!(
            "{} stems exceed the addressable speaker positions",
            stems.len()
        ))
    })?;
    let channels = u16::try_from(stems.len())
        .map_err(|_| StemError::Layout(format!("too many stems: {}", stems.len())))?;

    info!(
        "assembling {} stem(s) in {} as {}",
        stems.len(),
        dir.display(),
        layout.name()
    );

    let output = multichannel_path(dir);
    let partial = tempfile::Builder::new()
        .prefix(".multichannel_stems")
        .suffix(".partial")
        .tempfile_in(dir)?;

    let frames = write_interleaved(&stems, partial.path(), channels, sample_rate)?;
    stamp_channel_mask(partial.path(), mask)?;
    publish(partial, &output, stems.len(), layout.name())?;
    debug!("wrote {} frames to {}", frames, output.display());

    let order = set.names();
    let index_path = StemIndex::new(order.clone(), &layout).write(dir)?;

    Ok(MultichannelAssembly {
        path: output,
        index_path,
        order,
        layout,
    })
}

/// Verify the finished temporary stream, then move it over `output`.
///
/// On a failed verification `partial` is dropped and `output` keeps its
/// previous contents.
fn publish(partial: NamedTempFile, output: &Path, channels: usize, layout_name: &str) -> Result<()> {
    verify_layout(partial.path(), channels, layout_name)?;
    partial.persist(output).map_err(|err| StemError::Io(err.error))?;
    Ok(())
}

/// Reuse the assembled stream in `dir` when it is current, else rebuild it.
///
/// The stream is current when it and a valid index exist, the index order
/// matches a fresh discovery and no stem file is newer than the stream.
pub fn ensure_multichannel(dir: &Path) -> Result<MultichannelAssembly> {
    let set = discover_stems(dir)?;
    let path = multichannel_path(dir);

    if let Some(index) = StemIndex::read(dir) {
        if path.is_file() && index.order == set.names() && !stems_newer_than(&set, &path)? {
            debug!("multichannel stream in {} is current", dir.display());
            return Ok(MultichannelAssembly {
                path,
                index_path: StemIndex::path_in(dir),
                layout: resolve_layout(index.channel_count),
                order: index.order,
            });
        }
    }

    assemble_multichannel(dir)
}

fn stems_newer_than(set: &StemSet, path: &Path) -> Result<bool> {
    let assembled = modified(path)?;
    for stem in set.stems() {
        if modified(&stem.path)? > assembled {
            return Ok(true);
        }
    }
    Ok(false)
}

fn modified(path: &Path) -> Result<SystemTime> {
    Ok(std::fs::metadata(path)?.modified()?)
}

/// All stems must be mono or stereo and share one sample rate.
fn check_formats(stems: &[Stem]) -> Result<u32> {
    let first = stems
        .first()
        .ok_or_else(|| StemError::NotFound("no stems to assemble".to_string()))?;

    for stem in stems {
        if stem.channels == 0 || stem.channels > 2 {
            return Err(StemError::FormatMismatch(format!(
                "stem {} has {} channels; only mono and stereo stems can be folded",
                stem.name, stem.channels
            )));
        }
        if stem.sample_rate != first.sample_rate {
            return Err(StemError::FormatMismatch(format!(
                "stem {} is {} Hz but {} is {} Hz",
                stem.name, stem.sample_rate, first.name, first.sample_rate
            )));
        }
    }
    Ok(first.sample_rate)
}

/// Stream every stem into `path`, one channel each. Returns the frame count.
fn write_interleaved(stems: &[Stem], path: &Path, channels: u16, sample_rate: u32) -> Result<u64> {
    let mut readers = stems
        .iter()
        .map(|stem| BlockReader::open(&stem.path))
        .collect::<Result<Vec<_>>>()?;
    let mut writer = Pcm24Writer::create(path, channels, sample_rate)?;

    let mut total = 0u64;
    let mut interleaved = Vec::with_capacity(BLOCK_FRAMES * stems.len());
    loop {
        let mut columns = Vec::with_capacity(readers.len());
        for reader in readers.iter_mut() {
            let source_channels = reader.info().channels;
            let column = match reader.next_block(BLOCK_FRAMES)? {
                Some(block) => fold_to_mono(&block, source_channels),
                None => Vec::new(),
            };
            columns.push(column);
        }

        let frames = columns.iter().map(Vec::len).max().unwrap_or(0);
        if frames == 0 {
            break;
        }

        interleaved.clear();
        for frame in 0..frames {
            for column in &columns {
                interleaved.push(column.get(frame).copied().unwrap_or(0.0));
            }
        }
        writer.write(&interleaved)?;
        total += frames as u64;
    }

    writer.finalize()?;
    Ok(total)
}

fn fold_to_mono(block: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        2 => block
            .chunks_exact(2)
            .map(|frame| 0.5 * frame[0] + 0.5 * frame[1])
            .collect(),
        _ => block.to_vec(),
    }
}
