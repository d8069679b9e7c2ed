//! Streaming, block-oriented audio reading on top of Symphonia.
//!
//! A [`BlockReader`] hands out fixed-size blocks of interleaved `f32` frames so
//! memory use depends on the block size rather than the length of the file.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::convert::append_interleaved;
use crate::error::{Result, StemError};

/// Stream parameters reported by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    /// Frame count from the container header, or from a full scan when the
    /// header does not carry one (see [`read_audio_info`]).
    pub frames: u64,
    /// Raw speaker mask of the stream, if the container declares one.
    pub channel_mask: Option<u32>,
}

/// Sequential block reader over the first decodable track of a file.
pub struct BlockReader {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    info: AudioInfo,
    frames_known: bool,
    pending: Vec<f32>,
    finished: bool,
}

impl BlockReader {
    /// Open `path` and prepare a decoder for its first audio track.
    pub fn open(path: &Path) -> Result<Self> {
        let format = open_format(path)?;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| StemError::decode(path, Error::Unsupported("no supported audio tracks")))?;
        let params = track.codec_params.clone();
        let track_id = track.id;

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| StemError::decode(path, Error::Unsupported("missing sample rate")))?;
        let channels = params
            .channels
            .ok_or_else(|| StemError::decode(path, Error::Unsupported("missing channel count")))?;

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|err| StemError::decode(path, err))?;

        Ok(Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            info: AudioInfo {
                sample_rate,
                channels: channels.count(),
                frames: params.n_frames.unwrap_or(0),
                channel_mask: Some(channels.bits()),
            },
            frames_known: params.n_frames.is_some(),
            pending: Vec::new(),
            finished: false,
        })
    }

    pub fn info(&self) -> AudioInfo {
        self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read up to `frames` frames of interleaved samples.
    ///
    /// Every block is exactly `frames` long except the last one. Returns
    /// `None` once the stream is exhausted.
    pub fn next_block(&mut self, frames: usize) -> Result<Option<Vec<f32>>> {
        let channels = self.info.channels.max(1);
        let wanted = frames.max(1) * channels;
        self.fill(wanted)?;

        if self.pending.is_empty() {
            return Ok(None);
        }

        let take = wanted.min(self.pending.len());
        // A truncated trailing frame is dropped rather than misaligning channels.
        let take = take - take % channels;
        if take == 0 {
            self.pending.clear();
            return Ok(None);
        }
        Ok(Some(self.pending.drain(..take).collect()))
    }

    fn fill(&mut self, wanted: usize) -> Result<()> {
        while self.pending.len() < wanted && !self.finished {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => {
                    self.finished = true;
                    break;
                }
                Err(err) => return Err(StemError::decode(&self.path, err)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    append_interleaved(decoded, &mut self.pending);
                }
                Err(Error::DecodeError(err)) => {
                    warn!("decode error in {}: {}", self.path.display(), err);
                }
                Err(err) => return Err(StemError::decode(&self.path, err)),
            }
        }
        Ok(())
    }
}

/// Read stream parameters for `path`.
///
/// Only the header is read when it carries a frame count; otherwise every
/// packet is scanned to count frames.
pub fn read_audio_info(path: &Path) -> Result<AudioInfo> {
    let mut reader = BlockReader::open(path)?;
    if reader.frames_known {
        return Ok(reader.info);
    }

    let mut frames = 0u64;
    let channels = reader.info.channels.max(1);
    while let Some(block) = reader.next_block(crate::constants::BLOCK_FRAMES)? {
        frames += (block.len() / channels) as u64;
    }
    Ok(AudioInfo {
        frames,
        ..reader.info
    })
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => StemError::NotFound(format!("{}", path.display())),
        _ => StemError::Io(err),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(&extension.to_lowercase());
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let found = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|err| StemError::decode(path, err))?;

    Ok(found.format)
}
