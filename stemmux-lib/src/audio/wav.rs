//! WAV encoding helpers built on `hound`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::constants::MULTICHANNEL_BITS_PER_SAMPLE;
use crate::error::{Result, StemError};

const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;
const PCM24_FULL_SCALE: f32 = 8_388_607.0;

/// Writer for interleaved 24-bit integer PCM.
pub struct Pcm24Writer {
    inner: WavWriter<BufWriter<File>>,
}

impl Pcm24Writer {
    pub fn create(path: &Path, channels: u16, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: MULTICHANNEL_BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };
        Ok(Self {
            inner: WavWriter::create(path, spec)?,
        })
    }

    /// Append interleaved samples, clamped to full scale.
    pub fn write(&mut self, samples: &[f32]) -> Result<()> {
        for &sample in samples {
            let scaled = (sample.clamp(-1.0, 1.0) * PCM24_FULL_SCALE).round() as i32;
            self.inner.write_sample(scaled)?;
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<()> {
        self.inner.finalize()?;
        Ok(())
    }
}

/// Write interleaved samples as a 32-bit float WAV file.
pub fn write_float_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Overwrite the speaker mask of a WAVE_FORMAT_EXTENSIBLE file in place.
///
/// `hound` always assigns the first N speaker positions; named layouts need
/// their own positions, so the mask is rewritten after the data is final.
pub fn stamp_channel_mask(path: &Path, mask: u32) -> Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;

    let mut riff = [0u8; 12];
    file.read_exact(&mut riff)?;
    if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(StemError::Layout(format!(
            "{} is not a RIFF/WAVE file",
            path.display()
        )));
    }

    loop {
        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let body_start = file.stream_position()?;

        if &header[0..4] != b"fmt " {
            file.seek(SeekFrom::Start(body_start + u64::from(size) + u64::from(size & 1)))?;
            continue;
        }

        if size < 40 {
            return Err(not_extensible(path));
        }
        let mut fmt = [0u8; 24];
        file.read_exact(&mut fmt)?;
        let format_tag = u16::from_le_bytes([fmt[0], fmt[1]]);
        let channels = u16::from_le_bytes([fmt[2], fmt[3]]);
        let extension_size = u16::from_le_bytes([fmt[16], fmt[17]]);
        if format_tag != WAVE_FORMAT_EXTENSIBLE || extension_size < 22 {
            return Err(not_extensible(path));
        }
        if mask.count_ones() != u32::from(channels) {
            return Err(StemError::Layout(format!(
                "speaker mask {:#x} does not describe {} channels",
                mask, channels
            )));
        }

        file.seek(SeekFrom::Start(body_start + 20))?;
        file.write_all(&mask.to_le_bytes())?;
        file.flush()?;
        return Ok(());
    }
}

fn not_extensible(path: &Path) -> StemError {
    StemError::Layout(format!(
        "{} has no WAVE_FORMAT_EXTENSIBLE header to carry a channel layout",
        path.display()
    ))
}
