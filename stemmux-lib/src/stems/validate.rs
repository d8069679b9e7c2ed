use std::path::Path;

use log::{debug, warn};

use super::{Stem, StemSet};
use crate::audio::BlockReader;
use crate::constants::{BLOCK_FRAMES, RMS_SILENCE_THRESHOLD};
use crate::error::{Result, StemError};

/// Measurements taken while streaming one stem.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StemMeasure {
    sample_rate: u32,
    channels: usize,
    frames: u64,
    rms: f64,
}

/// RMS level of every sample in `path`, streamed block by block.
pub fn compute_rms(path: &Path) -> Result<f64> {
    Ok(measure(path)?.rms)
}

fn measure(path: &Path) -> Result<StemMeasure> {
    let mut reader = BlockReader::open(path)?;
    let info = reader.info();
    let channels = info.channels.max(1);

    let mut sum_of_squares = 0.0f64;
    let mut samples = 0u64;
    while let Some(block) = reader.next_block(BLOCK_FRAMES)? {
        sum_of_squares += block.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>();
        samples += block.len() as u64;
    }

    let rms = if samples == 0 {
        0.0
    } else {
        (sum_of_squares / samples as f64).sqrt()
    };

    Ok(StemMeasure {
        sample_rate: info.sample_rate,
        channels: info.channels,
        frames: samples / channels as u64,
        rms,
    })
}

/// Measure every stem of `set` and reject the set if any stem is silent.
///
/// All silent stems are reported together, in set order.
pub fn validate_stems(set: &StemSet) -> Result<Vec<Stem>> {
    let mut stems = Vec::with_capacity(set.len());
    let mut silent = Vec::new();

    for file in set.stems() {
        let measured = measure(&file.path)?;
        debug!(
            "stem {}: {} Hz, {} ch, {} frames, rms {:.3e}",
            file.name, measured.sample_rate, measured.channels, measured.frames, measured.rms
        );
        if measured.rms < RMS_SILENCE_THRESHOLD {
            warn!("stem {} appears silent", file.name);
            silent.push(file.name.clone());
        }
        stems.push(Stem {
            name: file.name.clone(),
            path: file.path.clone(),
            sample_rate: measured.sample_rate,
            channels: measured.channels,
            frames: measured.frames,
            rms: measured.rms,
        });
    }

    if !silent.is_empty() {
        return Err(StemError::SilentStem {
            stems: silent,
            threshold: RMS_SILENCE_THRESHOLD,
        });
    }
    Ok(stems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stems::discover_stems;
    use crate::test_support::{read_wav_f32, write_pcm16, Tone};

    #[test]
    fn streamed_rms_matches_whole_file_rms() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vocals.wav");
        // Longer than two blocks so the accumulation crosses block boundaries.
        write_pcm16(&path, 2, 44_100, &Tone::sine(330.0, 0.6), 150_000);

        let (_, samples) = read_wav_f32(&path);
        let whole = (samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>()
            / samples.len() as f64)
            .sqrt();

        let streamed = compute_rms(&path).expect("rms");
        assert!((streamed - whole).abs() < 1e-9, "{} vs {}", streamed, whole);
    }

    #[test]
    fn validation_records_stream_properties() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_pcm16(&dir.path().join("bass.wav"), 1, 22_050, &Tone::sine(55.0, 0.4), 2_205);
        write_pcm16(&dir.path().join("vocals.wav"), 2, 22_050, &Tone::Constant(0.25), 1_000);

        let set = discover_stems(dir.path()).expect("discover");
        let stems = validate_stems(&set).expect("validate");
        assert_eq!(stems.len(), 2);
        assert_eq!(stems[0].name, "vocals");
        assert_eq!(stems[0].channels, 2);
        assert_eq!(stems[0].frames, 1_000);
        assert!((stems[0].rms - 0.25).abs() < 1e-3);
        assert_eq!(stems[1].sample_rate, 22_050);
        assert_eq!(stems[1].frames, 2_205);
    }

    #[test]
    fn every_silent_stem_is_named() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_pcm16(&dir.path().join("vocals.wav"), 2, 44_100, &Tone::sine(440.0, 0.5), 4_410);
        write_pcm16(&dir.path().join("drums.wav"), 2, 44_100, &Tone::Silence, 4_410);
        write_pcm16(&dir.path().join("piano.wav"), 1, 44_100, &Tone::Silence, 4_410);

        let set = discover_stems(dir.path()).expect("discover");
        match validate_stems(&set) {
            Err(StemError::SilentStem { stems, .. }) => {
                assert_eq!(stems, vec!["drums", "piano"]);
            }
            other => panic!("expected SilentStem, got {:?}", other),
        }
    }
}
