//! Fixtures for unit tests: generated WAV files and a recording command runner.

use std::f32::consts::TAU;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;
use crate::tools::{CommandRunner, Invocation, ToolOutput};

/// Signal written into every channel of a fixture file.
#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Sine { frequency: f32, amplitude: f32 },
    Constant(f32),
    Silence,
}

impl Tone {
    pub fn sine(frequency: f32, amplitude: f32) -> Self {
        Self::Sine {
            frequency,
            amplitude,
        }
    }

    pub fn sample(&self, frame: usize, sample_rate: u32) -> f32 {
        match *self {
            Self::Sine {
                frequency,
                amplitude,
            } => amplitude * (TAU * frequency * frame as f32 / sample_rate as f32).sin(),
            Self::Constant(value) => value,
            Self::Silence => 0.0,
        }
    }
}

/// Write a 16-bit PCM file carrying `tone` in every channel.
pub fn write_pcm16(path: &Path, channels: u16, sample_rate: u32, tone: &Tone, frames: usize) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create fixture");
    for frame in 0..frames {
        let value = (tone.sample(frame, sample_rate) * 32_767.0).round() as i16;
        for _ in 0..channels {
            writer.write_sample(value).expect("write fixture sample");
        }
    }
    writer.finalize().expect("finalize fixture");
}

/// Write a 16-bit PCM file from explicit interleaved samples.
pub fn write_pcm16_samples(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create fixture");
    for &sample in samples {
        writer.write_sample(sample).expect("write fixture sample");
    }
    writer.finalize().expect("finalize fixture");
}

/// Read every sample of a WAV file as `f32`, regardless of its encoding.
pub fn read_wav_f32(path: &Path) -> (hound::WavSpec, Vec<f32>) {
    let mut reader = hound::WavReader::open(path).expect("open wav");
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.expect("sample"))
            .collect(),
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.expect("sample") as f32 / scale)
                .collect()
        }
    };
    (spec, samples)
}

type Responder = Box<dyn Fn(&Invocation) -> Result<ToolOutput> + Send + Sync>;

/// [`CommandRunner`] that records every invocation and answers with a closure.
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    respond: Responder,
}

impl RecordingRunner {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ToolOutput> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());
        (self.respond)(invocation)
    }
}
