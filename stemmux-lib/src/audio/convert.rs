//! Sample format conversion from decoded Symphonia buffers to interleaved `f32`.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::sample::Sample;

fn convert_unsigned_8bit_to_f32(sample: u8) -> f32 {
    (i16::from(sample) - 128) as f32 / 128.0
}

fn convert_signed_8bit_to_f32(sample: i8) -> f32 {
    f32::from(sample) / 128.0
}

fn convert_unsigned_16bit_to_f32(sample: u16) -> f32 {
    (i32::from(sample) - 32_768) as f32 / 32_768.0
}

fn convert_signed_16bit_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32_768.0
}

/// Convert a signed 24-bit sample stored in the low bits of an `i32`.
pub fn convert_signed_24bit_to_f32(sample: i32) -> f32 {
    let shifted_sample = sample << 8 >> 8;
    shifted_sample as f32 / 8_388_608.0
}

fn convert_unsigned_24bit_to_f32(sample: u32) -> f32 {
    (i64::from(sample & 0x00FF_FFFF) - 8_388_608) as f32 / 8_388_608.0
}

fn convert_signed_32bit_to_f32(sample: i32) -> f32 {
    (f64::from(sample) / 2_147_483_648.0) as f32
}

fn convert_unsigned_32bit_to_f32(sample: u32) -> f32 {
    ((i64::from(sample) - 2_147_483_648) as f64 / 2_147_483_648.0) as f32
}

/// Append every frame of `decoded` to `out` as interleaved `f32` samples.
///
/// Returns the number of frames appended.
pub fn append_interleaved(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) -> usize {
    match decoded {
        AudioBufferRef::U8(buf) => interleave(&buf, convert_unsigned_8bit_to_f32, out),
        AudioBufferRef::S8(buf) => interleave(&buf, convert_signed_8bit_to_f32, out),
        AudioBufferRef::U16(buf) => interleave(&buf, convert_unsigned_16bit_to_f32, out),
        AudioBufferRef::S16(buf) => interleave(&buf, convert_signed_16bit_to_f32, out),
        AudioBufferRef::U24(buf) => interleave(&buf, |s| convert_unsigned_24bit_to_f32(s.0), out),
        AudioBufferRef::S24(buf) => interleave(&buf, |s| convert_signed_24bit_to_f32(s.0), out),
        AudioBufferRef::U32(buf) => interleave(&buf, convert_unsigned_32bit_to_f32, out),
        AudioBufferRef::S32(buf) => interleave(&buf, convert_signed_32bit_to_f32, out),
        AudioBufferRef::F32(buf) => interleave(&buf, |s| s, out),
        AudioBufferRef::F64(buf) => interleave(&buf, |s| s as f32, out),
    }
}

fn interleave<S, F>(buf: &AudioBuffer<S>, convert: F, out: &mut Vec<f32>) -> usize
where
    S: Sample,
    F: Fn(S) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames * channels);
    for frame in 0..frames {
        for channel in 0..channels {
            out.push(convert(buf.chan(channel)[frame]));
        }
    }
    frames
}
