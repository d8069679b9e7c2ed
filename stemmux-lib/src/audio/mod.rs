//! Audio decoding and encoding primitives used by every pipeline stage.

pub mod convert;
pub mod reader;
pub mod wav;

pub use reader::{read_audio_info, AudioInfo, BlockReader};
pub use wav::{stamp_channel_mask, write_float_wav, Pcm24Writer};
