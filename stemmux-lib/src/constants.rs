//! Shared constants for stem discovery, assembly and mixing.

/// Canonical stem names, in channel-assignment priority order.
pub const CANONICAL_STEM_ORDER: [&str; 6] = ["vocals", "drums", "bass", "guitar", "piano", "other"];

/// Extension (without the dot) of per-stem audio files.
pub const STEM_EXTENSION: &str = "wav";

/// Reserved file name of the assembled multichannel stream.
///
/// Never treated as a stem by discovery.
pub const MULTICHANNEL_FILENAME: &str = "multichannel_stems.wav";

/// File name of the persisted stem index sidecar.
pub const STEM_INDEX_FILENAME: &str = "stem_index.json";

/// Number of frames read per block when streaming stems.
pub const BLOCK_FRAMES: usize = 65_536;

/// Stems whose RMS falls below this level are treated as silent.
pub const RMS_SILENCE_THRESHOLD: f64 = 1e-6;

/// Bit depth of the assembled multichannel stream.
pub const MULTICHANNEL_BITS_PER_SAMPLE: u16 = 24;

/// Separation model used when the caller does not name one.
pub const DEFAULT_MODEL: &str = "htdemucs_6s";
