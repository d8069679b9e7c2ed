//! Stem sets: discovery of per-stem files and their validation.

mod discovery;
mod validate;

use std::path::PathBuf;

use serde::Serialize;

pub use discovery::{discover_stems, order_stem_names};
pub use validate::{compute_rms, validate_stems};

/// A stem file found on disk, not yet inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemFile {
    pub name: String,
    pub path: PathBuf,
}

/// Ordered stems for one separation job.
///
/// Position in the set is the channel index in the assembled stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemSet {
    stems: Vec<StemFile>,
}

impl StemSet {
    pub fn stems(&self) -> &[StemFile] {
        &self.stems
    }

    pub fn names(&self) -> Vec<String> {
        self.stems.iter().map(|stem| stem.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

/// A stem that passed validation, with its measured properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stem {
    pub name: String,
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: u64,
    pub rms: f64,
}
