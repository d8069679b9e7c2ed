//! # Stemmux Library
//!
//! This library turns separated audio stems into a single addressable
//! multichannel stream and renders per-stem gain mixes back onto video.
//! It includes modules for stem discovery and validation, multichannel
//! assembly, mix rendering, external tool orchestration and background jobs.

pub mod assembly;
pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod jobs;
pub mod layout;
pub mod mix;
pub mod pipeline;
pub mod stems;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use config::PipelineConfig;
pub use error::{Result, StemError};
