//! Error types for vcb-convert
//!
//! Setup errors (preset, discovery, output directory, engine load) end the run
//! before any job executes. `JobConversion` describes a single job failure and
//! is recorded in the batch report rather than propagated.

use crate::engine::EngineError;
use crate::job::EngineProfile;
use crate::scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

/// Batch conversion error type
#[derive(Debug, Error)]
pub enum BatchError {
    /// Speaker identifier has no catalog entry
    #[error("Unknown speaker '{speaker}' (known speakers: {known})")]
    UnknownSpeaker { speaker: String, known: String },

    /// Discovery found nothing to convert
    #[error("No input audio files found")]
    NoInputFiles,

    /// Input directory missing or unreadable
    #[error("Input directory error: {0}")]
    InputDir(#[from] ScanError),

    /// Output directory cannot be created or is not a directory
    #[error("Output directory {} unusable: {reason}", .path.display())]
    OutputDir { path: PathBuf, reason: String },

    /// Preset reference voice sample is missing at run time
    #[error("Reference audio not found: {}", .0.display())]
    ReferenceAudio(PathBuf),

    /// Tuning value out of range or missing required setting
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two sources would be written to the same output file
    #[error(
        "Output name collision: {} and {} both map to {name}",
        .first.display(),
        .second.display()
    )]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        name: String,
    },

    /// A job needs a different loaded engine than the batch engine
    #[error(
        "Job {index} requires engine profile {found:?}, batch engine uses {expected:?}"
    )]
    EngineMismatch {
        index: usize,
        expected: EngineProfile,
        found: EngineProfile,
    },

    /// Model/checkpoint load failure
    #[error("Engine load failed: {0}")]
    EngineLoad(#[source] EngineError),

    /// Per-job conversion failure
    #[error("Conversion of {} failed: {cause}", .path.display())]
    JobConversion { path: PathBuf, cause: String },
}

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;
