//! Batch progress events
//!
//! Sent over an optional channel while a batch runs. Progress is purely
//! observational; dropping the receiver does not affect the run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Batch progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchEvent {
    /// Jobs built, output directory ready, engine about to load
    RunStarted {
        run_id: Uuid,
        total_jobs: usize,
        /// Unix timestamp (seconds since epoch)
        timestamp: i64,
    },

    /// Engine loaded
    EngineLoaded { elapsed_ms: u64 },

    /// Job handed to the engine (index is 0-based)
    JobStarted {
        index: usize,
        total: usize,
        source: PathBuf,
    },

    /// Job output written
    JobCompleted {
        index: usize,
        total: usize,
        output: PathBuf,
        elapsed_ms: u64,
    },

    /// Job failed; no output was left behind
    JobFailed {
        index: usize,
        total: usize,
        source: PathBuf,
        message: String,
    },

    /// Job not run because the batch aborted earlier
    JobSkipped { index: usize, source: PathBuf },

    /// All jobs accounted for
    RunCompleted {
        run_id: Uuid,
        succeeded: usize,
        failed: usize,
        skipped: usize,
        /// Unix timestamp (seconds since epoch)
        timestamp: i64,
    },
}
