//! vcb-convert library interface
//!
//! Batch voice conversion: every audio file in an input directory is
//! converted to one preset speaker's voice with a single loaded engine.
//!
//! Exposes public APIs for the command-line tool and integration testing.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod job;
pub mod presets;
pub mod probe;
pub mod report;
pub mod runner;
pub mod scanner;

pub use crate::config::{BatchConfig, FailurePolicy};
pub use crate::error::{BatchError, BatchResult};
pub use crate::report::BatchReport;
pub use crate::runner::{plan_jobs, BatchRunner};
