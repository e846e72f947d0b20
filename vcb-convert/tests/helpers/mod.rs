//! Test Helper Utilities
//!
//! Shared utilities for testing vcb-convert

#![allow(dead_code, unused_imports)]

pub mod audio_generator;
pub mod log_capture;
pub mod mock_engine;

// Re-export commonly used items
pub use audio_generator::{generate_test_wav, write_corrupt_file, AudioConfig, Fixture};
pub use log_capture::{capture_logs, LogCapture};
pub use mock_engine::{Call, MockLoader};
