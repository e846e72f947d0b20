//! # VCB Common Library
//!
//! Shared code for the voice-conversion batch tools:
//! - Common error type
//! - Configuration file discovery and TOML loading
//! - Logging bootstrap

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
