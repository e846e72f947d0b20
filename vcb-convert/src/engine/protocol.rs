//! Worker wire protocol
//!
//! Newline-delimited JSON over the worker's stdin/stdout. Each request line
//! except `shutdown` gets exactly one response line.
//!
//! ```text
//! > {"op":"load","profile":{"f0_condition":true,"checkpoint":null,"model_config":null,"fp16":true}}
//! < {"status":"ok","message":"loaded 44k f0 model"}
//! > {"op":"convert","job":{...},"output":"out/.vc_a_sisi_1.0_100_0.7.wav.partial"}
//! < {"status":"error","message":"unsupported sample format"}
//! ```

use crate::job::{ConversionJob, EngineProfile};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Request sent to the worker
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkerRequest<'a> {
    /// Load model weights for this profile
    Load { profile: &'a EngineProfile },
    /// Convert one job, writing audio to `output`
    Convert {
        job: &'a ConversionJob,
        output: &'a Path,
    },
    /// Drop per-call scratch state
    Release,
    /// Exit cleanly
    Shutdown,
}

/// Worker reply
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerResponse {
    Ok {
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        message: String,
    },
}
