//! Conversion engine collaborator
//!
//! The model itself lives outside this crate. [`EngineLoader`] produces a
//! loaded engine once per batch; [`ConversionEngine`] converts one job at a
//! time. Every conversion runs inside an [`InferenceScope`], which releases
//! the engine's per-job scratch state when it is dropped, whether the job
//! succeeded, failed, or panicked.

pub mod protocol;
pub mod worker;

pub use worker::{WorkerEngine, WorkerLoader};

use crate::job::ConversionJob;
use std::path::Path;
use thiserror::Error;

/// Engine collaborator errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine process could not be started
    #[error("Failed to start engine: {0}")]
    Spawn(String),

    /// Engine sent something unexpected, or went away
    #[error("Engine protocol error: {0}")]
    Protocol(String),

    /// Engine reported a failure
    #[error("Engine error: {0}")]
    Remote(String),

    /// I/O error talking to the engine
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loaded engine state, reused across every job in a batch
pub trait ConversionEngine {
    /// Convert `job.source` and write the result to `output`
    fn convert(&mut self, job: &ConversionJob, output: &Path) -> Result<(), EngineError>;

    /// Prepare for one inference call (no training-state mutation past this point)
    fn enter_inference(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Release per-call scratch state
    fn exit_inference(&mut self) {}
}

/// Loads the engine for a batch
pub trait EngineLoader {
    type Engine: ConversionEngine;

    /// Load model state using one representative job's engine profile
    fn load(&self, job: &ConversionJob) -> Result<Self::Engine, EngineError>;
}

/// Scoped inference context for one job
pub struct InferenceScope<'a, E: ConversionEngine + ?Sized> {
    engine: &'a mut E,
}

impl<'a, E: ConversionEngine + ?Sized> InferenceScope<'a, E> {
    /// Enter the scope; on error the engine is left untouched
    pub fn enter(engine: &'a mut E) -> Result<Self, EngineError> {
        engine.enter_inference()?;
        Ok(Self { engine })
    }

    pub fn convert(&mut self, job: &ConversionJob, output: &Path) -> Result<(), EngineError> {
        self.engine.convert(job, output)
    }
}

impl<E: ConversionEngine + ?Sized> Drop for InferenceScope<'_, E> {
    fn drop(&mut self) {
        self.engine.exit_inference();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BatchConfig;
    use crate::job::build_jobs;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        fail_convert: bool,
        panic_convert: bool,
    }

    impl ConversionEngine for Recorder {
        fn convert(&mut self, _job: &ConversionJob, _output: &Path) -> Result<(), EngineError> {
            self.calls.push("convert");
            if self.panic_convert {
                panic!("engine blew up");
            }
            if self.fail_convert {
                return Err(EngineError::Remote("bad audio".to_string()));
            }
            Ok(())
        }

        fn enter_inference(&mut self) -> Result<(), EngineError> {
            self.calls.push("enter");
            Ok(())
        }

        fn exit_inference(&mut self) {
            self.calls.push("exit");
        }
    }

    fn job() -> ConversionJob {
        let config = BatchConfig::for_speaker("sisi").unwrap();
        build_jobs(&config, &[PathBuf::from("a.wav")], Path::new("out"))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_scope_exits_after_success() {
        let mut engine = Recorder::default();
        {
            let mut scope = InferenceScope::enter(&mut engine).unwrap();
            scope.convert(&job(), Path::new("out/x.wav")).unwrap();
        }
        assert_eq!(engine.calls, vec!["enter", "convert", "exit"]);
    }

    #[test]
    fn test_scope_exits_after_error() {
        let mut engine = Recorder {
            fail_convert: true,
            ..Default::default()
        };
        {
            let mut scope = InferenceScope::enter(&mut engine).unwrap();
            assert!(scope.convert(&job(), Path::new("out/x.wav")).is_err());
        }
        assert_eq!(engine.calls, vec!["enter", "convert", "exit"]);
    }

    #[test]
    fn test_scope_exits_during_unwind() {
        let mut engine = Recorder {
            panic_convert: true,
            ..Default::default()
        };
        let job = job();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut scope = InferenceScope::enter(&mut engine).unwrap();
            let _ = scope.convert(&job, Path::new("out/x.wav"));
        }));
        assert!(result.is_err());
        assert_eq!(engine.calls, vec!["enter", "convert", "exit"]);
    }
}
