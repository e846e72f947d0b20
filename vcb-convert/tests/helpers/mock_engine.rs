//! Recording engine double
//!
//! Every collaborator call lands in a shared call log so tests can assert on
//! ordering (one load before any conversion, scope exit after each job).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use vcb_convert::engine::{ConversionEngine, EngineError, EngineLoader};
use vcb_convert::job::ConversionJob;

/// One collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load,
    Enter,
    Convert {
        source: PathBuf,
        output: PathBuf,
        auto_f0_adjust: bool,
        semi_tone_shift: i32,
    },
    Exit,
}

#[derive(Default)]
struct Behavior {
    fail_load: bool,
    /// Source file names whose conversion fails (after a partial write)
    fail_sources: HashSet<String>,
    /// Report success without writing anything
    skip_write: bool,
}

/// Loader handing out engines that share one call log
#[derive(Clone, Default)]
pub struct MockLoader {
    calls: Arc<Mutex<Vec<Call>>>,
    behavior: Arc<Behavior>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_load() -> Self {
        Self::with_behavior(Behavior {
            fail_load: true,
            ..Default::default()
        })
    }

    /// Conversions of the named source files fail
    pub fn failing_on(names: &[&str]) -> Self {
        Self::with_behavior(Behavior {
            fail_sources: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        })
    }

    /// Engine claims success but never writes the output
    pub fn silent() -> Self {
        Self::with_behavior(Behavior {
            skip_write: true,
            ..Default::default()
        })
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            calls: Arc::default(),
            behavior: Arc::new(behavior),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn loads(&self) -> usize {
        self.count(|c| *c == Call::Load)
    }

    pub fn conversions(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Convert { .. }))
            .collect()
    }
}

impl EngineLoader for MockLoader {
    type Engine = MockEngine;

    fn load(&self, _job: &ConversionJob) -> Result<MockEngine, EngineError> {
        self.calls.lock().unwrap().push(Call::Load);
        if self.behavior.fail_load {
            return Err(EngineError::Remote("checkpoint missing".to_string()));
        }
        Ok(MockEngine {
            calls: Arc::clone(&self.calls),
            behavior: Arc::clone(&self.behavior),
        })
    }
}

pub struct MockEngine {
    calls: Arc<Mutex<Vec<Call>>>,
    behavior: Arc<Behavior>,
}

impl ConversionEngine for MockEngine {
    fn convert(&mut self, job: &ConversionJob, output: &Path) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(Call::Convert {
            source: job.source.clone(),
            output: output.to_path_buf(),
            auto_f0_adjust: job.auto_f0_adjust,
            semi_tone_shift: job.semi_tone_shift,
        });

        let name = job
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.behavior.fail_sources.contains(&name) {
            std::fs::write(output, b"RIFF partial")?;
            return Err(EngineError::Remote(format!("inference failed on {}", name)));
        }

        if !self.behavior.skip_write {
            std::fs::copy(&job.source, output)?;
        }
        Ok(())
    }

    fn enter_inference(&mut self) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(Call::Enter);
        Ok(())
    }

    fn exit_inference(&mut self) {
        self.calls.lock().unwrap().push(Call::Exit);
    }
}
