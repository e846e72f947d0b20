//! Batch runner
//!
//! Drives one batch from discovery to report:
//!
//! 1. Discover source files (earlier conversion results excluded)
//! 2. Build one job per source; check names and engine profile
//! 3. Verify the reference voice sample and prepare the output directory
//! 4. Load the engine once
//! 5. Convert each job inside an inference scope, staging output until the
//!    engine returns successfully
//!
//! Setup failures (1-4) end the run with an error. Failures in step 5 are
//! isolated per job and recorded in the [`BatchReport`].

use crate::config::{BatchConfig, FailurePolicy};
use crate::engine::{ConversionEngine, EngineLoader, InferenceScope};
use crate::error::{BatchError, BatchResult};
use crate::events::BatchEvent;
use crate::job::{build_jobs, ensure_shared_profile, is_output_name, ConversionJob};
use crate::probe::probe_source;
use crate::report::{BatchReport, JobOutcome, JobStatus};
use crate::scanner::{AudioDiscovery, FileScanner};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Discover sources and build the job list without touching the engine
pub fn plan_jobs<D: AudioDiscovery + ?Sized>(
    config: &BatchConfig,
    discovery: &D,
    input_dir: &Path,
    output_dir: &Path,
) -> BatchResult<Vec<ConversionJob>> {
    let discovered = discovery.list_audio_files(input_dir)?;
    let sources = exclude_outputs(discovered, input_dir, output_dir, &config.reference_audio);

    if sources.is_empty() {
        warn!("No audio files found in {}", input_dir.display());
        return Err(BatchError::NoInputFiles);
    }
    debug!("Discovered {} source files", sources.len());

    let jobs = build_jobs(config, &sources, output_dir)?;
    ensure_shared_profile(&jobs)?;
    Ok(jobs)
}

/// Drop discovered files that are conversion results rather than sources
///
/// An output directory nested inside the input directory is skipped
/// entirely. When the two are the same directory (or the output directory
/// contains the input), only files named like results for `reference` are
/// dropped.
fn exclude_outputs(
    files: Vec<PathBuf>,
    input_dir: &Path,
    output_dir: &Path,
    reference: &Path,
) -> Vec<PathBuf> {
    // Nothing discovered can live in an output directory that does not exist
    let Ok(output) = output_dir.canonicalize() else {
        return files;
    };
    let input = input_dir
        .canonicalize()
        .unwrap_or_else(|_| input_dir.to_path_buf());
    let nested = output != input && output.starts_with(&input);

    files
        .into_iter()
        .filter(|file| {
            let resolved = file.canonicalize().unwrap_or_else(|_| file.clone());
            if !resolved.starts_with(&output) {
                return true;
            }
            if nested {
                return false;
            }
            !file
                .file_name()
                .map(|name| is_output_name(&name.to_string_lossy(), reference))
                .unwrap_or(false)
        })
        .collect()
}

/// Create the output directory if needed and confirm it accepts files
fn prepare_output_dir(path: &Path) -> BatchResult<()> {
    let unusable = |reason: String| BatchError::OutputDir {
        path: path.to_path_buf(),
        reason,
    };

    if path.exists() && !path.is_dir() {
        return Err(unusable("exists and is not a directory".to_string()));
    }
    fs::create_dir_all(path).map_err(|e| unusable(e.to_string()))?;

    let probe = path.join(".vcb-write-check");
    fs::write(&probe, b"").map_err(|e| unusable(format!("not writable: {}", e)))?;
    if let Err(e) = fs::remove_file(&probe) {
        warn!("Failed to remove {}: {}", probe.display(), e);
    }
    Ok(())
}

fn discard_staging(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed staging file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove staging file {}: {}", path.display(), e),
    }
}

/// Convert into the staging path, then move the result into place
///
/// The final output path only ever holds a complete file.
fn convert_staged<E: ConversionEngine + ?Sized>(
    engine: &mut E,
    job: &ConversionJob,
) -> Result<PathBuf, String> {
    let staging = job.staging_path();
    let output = job.output_path();

    // Leftover from an interrupted run
    discard_staging(&staging);

    let converted = InferenceScope::enter(engine).and_then(|mut scope| scope.convert(job, &staging));
    if let Err(e) = converted {
        discard_staging(&staging);
        return Err(e.to_string());
    }

    if !staging.is_file() {
        return Err("engine reported success but wrote no output".to_string());
    }

    if let Err(e) = fs::rename(&staging, &output) {
        discard_staging(&staging);
        return Err(format!("moving output into place failed: {}", e));
    }

    Ok(output)
}

/// Runs one batch of conversions against a single loaded engine
pub struct BatchRunner<L: EngineLoader, D: AudioDiscovery = FileScanner> {
    config: BatchConfig,
    loader: L,
    discovery: D,
    event_tx: Option<Sender<BatchEvent>>,
}

impl<L: EngineLoader> BatchRunner<L> {
    pub fn new(config: BatchConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            discovery: FileScanner::new(),
            event_tx: None,
        }
    }
}

impl<L: EngineLoader, D: AudioDiscovery> BatchRunner<L, D> {
    /// Replace the discovery collaborator
    pub fn with_discovery<D2: AudioDiscovery>(self, discovery: D2) -> BatchRunner<L, D2> {
        BatchRunner {
            config: self.config,
            loader: self.loader,
            discovery,
            event_tx: self.event_tx,
        }
    }

    /// Send progress events to `tx`
    pub fn with_events(mut self, tx: Sender<BatchEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.event_tx {
            if tx.send(event).is_err() {
                debug!("Event receiver dropped");
            }
        }
    }

    /// Convert every audio file under `input_dir` into `output_dir`
    ///
    /// Returns `Err` only for setup failures; per-job failures are in the
    /// report.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> BatchResult<BatchReport> {
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            speaker = self.config.preset.id,
            input = %input_dir.display(),
            output = %output_dir.display(),
            "Starting batch conversion"
        );

        let jobs = plan_jobs(&self.config, &self.discovery, input_dir, output_dir)?;

        if !self.config.reference_audio.is_file() {
            return Err(BatchError::ReferenceAudio(self.config.reference_audio.clone()));
        }
        prepare_output_dir(output_dir)?;

        let total = jobs.len();
        self.emit(BatchEvent::RunStarted {
            run_id,
            total_jobs: total,
            timestamp: chrono::Utc::now().timestamp(),
        });

        let load_start = Instant::now();
        let mut engine = self.loader.load(&jobs[0]).map_err(BatchError::EngineLoad)?;
        let load_ms = load_start.elapsed().as_millis() as u64;
        info!("Engine loaded in {} ms", load_ms);
        self.emit(BatchEvent::EngineLoaded { elapsed_ms: load_ms });

        let mut report = BatchReport::new(
            run_id,
            self.config.preset.id,
            input_dir,
            output_dir,
            self.config.failure_policy,
        );

        let mut pending = jobs.iter().enumerate();
        for (index, job) in pending.by_ref() {
            let outcome = self.execute_job(&mut engine, index, total, job);
            let failed = outcome.is_failure();
            report.outcomes.push(outcome);

            if failed && self.config.failure_policy == FailurePolicy::Abort {
                warn!("Aborting batch after failure of job {}/{}", index + 1, total);
                report.aborted = true;
                break;
            }
        }

        for (index, job) in pending {
            self.emit(BatchEvent::JobSkipped {
                index,
                source: job.source.clone(),
            });
            report.outcomes.push(JobOutcome {
                index,
                source: job.source.clone(),
                probe: None,
                status: JobStatus::Skipped,
            });
        }

        drop(engine);
        report.finish();

        info!("Batch {} complete: {}", run_id, report.summary());
        self.emit(BatchEvent::RunCompleted {
            run_id,
            succeeded: report.succeeded(),
            failed: report.failed(),
            skipped: report.skipped(),
            timestamp: chrono::Utc::now().timestamp(),
        });

        Ok(report)
    }

    fn execute_job(
        &self,
        engine: &mut L::Engine,
        index: usize,
        total: usize,
        job: &ConversionJob,
    ) -> JobOutcome {
        let started = Instant::now();
        info!("[{}/{}] Converting {}", index + 1, total, job.source.display());
        self.emit(BatchEvent::JobStarted {
            index,
            total,
            source: job.source.clone(),
        });

        let probe = match probe_source(&job.source) {
            Ok(probe) => probe,
            Err(e) => return self.job_failed(index, total, job, None, format!("{:#}", e)),
        };
        debug!(
            "Source {}: {} Hz, {:?} channels, {:?} s",
            job.source.display(),
            probe.sample_rate,
            probe.channels,
            probe.duration_seconds
        );

        match convert_staged(engine, job) {
            Ok(output) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                info!(
                    "[{}/{}] Wrote {} ({} ms)",
                    index + 1,
                    total,
                    output.display(),
                    elapsed_ms
                );
                self.emit(BatchEvent::JobCompleted {
                    index,
                    total,
                    output: output.clone(),
                    elapsed_ms,
                });
                JobOutcome {
                    index,
                    source: job.source.clone(),
                    probe: Some(probe),
                    status: JobStatus::Succeeded { output, elapsed_ms },
                }
            }
            Err(cause) => self.job_failed(index, total, job, Some(probe), cause),
        }
    }

    fn job_failed(
        &self,
        index: usize,
        total: usize,
        job: &ConversionJob,
        probe: Option<crate::probe::AudioProbe>,
        cause: String,
    ) -> JobOutcome {
        let err = BatchError::JobConversion {
            path: job.source.clone(),
            cause: cause.clone(),
        };
        error!("[{}/{}] {}", index + 1, total, err);
        self.emit(BatchEvent::JobFailed {
            index,
            total,
            source: job.source.clone(),
            message: cause.clone(),
        });

        JobOutcome {
            index,
            source: job.source.clone(),
            probe,
            status: JobStatus::Failed { reason: cause },
        }
    }
}
