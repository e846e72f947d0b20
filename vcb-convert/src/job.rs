//! Conversion job descriptors
//!
//! One immutable [`ConversionJob`] per discovered source file. Building jobs is
//! pure: no file I/O, and the job order follows the source order exactly.

use crate::config::BatchConfig;
use crate::error::{BatchError, BatchResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Engine-relevant parameters (which weights get loaded)
///
/// Every job in a batch must carry the same profile; only the per-call
/// tuning values may vary between jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineProfile {
    /// Pitch-conditioned model variant
    pub f0_condition: bool,
    pub checkpoint: Option<PathBuf>,
    pub model_config: Option<PathBuf>,
    pub fp16: bool,
}

/// Convert one source file against one target voice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionJob {
    /// Source audio path
    pub source: PathBuf,
    /// Target reference voice sample
    pub target: PathBuf,
    /// Shared output directory
    pub output_dir: PathBuf,
    pub diffusion_steps: u32,
    pub length_adjust: f32,
    pub inference_cfg_rate: f32,
    pub n_quantizers: u32,
    pub auto_f0_adjust: bool,
    pub semi_tone_shift: i32,
    pub engine: EngineProfile,
}

impl ConversionJob {
    /// Pitch-conditioning flag
    pub fn f0_condition(&self) -> bool {
        self.engine.f0_condition
    }

    /// `vc_{source}_{reference}_{length_adjust}_{diffusion_steps}_{inference_cfg_rate}.wav`
    pub fn output_file_name(&self) -> String {
        format!(
            "vc_{}_{}_{:?}_{}_{:?}.wav",
            file_stem(&self.source),
            file_stem(&self.target),
            self.length_adjust,
            self.diffusion_steps,
            self.inference_cfg_rate
        )
    }

    /// Final output location
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.output_file_name())
    }

    /// Location the engine writes to before the output is moved into place
    ///
    /// Hidden and suffixed so an interrupted write never looks like a result.
    pub fn staging_path(&self) -> PathBuf {
        self.output_dir
            .join(format!(".{}.partial", self.output_file_name()))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether `file_name` is a conversion result against `reference`
///
/// Any tuning values match, so results written by earlier runs with other
/// settings are recognised as well.
pub fn is_output_name(file_name: &str, reference: &Path) -> bool {
    let Some(body) = file_name
        .strip_prefix("vc_")
        .and_then(|name| name.strip_suffix(".wav"))
    else {
        return false;
    };

    let mut fields = body.rsplitn(4, '_');
    let (Some(cfg_rate), Some(steps), Some(length), Some(rest)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return false;
    };

    cfg_rate.parse::<f32>().is_ok()
        && steps.parse::<u32>().is_ok()
        && length.parse::<f32>().is_ok()
        && rest
            .strip_suffix(&format!("_{}", file_stem(reference)))
            .is_some_and(|source| !source.is_empty())
}

/// Build one job per source file, preserving source order
pub fn build_jobs(
    config: &BatchConfig,
    sources: &[PathBuf],
    output_dir: &Path,
) -> BatchResult<Vec<ConversionJob>> {
    if sources.is_empty() {
        return Err(BatchError::NoInputFiles);
    }

    let mut seen: HashMap<String, &PathBuf> = HashMap::with_capacity(sources.len());
    let mut jobs = Vec::with_capacity(sources.len());

    for source in sources {
        let job = ConversionJob {
            source: source.clone(),
            target: config.reference_audio.clone(),
            output_dir: output_dir.to_path_buf(),
            diffusion_steps: config.params.diffusion_steps,
            length_adjust: config.params.length_adjust,
            inference_cfg_rate: config.params.inference_cfg_rate,
            n_quantizers: config.params.n_quantizers,
            auto_f0_adjust: config.pitch.auto_f0_adjust,
            semi_tone_shift: config.pitch.semi_tone_shift,
            engine: config.engine.clone(),
        };

        let name = job.output_file_name();
        if let Some(first) = seen.insert(name.clone(), source) {
            return Err(BatchError::OutputCollision {
                first: first.clone(),
                second: source.clone(),
                name,
            });
        }

        jobs.push(job);
    }

    Ok(jobs)
}

/// Check every job can run on an engine loaded for the first job
pub fn ensure_shared_profile(jobs: &[ConversionJob]) -> BatchResult<()> {
    let Some(first) = jobs.first() else {
        return Ok(());
    };

    for (index, job) in jobs.iter().enumerate().skip(1) {
        if job.engine != first.engine {
            return Err(BatchError::EngineMismatch {
                index,
                expected: first.engine.clone(),
                found: job.engine.clone(),
            });
        }
    }

    Ok(())
}
