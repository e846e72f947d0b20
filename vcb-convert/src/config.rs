//! Batch configuration
//!
//! Settings sources priority:
//! 1. Command-line arguments
//! 2. TOML configuration file
//! 3. Built-in defaults (code constants)
//!
//! Everything a run needs is folded into one immutable [`BatchConfig`] before
//! any file I/O happens. An unknown speaker or an out-of-range tuning value
//! fails here, not inside the batch loop.

use crate::error::{BatchError, BatchResult};
use crate::job::EngineProfile;
use crate::presets::{PresetCatalog, SpeakerPreset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vcb_common::config::LoggingConfig;

/// Default directory holding the preset reference samples
pub const DEFAULT_REFERENCE_ROOT: &str = "reference_audio";

/// Per-call tuning parameters, shared by every job in a batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionParams {
    /// Diffusion steps (quality/latency trade-off)
    pub diffusion_steps: u32,
    /// Time-stretch ratio (1.0 keeps the source duration)
    pub length_adjust: f32,
    /// Classifier-free guidance strength, 0.0 to 1.0
    pub inference_cfg_rate: f32,
    /// Quantizer count (source content detail preserved)
    pub n_quantizers: u32,
    /// Condition the output on the source pitch contour
    pub f0_condition: bool,
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            diffusion_steps: 100,
            length_adjust: 1.0,
            inference_cfg_rate: 0.7,
            n_quantizers: 3,
            f0_condition: true,
        }
    }
}

impl ConversionParams {
    /// Check every value is inside its accepted range
    pub fn validate(&self) -> BatchResult<()> {
        if self.diffusion_steps == 0 {
            return Err(BatchError::InvalidParameter(
                "diffusion_steps must be at least 1".to_string(),
            ));
        }
        if !self.length_adjust.is_finite() || self.length_adjust <= 0.0 {
            return Err(BatchError::InvalidParameter(format!(
                "length_adjust must be a positive number, got {}",
                self.length_adjust
            )));
        }
        if !(0.0..=1.0).contains(&self.inference_cfg_rate) {
            return Err(BatchError::InvalidParameter(format!(
                "inference_cfg_rate must be within 0.0..=1.0, got {}",
                self.inference_cfg_rate
            )));
        }
        if self.n_quantizers == 0 {
            return Err(BatchError::InvalidParameter(
                "n_quantizers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pitch handling applied to every job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PitchSettings {
    /// Engine estimates the shift automatically; takes precedence over the manual shift
    pub auto_f0_adjust: bool,
    /// Manual offset in semitones
    pub semi_tone_shift: i32,
}

/// What to do with the rest of the batch when one job fails
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and run the remaining jobs
    #[default]
    Continue,
    /// Stop at the first failure; remaining jobs are reported as skipped
    Abort,
}

/// Optional tuning values from one settings source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConversionOverrides {
    pub diffusion_steps: Option<u32>,
    pub length_adjust: Option<f32>,
    pub inference_cfg_rate: Option<f32>,
    pub n_quantizers: Option<u32>,
    pub f0_condition: Option<bool>,
    pub auto_f0_adjust: Option<bool>,
    pub semi_tone_shift: Option<i32>,
}

impl ConversionOverrides {
    /// Values from `self`, falling back to `fallback` field by field
    pub fn or(self, fallback: Self) -> Self {
        Self {
            diffusion_steps: self.diffusion_steps.or(fallback.diffusion_steps),
            length_adjust: self.length_adjust.or(fallback.length_adjust),
            inference_cfg_rate: self.inference_cfg_rate.or(fallback.inference_cfg_rate),
            n_quantizers: self.n_quantizers.or(fallback.n_quantizers),
            f0_condition: self.f0_condition.or(fallback.f0_condition),
            auto_f0_adjust: self.auto_f0_adjust.or(fallback.auto_f0_adjust),
            semi_tone_shift: self.semi_tone_shift.or(fallback.semi_tone_shift),
        }
    }

    /// Tuning parameters with built-in defaults filled in
    pub fn params(&self) -> ConversionParams {
        let defaults = ConversionParams::default();
        ConversionParams {
            diffusion_steps: self.diffusion_steps.unwrap_or(defaults.diffusion_steps),
            length_adjust: self.length_adjust.unwrap_or(defaults.length_adjust),
            inference_cfg_rate: self.inference_cfg_rate.unwrap_or(defaults.inference_cfg_rate),
            n_quantizers: self.n_quantizers.unwrap_or(defaults.n_quantizers),
            f0_condition: self.f0_condition.unwrap_or(defaults.f0_condition),
        }
    }

    /// Pitch handling: preset values unless overridden
    pub fn pitch(&self, preset: &SpeakerPreset) -> PitchSettings {
        PitchSettings {
            auto_f0_adjust: self.auto_f0_adjust.unwrap_or(preset.auto_pitch_adjust),
            semi_tone_shift: self.semi_tone_shift.unwrap_or(preset.semitone_shift),
        }
    }
}

/// Conversion engine settings (`[engine]` table)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Worker executable
    pub program: String,
    /// Worker arguments
    pub args: Vec<String>,
    /// Model checkpoint (engine default when unset)
    pub checkpoint: Option<PathBuf>,
    /// Model config file (engine default when unset)
    pub model_config: Option<PathBuf>,
    /// Half-precision inference
    pub fp16: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["-m".to_string(), "seed_vc.worker".to_string()],
            checkpoint: None,
            model_config: None,
            fp16: true,
        }
    }
}

/// Run settings from one source (command line or config file)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsLayer {
    pub speaker: Option<String>,
    pub reference_root: Option<PathBuf>,
    pub failure_policy: Option<FailurePolicy>,
    pub conversion: ConversionOverrides,
}

impl SettingsLayer {
    /// Values from `self`, falling back to `fallback`
    pub fn or(self, fallback: Self) -> Self {
        Self {
            speaker: self.speaker.or(fallback.speaker),
            reference_root: self.reference_root.or(fallback.reference_root),
            failure_policy: self.failure_policy.or(fallback.failure_policy),
            conversion: self.conversion.or(fallback.conversion),
        }
    }
}

/// TOML config file schema
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub speaker: Option<String>,
    pub reference_root: Option<PathBuf>,
    pub failure_policy: Option<FailurePolicy>,
    pub conversion: ConversionOverrides,
    pub engine: EngineSettings,
    pub logging: LoggingConfig,
}

impl FileConfig {
    /// The run settings this file contributes
    pub fn settings(&self) -> SettingsLayer {
        SettingsLayer {
            speaker: self.speaker.clone(),
            reference_root: self.reference_root.clone(),
            failure_policy: self.failure_policy,
            conversion: self.conversion.clone(),
        }
    }
}

/// Resolved, immutable configuration for one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchConfig {
    pub preset: &'static SpeakerPreset,
    /// Reference voice sample (preset path under the reference root)
    pub reference_audio: PathBuf,
    pub params: ConversionParams,
    pub pitch: PitchSettings,
    pub engine: EngineProfile,
    pub failure_policy: FailurePolicy,
}

impl BatchConfig {
    /// Defaults for one speaker
    pub fn for_speaker(speaker_id: &str) -> BatchResult<Self> {
        Self::builder(speaker_id).build()
    }

    pub fn builder(speaker_id: impl Into<String>) -> BatchConfigBuilder {
        BatchConfigBuilder::new(speaker_id)
    }

    /// Merge command-line settings over a config file
    pub fn from_layers(cli: SettingsLayer, file: &FileConfig) -> BatchResult<Self> {
        let merged = cli.or(file.settings());
        let speaker = merged.speaker.ok_or_else(|| {
            BatchError::InvalidParameter(
                "no speaker configured (use --speaker or set `speaker` in the config file)"
                    .to_string(),
            )
        })?;

        let mut builder = Self::builder(speaker)
            .conversion(merged.conversion)
            .engine(file.engine.clone())
            .failure_policy(merged.failure_policy.unwrap_or_default());
        if let Some(root) = merged.reference_root {
            builder = builder.reference_root(root);
        }
        builder.build()
    }
}

/// Builder for [`BatchConfig`]
#[derive(Debug, Clone)]
pub struct BatchConfigBuilder {
    speaker: String,
    reference_root: PathBuf,
    conversion: ConversionOverrides,
    engine: EngineSettings,
    failure_policy: FailurePolicy,
}

impl BatchConfigBuilder {
    fn new(speaker: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            reference_root: PathBuf::from(DEFAULT_REFERENCE_ROOT),
            conversion: ConversionOverrides::default(),
            engine: EngineSettings::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn reference_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.reference_root = root.into();
        self
    }

    pub fn conversion(mut self, overrides: ConversionOverrides) -> Self {
        self.conversion = overrides;
        self
    }

    pub fn engine(mut self, settings: EngineSettings) -> Self {
        self.engine = settings;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Resolve the preset and validate; performs no I/O
    pub fn build(self) -> BatchResult<BatchConfig> {
        let preset = PresetCatalog::resolve(&self.speaker)?;
        let params = self.conversion.params();
        params.validate()?;

        Ok(BatchConfig {
            preset,
            reference_audio: preset.reference_path(&self.reference_root),
            params,
            pitch: self.conversion.pitch(preset),
            engine: EngineProfile {
                f0_condition: params.f0_condition,
                checkpoint: self.engine.checkpoint,
                model_config: self.engine.model_config,
                fp16: self.engine.fp16,
            },
            failure_policy: self.failure_policy,
        })
    }
}
