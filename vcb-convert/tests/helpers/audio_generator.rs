//! Audio Test Fixture Generator
//!
//! WAV sources plus a reference-sample tree laid out like a real install.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vcb_convert::presets::PresetCatalog;

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 0.25,
            sample_rate: 22050,
            channels: 1,
        }
    }
}

/// Generate a test WAV file (440 Hz tone)
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let sample =
            (0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin() * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// A file with a WAV name and header magic but no decodable stream
pub fn write_corrupt_file(path: &Path) -> anyhow::Result<PathBuf> {
    let mut bytes = b"RIFF\x24\x00\x00\x00WAVE".to_vec();
    bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
    std::fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}

/// Temporary input, output and reference-sample directories
pub struct Fixture {
    pub root: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub reference_root: PathBuf,
}

impl Fixture {
    /// Empty input dir; every preset's reference sample present
    pub fn new() -> anyhow::Result<Self> {
        let root = TempDir::new()?;
        let input = root.path().join("input");
        let output = root.path().join("output");
        let reference_root = root.path().join("reference_audio");
        std::fs::create_dir_all(&input)?;

        for preset in PresetCatalog::all() {
            generate_test_wav(
                &preset.reference_path(&reference_root),
                &AudioConfig::default(),
            )?;
        }

        Ok(Self {
            root,
            input,
            output,
            reference_root,
        })
    }

    /// Add a source recording to the input directory
    pub fn add_source(&self, relative: &str) -> anyhow::Result<PathBuf> {
        generate_test_wav(&self.input.join(relative), &AudioConfig::default())
    }

    /// Files currently in the output directory, sorted by name
    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
