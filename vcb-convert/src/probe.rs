//! Source audio pre-flight probe
//!
//! Opens a source with symphonia and decodes its first packet, so corrupt or
//! unsupported files fail before they reach the conversion engine.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Basic stream facts about a source file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AudioProbe {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count, if the container declares it
    pub channels: Option<usize>,
    /// Duration in seconds, if the container declares a frame count
    pub duration_seconds: Option<f64>,
}

/// Probe a source file
///
/// # Errors
/// * File I/O errors
/// * Unsupported format or codec
/// * No audio track, or the first packet does not decode
pub fn probe_source(path: &Path) -> Result<AudioProbe> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", path.display()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params.sample_rate.context("Sample rate unknown")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .with_context(|| format!("Unsupported codec in: {}", path.display()))?;

    // First packet of the chosen track must decode
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                anyhow::bail!("No audio data in: {}", path.display());
            }
            Err(e) => return Err(anyhow::anyhow!("Error reading packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        decoder
            .decode(&packet)
            .with_context(|| format!("Failed to decode audio in: {}", path.display()))?;
        break;
    }

    let probe = AudioProbe {
        sample_rate,
        channels: params.channels.map(|c| c.count()),
        duration_seconds: params
            .n_frames
            .map(|frames| frames as f64 / sample_rate as f64),
    };

    tracing::debug!(
        path = %path.display(),
        sample_rate = probe.sample_rate,
        channels = ?probe.channels,
        "Source probed"
    );

    Ok(probe)
}
