//! Speaker preset catalog
//!
//! A static table of target voices. Each preset names a reference voice
//! sample and how pitch should be reconciled between source and target.
//! Adding a speaker is a new table row; lookup is exact-match on the id and
//! performs no I/O.

use crate::error::{BatchError, BatchResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One named voice-conversion target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeakerPreset {
    /// Unique speaker identifier
    pub id: &'static str,
    /// Reference voice sample, relative to the reference root
    pub reference_audio: &'static str,
    /// Let the engine estimate the pitch shift from source and reference
    pub auto_pitch_adjust: bool,
    /// Manual pitch offset in semitones (ignored when `auto_pitch_adjust` is set)
    pub semitone_shift: i32,
}

impl SpeakerPreset {
    const fn auto(id: &'static str, reference_audio: &'static str) -> Self {
        Self {
            id,
            reference_audio,
            auto_pitch_adjust: true,
            semitone_shift: 0,
        }
    }

    const fn shifted(id: &'static str, reference_audio: &'static str, semitone_shift: i32) -> Self {
        Self {
            id,
            reference_audio,
            auto_pitch_adjust: false,
            semitone_shift,
        }
    }

    /// Semitone shift the engine actually applies
    pub fn effective_semitone_shift(&self) -> i32 {
        if self.auto_pitch_adjust {
            0
        } else {
            self.semitone_shift
        }
    }

    /// Reference sample path under `root`
    pub fn reference_path(&self, root: &Path) -> PathBuf {
        root.join(self.reference_audio)
    }
}

/// Compiled-in presets.
///
/// The male reference voice sits an octave below the typical source, so it
/// uses a fixed shift instead of estimation.
static PRESETS: &[SpeakerPreset] = &[
    SpeakerPreset::shifted("databaker_male", "databaker_male_102377.wav", -12),
    SpeakerPreset::auto("sisi", "sisi_VO01_07.wav"),
    SpeakerPreset::auto("waner", "waner.wav"),
    SpeakerPreset::auto("xier", "xier.wav"),
    SpeakerPreset::auto("yawen", "yawen.wav"),
    SpeakerPreset::auto("zia", "zia.wav"),
    SpeakerPreset::auto("zina", "zina.wav"),
    SpeakerPreset::auto("zixue", "zixue.wav"),
    SpeakerPreset::auto("chenlily", "chenlily.wav"),
    SpeakerPreset::auto("chenyifa", "chenyifa.wav"),
    SpeakerPreset::auto("tanyilun", "tanyilun.wav"),
    SpeakerPreset::auto("yangmi", "yangmi.wav"),
    SpeakerPreset::auto("zhaoliying", "zhaoliying.wav"),
];

/// Lookup over the compiled-in presets
pub struct PresetCatalog;

impl PresetCatalog {
    /// Resolve a speaker identifier to its preset
    pub fn resolve(speaker_id: &str) -> BatchResult<&'static SpeakerPreset> {
        PRESETS
            .iter()
            .find(|preset| preset.id == speaker_id)
            .ok_or_else(|| BatchError::UnknownSpeaker {
                speaker: speaker_id.to_string(),
                known: Self::ids().join(", "),
            })
    }

    /// All presets in catalog order
    pub fn all() -> &'static [SpeakerPreset] {
        PRESETS
    }

    /// All speaker identifiers in catalog order
    pub fn ids() -> Vec<&'static str> {
        PRESETS.iter().map(|preset| preset.id).collect()
    }
}
