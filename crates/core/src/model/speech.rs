use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

pub const RATE_RANGE: RangeInclusive<f32> = 0.3..=2.0;
pub const PITCH_RANGE: RangeInclusive<f32> = 0.5..=2.0;
pub const VOLUME_RANGE: RangeInclusive<f32> = 0.1..=1.0;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SpeechSettingsError {
    #[error("rate must be between 0.3 and 2.0, got {0}")]
    InvalidRate(f32),

    #[error("pitch must be between 0.5 and 2.0, got {0}")]
    InvalidPitch(f32),

    #[error("volume must be between 0.1 and 1.0, got {0}")]
    InvalidVolume(f32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown speech preset: {0}")]
pub struct ParseSpeechPresetError(String);

//
// ─── VOICES ────────────────────────────────────────────────────────────────────
//

/// A voice offered by the platform speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47-ish language tag as reported by the engine, e.g. `en-US`.
    pub lang: String,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    #[must_use]
    pub fn is_english(&self) -> bool {
        self.lang.to_ascii_lowercase().starts_with("en")
            || self.name.to_lowercase().contains("english")
    }
}

//
// ─── PRESETS ───────────────────────────────────────────────────────────────────
//

/// Named `{rate, pitch}` shortcuts. Applying one never touches volume or voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechPreset {
    Slow,
    Normal,
    Fast,
    Clear,
}

impl SpeechPreset {
    pub const ALL: [SpeechPreset; 4] = [
        SpeechPreset::Slow,
        SpeechPreset::Normal,
        SpeechPreset::Fast,
        SpeechPreset::Clear,
    ];

    /// `(rate, pitch)` for this preset.
    #[must_use]
    pub fn rate_pitch(self) -> (f32, f32) {
        match self {
            SpeechPreset::Slow => (0.6, 1.0),
            SpeechPreset::Normal => (1.0, 1.0),
            SpeechPreset::Fast => (1.4, 1.0),
            SpeechPreset::Clear => (0.8, 1.1),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SpeechPreset::Slow => "slow",
            SpeechPreset::Normal => "normal",
            SpeechPreset::Fast => "fast",
            SpeechPreset::Clear => "clear",
        }
    }
}

impl fmt::Display for SpeechPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeechPreset {
    type Err = ParseSpeechPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            "clear" => Ok(Self::Clear),
            _ => Err(ParseSpeechPresetError(s.to_owned())),
        }
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Playback parameters read on every speak request.
///
/// `new` validates; the `set_*` methods clamp, matching slider input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechSettings {
    rate: f32,
    pitch: f32,
    volume: f32,
    voice_index: Option<usize>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice_index: None,
        }
    }
}

impl SpeechSettings {
    /// # Errors
    ///
    /// Returns `SpeechSettingsError` if any value is outside its range or not finite.
    pub fn new(
        rate: f32,
        pitch: f32,
        volume: f32,
        voice_index: Option<usize>,
    ) -> Result<Self, SpeechSettingsError> {
        if !RATE_RANGE.contains(&rate) {
            return Err(SpeechSettingsError::InvalidRate(rate));
        }
        if !PITCH_RANGE.contains(&pitch) {
            return Err(SpeechSettingsError::InvalidPitch(pitch));
        }
        if !VOLUME_RANGE.contains(&volume) {
            return Err(SpeechSettingsError::InvalidVolume(volume));
        }
        Ok(Self {
            rate,
            pitch,
            volume,
            voice_index,
        })
    }

    #[must_use]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[must_use]
    pub fn voice_index(&self) -> Option<usize> {
        self.voice_index
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = clamp(rate, &RATE_RANGE, self.rate);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = clamp(pitch, &PITCH_RANGE, self.pitch);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp(volume, &VOLUME_RANGE, self.volume);
    }

    pub fn set_voice_index(&mut self, voice_index: Option<usize>) {
        self.voice_index = voice_index;
    }

    /// Replace rate and pitch together.
    pub fn apply_preset(&mut self, preset: SpeechPreset) {
        let (rate, pitch) = preset.rate_pitch();
        self.rate = rate;
        self.pitch = pitch;
    }

    #[must_use]
    pub fn with_preset(mut self, preset: SpeechPreset) -> Self {
        self.apply_preset(preset);
        self
    }

    /// Pick a voice: the explicit index if it exists, else the first English voice.
    ///
    /// `None` means the engine default should be used.
    #[must_use]
    pub fn select_voice<'a>(&self, voices: &'a [Voice]) -> Option<&'a Voice> {
        self.voice_index
            .and_then(|idx| voices.get(idx))
            .or_else(|| voices.iter().find(|v| v.is_english()))
    }
}

// NaN keeps the previous value.
fn clamp(value: f32, range: &RangeInclusive<f32>, previous: f32) -> f32 {
    if value.is_nan() {
        previous
    } else {
        value.clamp(*range.start(), *range.end())
    }
}
