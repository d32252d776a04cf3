use thiserror::Error;

use crate::model::mode::{ParseQuizModeError, QuizMode};
use crate::model::speech::{
    ParseSpeechPresetError, SpeechPreset, SpeechSettings, SpeechSettingsError,
};

/// Smallest multiple-choice list that still offers a choice.
pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 8;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error(transparent)]
    Mode(#[from] ParseQuizModeError),
    #[error(transparent)]
    Preset(#[from] ParseSpeechPresetError),
    #[error(transparent)]
    Speech(#[from] SpeechSettingsError),
    #[error("choice count must be between 2 and 8, got {0}")]
    InvalidChoiceCount(usize),
}

/// Validated settings for starting a quiz.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct QuizSettings {
    mode: QuizMode,
    speech: SpeechSettings,
    choices: Option<usize>,
}

/// Raw, user-supplied quiz settings (flags, environment).
#[derive(Clone, Debug, Default)]
pub struct QuizSettingsDraft {
    pub mode: Option<String>,
    pub speech_preset: Option<String>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub voice_index: Option<usize>,
    pub choices: Option<usize>,
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// Blank strings are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError` for unknown names or out-of-range values.
    pub fn validate(self) -> Result<QuizSettings, QuizSettingsError> {
        let mode = match normalize_optional(self.mode) {
            Some(raw) => raw.parse::<QuizMode>()?,
            None => QuizMode::default(),
        };

        let mut speech = SpeechSettings::default();
        if let Some(raw) = normalize_optional(self.speech_preset) {
            speech.apply_preset(raw.parse::<SpeechPreset>()?);
        }
        // Explicit values win over the preset and must be in range.
        if self.rate.is_some() || self.pitch.is_some() || self.volume.is_some() {
            speech = SpeechSettings::new(
                self.rate.unwrap_or(speech.rate()),
                self.pitch.unwrap_or(speech.pitch()),
                self.volume.unwrap_or(speech.volume()),
                None,
            )?;
        }
        speech.set_voice_index(self.voice_index);

        if let Some(count) = self.choices {
            if !(MIN_CHOICES..=MAX_CHOICES).contains(&count) {
                return Err(QuizSettingsError::InvalidChoiceCount(count));
            }
        }

        Ok(QuizSettings {
            mode,
            speech,
            choices: self.choices,
        })
    }
}

impl QuizSettings {
    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn speech(&self) -> &SpeechSettings {
        &self.speech
    }

    /// Number of multiple-choice options, or `None` for typed answers.
    #[must_use]
    pub fn choices(&self) -> Option<usize> {
        self.choices
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_uses_defaults() {
        let settings = QuizSettingsDraft::new().validate().unwrap();
        assert_eq!(settings.mode(), QuizMode::Vocabulary);
        assert_eq!(settings.speech(), &SpeechSettings::default());
        assert_eq!(settings.choices(), None);
    }

    #[test]
    fn parses_mode_preset_and_volume() {
        let settings = QuizSettingsDraft {
            mode: Some(" listening ".into()),
            speech_preset: Some("fast".into()),
            rate: None,
            pitch: None,
            volume: Some(0.5),
            voice_index: Some(1),
            choices: Some(4),
        }
        .validate()
        .unwrap();

        assert_eq!(settings.mode(), QuizMode::Listening);
        assert_eq!(
            (settings.speech().rate(), settings.speech().pitch()),
            SpeechPreset::Fast.rate_pitch()
        );
        assert_eq!(settings.speech().volume(), 0.5);
        assert_eq!(settings.speech().voice_index(), Some(1));
        assert_eq!(settings.choices(), Some(4));
    }

    #[test]
    fn rejects_bad_values() {
        let err = QuizSettingsDraft {
            mode: Some("spelling".into()),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, QuizSettingsError::Mode(_)));

        let err = QuizSettingsDraft {
            volume: Some(3.0),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            QuizSettingsError::Speech(SpeechSettingsError::InvalidVolume(_))
        ));

        let err = QuizSettingsDraft {
            choices: Some(1),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuizSettingsError::InvalidChoiceCount(1));
    }

    #[test]
    fn explicit_rate_and_pitch_override_preset() {
        let settings = QuizSettingsDraft {
            speech_preset: Some("slow".into()),
            pitch: Some(1.5),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.speech().rate(), SpeechPreset::Slow.rate_pitch().0);
        assert_eq!(settings.speech().pitch(), 1.5);

        let err = QuizSettingsDraft {
            rate: Some(2.5),
            ..QuizSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            QuizSettingsError::Speech(SpeechSettingsError::InvalidRate(2.5))
        );
    }
}
