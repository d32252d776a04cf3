//! Speech playback for listening mode.
//!
//! `SpeechService` owns a single playback slot: starting an utterance cancels
//! whatever is playing, and events from cancelled utterances are dropped.

mod command;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_core::model::{SpeechSettings, Voice};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::SpeechError;

pub use command::CommandSpeechEngine;

/// Errors reported by a platform speech engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpeechEngineError {
    #[error("speech engine unavailable")]
    Unavailable,
    #[error("failed to start speech: {0}")]
    Start(String),
}

/// One request to speak `text` with fully resolved parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice: Option<Voice>,
}

/// Lifecycle notifications from an engine, possibly from another thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    Started,
    Ended,
    Failed(String),
}

pub type UtteranceCallback = Box<dyn Fn(UtteranceEvent) + Send + Sync>;

/// Platform text-to-speech.
pub trait SpeechEngine: Send + Sync {
    fn is_available(&self) -> bool;

    fn voices(&self) -> Vec<Voice>;

    /// Begin speaking, reporting progress through `on_event`.
    ///
    /// # Errors
    ///
    /// Returns `SpeechEngineError` if playback cannot be started.
    fn speak(
        &self,
        utterance: Utterance,
        on_event: UtteranceCallback,
    ) -> Result<(), SpeechEngineError>;

    /// Stop the current utterance, if any.
    fn cancel(&self);
}

/// Engine for systems without text-to-speech.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSpeechEngine;

impl SpeechEngine for UnavailableSpeechEngine {
    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(
        &self,
        _utterance: Utterance,
        _on_event: UtteranceCallback,
    ) -> Result<(), SpeechEngineError> {
        Err(SpeechEngineError::Unavailable)
    }

    fn cancel(&self) {}
}

/// Speaking flag tagged with the utterance generation that may change it.
///
/// The generation check and the flag update happen under one lock.
struct SpeakingState {
    generation: Mutex<u64>,
    flag: watch::Sender<bool>,
}

impl SpeakingState {
    fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            generation: Mutex::new(0),
            flag,
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Supersede every earlier utterance and clear the flag.
    fn next_generation(&self) -> u64 {
        let mut generation = self.lock();
        *generation += 1;
        self.flag.send_replace(false);
        *generation
    }

    fn set_if_current(&self, generation: u64, speaking: bool) {
        let current = self.lock();
        if *current == generation {
            self.flag.send_replace(speaking);
        }
    }
}

/// Plays words aloud and publishes whether something is being spoken.
#[derive(Clone)]
pub struct SpeechService {
    engine: Arc<dyn SpeechEngine>,
    state: Arc<SpeakingState>,
}

impl SpeechService {
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            state: Arc::new(SpeakingState::new()),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    #[must_use]
    pub fn voices(&self) -> Vec<Voice> {
        self.engine.voices()
    }

    /// Receiver for the speaking flag: `true` once playback starts, `false`
    /// after it ends, fails, or is stopped.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.flag.subscribe()
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        *self.state.flag.borrow()
    }

    /// Speak `text` with `settings`, cancelling anything already playing.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::CapabilityUnavailable` when the engine cannot
    /// speak, `SpeechError::EmptyText` for blank text, or
    /// `SpeechError::Engine` if playback fails to start.
    pub fn speak(&self, text: &str, settings: &SpeechSettings) -> Result<(), SpeechError> {
        if !self.engine.is_available() {
            return Err(SpeechError::CapabilityUnavailable);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let generation = self.interrupt();

        let voices = self.engine.voices();
        let voice = settings.select_voice(&voices).cloned();
        debug!(
            rate = settings.rate(),
            pitch = settings.pitch(),
            voice = voice.as_ref().map(|v| v.name.as_str()),
            "speaking"
        );
        let utterance = Utterance {
            text: text.to_owned(),
            rate: settings.rate(),
            pitch: settings.pitch(),
            volume: settings.volume(),
            voice,
        };

        let state = Arc::clone(&self.state);
        let on_event: UtteranceCallback = Box::new(move |event| match event {
            UtteranceEvent::Started => state.set_if_current(generation, true),
            UtteranceEvent::Ended => state.set_if_current(generation, false),
            UtteranceEvent::Failed(reason) => {
                warn!(%reason, "speech playback failed");
                state.set_if_current(generation, false);
            }
        });

        self.engine.speak(utterance, on_event).inspect_err(|_| {
            self.state.set_if_current(generation, false);
        })?;
        Ok(())
    }

    /// Stop playback and clear the speaking flag.
    pub fn stop(&self) {
        self.interrupt();
    }

    fn interrupt(&self) -> u64 {
        let generation = self.state.next_generation();
        self.engine.cancel();
        generation
    }
}
