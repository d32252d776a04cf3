use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use quiz_core::model::Voice;
use tracing::{debug, warn};

use super::{SpeechEngine, SpeechEngineError, Utterance, UtteranceCallback, UtteranceEvent};

const PROGRAMS: [&str; 2] = ["espeak-ng", "espeak"];
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const POLL_INTERVAL: Duration = Duration::from_millis(40);

struct Playback {
    id: u64,
    child: Child,
}

/// Speaks through an `espeak-ng` (or `espeak`) executable.
///
/// The voice table is read once, on first use.
pub struct CommandSpeechEngine {
    program: Option<PathBuf>,
    voices: OnceLock<Vec<Voice>>,
    current: Arc<Mutex<Option<Playback>>>,
    next_id: AtomicU64,
}

impl CommandSpeechEngine {
    /// Look for a supported synthesizer on `PATH`.
    #[must_use]
    pub fn detect() -> Self {
        let program = env::var_os("PATH").and_then(|paths| {
            env::split_paths(&paths).find_map(|dir| {
                PROGRAMS
                    .iter()
                    .map(|name| dir.join(name))
                    .find(|candidate| candidate.is_file())
            })
        });
        match &program {
            Some(path) => debug!(program = %path.display(), "speech synthesizer found"),
            None => debug!("no speech synthesizer on PATH"),
        }
        Self::with_program(program)
    }

    #[must_use]
    pub fn with_program(program: Option<PathBuf>) -> Self {
        Self {
            program,
            voices: OnceLock::new(),
            current: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    fn playback(&self) -> MutexGuard<'_, Option<Playback>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn voices(&self) -> Vec<Voice> {
        let Some(program) = &self.program else {
            return Vec::new();
        };
        self.voices.get_or_init(|| list_voices(program)).clone()
    }

    fn speak(
        &self,
        utterance: Utterance,
        on_event: UtteranceCallback,
    ) -> Result<(), SpeechEngineError> {
        let program = self.program.as_ref().ok_or(SpeechEngineError::Unavailable)?;
        self.cancel();

        let mut child = Command::new(program)
            .args(synth_args(&utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechEngineError::Start(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(utterance.text.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SpeechEngineError::Start(err.to_string()));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        *self.playback() = Some(Playback { id, child });
        on_event(UtteranceEvent::Started);

        let current = Arc::clone(&self.current);
        thread::spawn(move || wait_for_exit(&current, id, &on_event));
        Ok(())
    }

    fn cancel(&self) {
        if let Some(mut playback) = self.playback().take() {
            debug!(id = playback.id, "cancelling speech");
            let _ = playback.child.kill();
            let _ = playback.child.wait();
        }
    }
}

fn list_voices(program: &Path) -> Vec<Voice> {
    match Command::new(program).arg("--voices").output() {
        Ok(output) if output.status.success() => {
            let voices = parse_voices(&String::from_utf8_lossy(&output.stdout));
            debug!(count = voices.len(), "speech voices listed");
            voices
        }
        Ok(output) => {
            warn!(status = %output.status, "listing voices failed");
            Vec::new()
        }
        Err(err) => {
            warn!(error = %err, "listing voices failed");
            Vec::new()
        }
    }
}

/// Poll the child for `id` until it exits or is replaced.
fn wait_for_exit(current: &Mutex<Option<Playback>>, id: u64, on_event: &UtteranceCallback) {
    loop {
        let mut guard = current.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(playback) = guard.as_mut().filter(|p| p.id == id) else {
            return;
        };
        match playback.child.try_wait() {
            Ok(Some(status)) => {
                guard.take();
                drop(guard);
                if status.success() {
                    on_event(UtteranceEvent::Ended);
                } else {
                    on_event(UtteranceEvent::Failed(format!("synthesizer exited with {status}")));
                }
                return;
            }
            Ok(None) => {
                drop(guard);
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                guard.take();
                drop(guard);
                on_event(UtteranceEvent::Failed(err.to_string()));
                return;
            }
        }
    }
}

/// Command-line flags for `utterance`; the text itself goes through stdin.
fn synth_args(utterance: &Utterance) -> Vec<String> {
    let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.rate).clamp(80.0, 450.0);
    let pitch = (50.0 * utterance.pitch).clamp(0.0, 99.0);
    let amplitude = (100.0 * utterance.volume).clamp(0.0, 200.0);

    let mut args = vec![
        "-s".to_owned(),
        format!("{words_per_minute:.0}"),
        "-p".to_owned(),
        format!("{pitch:.0}"),
        "-a".to_owned(),
        format!("{amplitude:.0}"),
    ];
    if let Some(voice) = &utterance.voice {
        args.push("-v".to_owned());
        args.push(voice.lang.clone());
    }
    args.push("--stdin".to_owned());
    args
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// Columns are priority, language, age/gender, name, file; names use `_` for spaces.
fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            let lang = cols.get(1)?;
            let name = cols.get(3)?;
            Some(Voice::new(name.replace('_', " "), *lang))
        })
        .collect()
}
