use std::error::Error;
use std::io::Write;

use quiz_core::model::{QuizError, QuizPhase, QuizSettings, SpeechSettings};
use services::{ActiveQuiz, QuizServiceError, QuizSessionService, SpeechService};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

const REVEAL: &str = ":reveal";
const PLAY: &str = ":play";
const RESTART: &str = ":restart";
const QUIT: &str = ":quit";
const RATE: &str = ":rate";
const PITCH: &str = ":pitch";
const VOLUME: &str = ":volume";

/// Line-driven quiz over any async input and writer.
pub struct QuizLoop<'a, W> {
    quizzes: &'a QuizSessionService,
    speech: &'a SpeechService,
    settings: &'a QuizSettings,
    speech_settings: SpeechSettings,
    out: W,
    options: Vec<String>,
    options_for: Option<usize>,
}

impl<'a, W: Write> QuizLoop<'a, W> {
    pub fn new(
        quizzes: &'a QuizSessionService,
        speech: &'a SpeechService,
        settings: &'a QuizSettings,
        out: W,
    ) -> Self {
        Self {
            quizzes,
            speech,
            settings,
            speech_settings: settings.speech().clone(),
            out,
            options: Vec::new(),
            options_for: None,
        }
    }

    /// Run until the learner quits, input ends, or a finished quiz is left.
    pub async fn run<R>(&mut self, quiz: &mut ActiveQuiz, input: R) -> Result<(), Box<dyn Error>>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut show = true;

        loop {
            if show {
                self.present(quiz)?;
                show = false;
            }

            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            let line = line.trim();
            if self.adjust_speech(line)? {
                continue;
            }

            match line {
                QUIT => return Ok(()),
                RESTART => {
                    self.quizzes.restart(quiz);
                    self.options_for = None;
                    writeln!(self.out, "Starting over.")?;
                    show = true;
                }
                PLAY => self.play(quiz)?,
                _ if quiz.is_complete() => return Ok(()),
                REVEAL => match self.quizzes.reveal(quiz) {
                    Ok(_) => show = true,
                    Err(err) => writeln!(self.out, "{err}")?,
                },
                _ if matches!(quiz.session().phase(), QuizPhase::FeedbackShown(_)) => {
                    self.advance(quiz).await?;
                    show = true;
                }
                _ => {
                    let answer = self.resolve_choice(line);
                    match self.quizzes.submit(quiz, &answer) {
                        Ok(_) => show = true,
                        Err(QuizServiceError::Quiz(QuizError::EmptyAnswer)) => {
                            writeln!(self.out, "Please enter an answer.")?;
                        }
                        Err(err) => writeln!(self.out, "{err}")?,
                    }
                }
            }
        }
    }

    fn present(&mut self, quiz: &ActiveQuiz) -> Result<(), Box<dyn Error>> {
        let session = quiz.session();
        match session.phase() {
            QuizPhase::AwaitingAnswer => {
                let progress = session.progress();
                writeln!(self.out)?;
                writeln!(
                    self.out,
                    "Question {}/{} (score {}, {} left)",
                    progress.answered + 1,
                    progress.total,
                    progress.score,
                    progress.remaining
                )?;
                if session.mode().is_spoken() {
                    writeln!(self.out, "Listen and type the word. (:play to hear it again)")?;
                    self.play(quiz)?;
                } else if let Some(prompt) = session.current_prompt() {
                    writeln!(self.out, "  {prompt}")?;
                }

                if self.options_for != Some(session.current_index()) {
                    self.options = match self.settings.choices() {
                        Some(count) => self.quizzes.choices(quiz, count),
                        None => Vec::new(),
                    };
                    self.options_for = Some(session.current_index());
                }
                for (idx, option) in self.options.iter().enumerate() {
                    writeln!(self.out, "  {}) {option}", idx + 1)?;
                }
            }
            QuizPhase::FeedbackShown(feedback) => {
                if feedback.is_correct() {
                    writeln!(self.out, "Correct!")?;
                } else {
                    writeln!(
                        self.out,
                        "Incorrect. The answer is: {}",
                        feedback.correct_answer()
                    )?;
                }
                writeln!(self.out, "Press Enter to continue.")?;
            }
            QuizPhase::Completed => self.print_summary(quiz)?,
        }
        self.out.flush()?;
        Ok(())
    }

    async fn advance(&mut self, quiz: &mut ActiveQuiz) -> Result<(), Box<dyn Error>> {
        match self.quizzes.advance(quiz).await {
            Ok(_) => Ok(()),
            Err(QuizServiceError::Storage(err)) => {
                warn!(error = %err, "quiz result not saved");
                writeln!(self.out, "Could not save this result: {err}")?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn play(&mut self, quiz: &ActiveQuiz) -> Result<(), Box<dyn Error>> {
        let session = quiz.session();
        if !session.mode().is_spoken() {
            writeln!(self.out, "Nothing to play in {} mode.", session.mode())?;
            return Ok(());
        }
        let Some(entry) = session.current_entry() else {
            return Ok(());
        };
        let text = session.mode().prompt_for(entry);
        if let Err(err) = self.speech.speak(text, &self.speech_settings) {
            writeln!(self.out, "Cannot play audio: {err}")?;
        }
        Ok(())
    }

    fn print_summary(&mut self, quiz: &ActiveQuiz) -> Result<(), Box<dyn Error>> {
        let result = quiz.session().result()?;
        let summary = result.summary();
        writeln!(self.out)?;
        writeln!(self.out, "Finished: {summary}")?;
        writeln!(self.out, "{}", summary.tier().message())?;

        let missed: Vec<_> = result.missed().collect();
        if !missed.is_empty() {
            writeln!(self.out, "To review:")?;
            for record in missed {
                if record.user_answer.is_revealed() {
                    writeln!(
                        self.out,
                        "  {} -> {} (revealed)",
                        record.prompt, record.correct_answer
                    )?;
                } else {
                    writeln!(
                        self.out,
                        "  {} -> {} (you said: {})",
                        record.prompt,
                        record.correct_answer,
                        record.user_answer.text()
                    )?;
                }
            }
        }
        if let Some(id) = quiz.result_id() {
            writeln!(self.out, "Saved as result {id}.")?;
        }
        writeln!(self.out, "Type {RESTART} to try again, or press Enter to finish.")?;
        Ok(())
    }

    /// Handle `:rate`, `:pitch` and `:volume`. Values are clamped to their range.
    fn adjust_speech(&mut self, line: &str) -> Result<bool, Box<dyn Error>> {
        let Some((command, value)) = line.split_once(char::is_whitespace) else {
            return Ok(false);
        };
        let apply: fn(&mut SpeechSettings, f32) = match command {
            RATE => SpeechSettings::set_rate,
            PITCH => SpeechSettings::set_pitch,
            VOLUME => SpeechSettings::set_volume,
            _ => return Ok(false),
        };

        match value.trim().parse::<f32>() {
            Ok(value) => {
                apply(&mut self.speech_settings, value);
                let speech = &self.speech_settings;
                writeln!(
                    self.out,
                    "Speech: rate {:.1}, pitch {:.1}, volume {:.1}",
                    speech.rate(),
                    speech.pitch(),
                    speech.volume()
                )?;
            }
            Err(_) => writeln!(self.out, "{command} needs a number")?,
        }
        self.out.flush()?;
        Ok(true)
    }

    /// Map a choice number to its option text; anything else is a typed answer.
    fn resolve_choice(&self, line: &str) -> String {
        line.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.options.get(idx))
            .cloned()
            .unwrap_or_else(|| line.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuizMode, QuizSettingsDraft, VocabularyEntry};
    use quiz_core::time::fixed_now;
    use services::{AppServices, Clock, UnavailableSpeechEngine};
    use std::sync::Arc;
    use storage::repository::Storage;

    fn app() -> AppServices {
        AppServices::from_storage(
            &Storage::in_memory(),
            Clock::fixed(fixed_now()),
            Arc::new(UnavailableSpeechEngine),
        )
    }

    fn settings(mode: &str, choices: Option<usize>) -> QuizSettings {
        QuizSettingsDraft {
            mode: Some(mode.into()),
            choices,
            ..QuizSettingsDraft::new()
        }
        .validate()
        .unwrap()
    }

    async fn drive(
        app: &AppServices,
        settings: &QuizSettings,
        entries: Vec<VocabularyEntry>,
        input: &str,
    ) -> (ActiveQuiz, String) {
        let quizzes = app.quiz_sessions();
        let speech = app.speech();
        let mut quiz = quizzes.start(entries, settings.mode()).unwrap();
        let mut out = Vec::new();
        QuizLoop::new(&quizzes, &speech, settings, &mut out)
            .run(&mut quiz, input.as_bytes())
            .await
            .unwrap();
        (quiz, String::from_utf8(out).unwrap())
    }

    fn cat() -> Vec<VocabularyEntry> {
        vec![VocabularyEntry::new("cat", "con mèo").unwrap()]
    }

    #[tokio::test]
    async fn typed_answer_completes_and_saves() {
        let app = app();
        let settings = settings("vocabulary", None);
        let (quiz, out) = drive(&app, &settings, cat(), "\n Cat \n\n").await;

        assert!(quiz.is_complete());
        assert!(out.contains("Question 1/1 (score 0, 1 left)"));
        assert!(out.contains("  con mèo"));
        assert!(out.contains("Please enter an answer."));
        assert!(out.contains("Correct!"));
        assert!(out.contains("Finished: 1/1 (100%) - Excellent"));
        assert!(out.contains("Saved as result 1."));
        assert_eq!(app.history().list_recent(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reveal_counts_as_missed() {
        let app = app();
        let settings = settings("meaning", None);
        let (quiz, out) = drive(&app, &settings, cat(), ":reveal\n\n").await;

        assert_eq!(quiz.session().score(), 0);
        assert!(out.contains("Incorrect. The answer is: con mèo"));
        assert!(out.contains("Finished: 0/1 (0%) - Needs improvement"));
        assert!(out.contains("cat -> con mèo (revealed)"));
        assert!(!out.contains("you said"));
    }

    #[tokio::test]
    async fn choice_number_submits_option() {
        let app = app();
        let settings = settings("meaning", Some(2));
        let entries = vec![
            VocabularyEntry::new("cat", "con mèo").unwrap(),
            VocabularyEntry::new("dog", "con chó").unwrap(),
        ];
        let quizzes = app.quiz_sessions();
        let speech = app.speech();
        let mut quiz = quizzes.start(entries, QuizMode::Meaning).unwrap();
        let expected = quiz.session().current_entry().unwrap().meaning().to_owned();

        let mut out = Vec::new();
        let mut quiz_loop = QuizLoop::new(&quizzes, &speech, &settings, &mut out);
        quiz_loop.present(&quiz).unwrap();
        let pick = quiz_loop
            .options
            .iter()
            .position(|option| *option == expected)
            .unwrap()
            + 1;
        let input = format!("{pick}\n:quit\n");
        quiz_loop.run(&mut quiz, input.as_bytes()).await.unwrap();

        assert!(matches!(quiz.session().phase(), QuizPhase::FeedbackShown(f) if f.is_correct()));
    }

    #[tokio::test]
    async fn listening_without_speech_reports_and_continues() {
        let app = app();
        let settings = settings("listening", None);
        let (quiz, out) = drive(&app, &settings, cat(), ":play\ncat\n:restart\n:quit\n").await;

        assert!(out.contains("Cannot play audio: text-to-speech is not available"));
        assert!(out.contains("Starting over."));
        assert!(quiz.session().accepts_submission());
        assert_eq!(quiz.session().answers().len(), 0);
    }

    #[tokio::test]
    async fn speech_commands_clamp_values() {
        let app = app();
        let settings = settings("listening", None);
        let (quiz, out) = drive(
            &app,
            &settings,
            cat(),
            ":rate 5\n:pitch 0.8\n:volume loud\n:quit\n",
        )
        .await;

        assert!(out.contains("Speech: rate 2.0, pitch 1.0, volume 1.0"));
        assert!(out.contains("Speech: rate 2.0, pitch 0.8, volume 1.0"));
        assert!(out.contains(":volume needs a number"));
        assert!(quiz.session().accepts_submission());
    }
}
