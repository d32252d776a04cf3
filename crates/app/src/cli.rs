use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{QuizSettings, QuizSettingsDraft, QuizSettingsError};

pub const DB_URL_ENV: &str = "QUIZ_DB_URL";
pub const MODE_ENV: &str = "QUIZ_MODE";
pub const PRESET_ENV: &str = "QUIZ_SPEECH_PRESET";
const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_HISTORY_LIMIT: u32 = 20;

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    Settings(QuizSettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<QuizSettingsError> for ArgsError {
    fn from(err: QuizSettingsError) -> Self {
        ArgsError::Settings(err)
    }
}

/// Where the quiz vocabulary comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabularySource {
    File(PathBuf),
    Stored(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizArgs {
    pub source: VocabularySource,
    pub db_url: String,
    pub settings: QuizSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryArgs {
    pub db_url: String,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportArgs {
    pub name: String,
    pub file: PathBuf,
    pub db_url: String,
}

/// What `app lists` does with the stored lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListsAction {
    All,
    Show(String),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListsArgs {
    pub db_url: String,
    pub action: ListsAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quiz(QuizArgs),
    History(HistoryArgs),
    Import(ImportArgs),
    Lists(ListsArgs),
    Help,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app quiz <file> [--mode <mode>] [--choices <n>] [--preset <preset>]");
    eprintln!("                  [--rate <0.3-2.0>] [--pitch <0.5-2.0>] [--volume <0.1-1.0>]");
    eprintln!("                  [--voice <index>] [--db <sqlite_url>]");
    eprintln!("  app quiz --list <name> [options as above]");
    eprintln!("  app import <name> <file> [--db <sqlite_url>]");
    eprintln!("  app lists [--show <name> | --delete <name>] [--db <sqlite_url>]");
    eprintln!("  app history [--limit <n>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Modes: vocabulary (default), meaning, listening");
    eprintln!("Presets: slow, normal, fast, clear");
    eprintln!();
    eprintln!("In a quiz: type an answer, or :reveal, :play, :restart, :quit");
    eprintln!("  :rate <n>, :pitch <n>, :volume <n> adjust speech (clamped to range)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_ENV}, {MODE_ENV}, {PRESET_ENV}, QUIZ_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

/// Parse everything after the program name.
///
/// `env` looks up fallbacks for flags that were not given.
pub fn parse_args(
    argv: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Command, ArgsError> {
    let mut args = argv.into_iter();
    let Some(cmd) = args.next() else {
        return Ok(Command::Help);
    };
    match cmd.as_str() {
        "quiz" => parse_quiz(&mut args, &env).map(Command::Quiz),
        "history" => parse_history(&mut args, &env).map(Command::History),
        "import" => parse_import(&mut args, &env).map(Command::Import),
        "lists" => parse_lists(&mut args, &env).map(Command::Lists),
        "--help" | "-h" | "help" => Ok(Command::Help),
        _ => Err(ArgsError::UnknownCommand(cmd)),
    }
}

fn parse_quiz(
    args: &mut impl Iterator<Item = String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<QuizArgs, ArgsError> {
    let mut db_url = default_db_url(env);
    let mut source = None;
    let mut draft = QuizSettingsDraft {
        mode: env(MODE_ENV),
        speech_preset: env(PRESET_ENV),
        ..QuizSettingsDraft::new()
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db(args)?,
            "--mode" => draft.mode = Some(require_value(args, "--mode")?),
            "--preset" => draft.speech_preset = Some(require_value(args, "--preset")?),
            "--choices" => {
                draft.choices = Some(parse_number(require_value(args, "--choices")?, "--choices")?);
            }
            "--rate" => {
                draft.rate = Some(parse_number(require_value(args, "--rate")?, "--rate")?);
            }
            "--pitch" => {
                draft.pitch = Some(parse_number(require_value(args, "--pitch")?, "--pitch")?);
            }
            "--volume" => {
                draft.volume = Some(parse_number(require_value(args, "--volume")?, "--volume")?);
            }
            "--voice" => {
                draft.voice_index = Some(parse_number(require_value(args, "--voice")?, "--voice")?);
            }
            "--list" => {
                source = Some(VocabularySource::Stored(require_value(args, "--list")?));
            }
            _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
            _ if source.is_none() => source = Some(VocabularySource::File(PathBuf::from(arg))),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(QuizArgs {
        source: source.ok_or(ArgsError::MissingArgument { name: "file" })?,
        db_url,
        settings: draft.validate()?,
    })
}

fn parse_history(
    args: &mut impl Iterator<Item = String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<HistoryArgs, ArgsError> {
    let mut db_url = default_db_url(env);
    let mut limit = DEFAULT_HISTORY_LIMIT;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db(args)?,
            "--limit" => limit = parse_number(require_value(args, "--limit")?, "--limit")?,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(HistoryArgs { db_url, limit })
}

fn parse_import(
    args: &mut impl Iterator<Item = String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ImportArgs, ArgsError> {
    let mut db_url = default_db_url(env);
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db(args)?,
            _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional
        .next()
        .ok_or(ArgsError::MissingArgument { name: "name" })?;
    let file = positional
        .next()
        .ok_or(ArgsError::MissingArgument { name: "file" })?;
    if let Some(extra) = positional.next() {
        return Err(ArgsError::UnknownArg(extra));
    }

    Ok(ImportArgs {
        name,
        file: PathBuf::from(file),
        db_url,
    })
}

fn parse_lists(
    args: &mut impl Iterator<Item = String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ListsArgs, ArgsError> {
    let mut db_url = default_db_url(env);
    let mut action = ListsAction::All;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db(args)?,
            "--show" if action == ListsAction::All => {
                action = ListsAction::Show(require_value(args, "--show")?);
            }
            "--delete" if action == ListsAction::All => {
                action = ListsAction::Delete(require_value(args, "--delete")?);
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(ListsArgs { db_url, action })
}

fn default_db_url(env: &impl Fn(&str) -> Option<String>) -> String {
    env(DB_URL_ENV)
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url)
}

fn parse_db(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
