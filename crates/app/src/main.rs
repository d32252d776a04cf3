use std::sync::Arc;

use quiz_core::model::{format_word_list, parse_word_list};
use services::{AppServices, Clock, CommandSpeechEngine, SpeechEngine};
use tokio::io::BufReader;
use tracing::info;

mod cli;
mod logging;
mod quiz_loop;

use cli::{
    ArgsError, Command, HistoryArgs, ImportArgs, ListsAction, ListsArgs, QuizArgs, VocabularySource,
};
use quiz_loop::QuizLoop;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cmd = cli::parse_args(argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        cli::print_usage();
        e
    })?;

    match cmd {
        Command::Help => {
            cli::print_usage();
            Ok(())
        }
        Command::Quiz(args) => run_quiz(args).await,
        Command::Import(args) => run_import(args).await,
        Command::History(args) => run_history(args).await,
        Command::Lists(args) => run_lists(args).await,
    }
}

async fn open_services(db_url: &str) -> Result<AppServices, Box<dyn std::error::Error>> {
    // Open + migrate SQLite here so the library crates never touch the filesystem layout.
    prepare_sqlite_file(db_url)?;
    let engine: Arc<dyn SpeechEngine> = Arc::new(CommandSpeechEngine::detect());
    Ok(AppServices::new_sqlite(db_url, Clock::system(), engine).await?)
}

async fn run_quiz(args: QuizArgs) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_services(&args.db_url).await?;

    let vocabulary = match &args.source {
        VocabularySource::File(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            parse_word_list(&text)?
        }
        VocabularySource::Stored(name) => app.word_lists().load(name).await?,
    };

    let speech = app.speech();
    if args.settings.mode().is_spoken() && !speech.is_available() {
        eprintln!("Text-to-speech is not available; listening questions cannot be played.");
    }

    let quizzes = app.quiz_sessions();
    let mut quiz = quizzes.start(vocabulary, args.settings.mode())?;
    info!(source = ?args.source, "running quiz");

    let result = {
        let mut quiz_loop =
            QuizLoop::new(&quizzes, &speech, &args.settings, std::io::stdout().lock());
        quiz_loop
            .run(&mut quiz, BufReader::new(tokio::io::stdin()))
            .await
    };
    speech.stop();
    result?;

    if quiz.is_complete() && quiz.result_id().is_none() {
        // One more try for a result whose first write failed.
        let id = quizzes.finalize_result(&mut quiz).await?;
        println!("Saved as result {id}.");
    }
    Ok(())
}

async fn run_import(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_services(&args.db_url).await?;
    let text = tokio::fs::read_to_string(&args.file).await?;
    let (id, count) = app.word_lists().import_text(&args.name, &text).await?;
    println!("Imported {count} entries into '{}' (list {id}).", args.name.trim());
    Ok(())
}

async fn run_lists(args: ListsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_services(&args.db_url).await?;
    match &args.action {
        ListsAction::All => {}
        ListsAction::Show(name) => {
            let entries = app.word_lists().load(name).await?;
            println!("{}", format_word_list(&entries));
            return Ok(());
        }
        ListsAction::Delete(name) => {
            app.word_lists().delete(name).await?;
            println!("Deleted '{}'.", name.trim());
            return Ok(());
        }
    }

    let lists = app.word_lists().list().await?;
    if lists.is_empty() {
        println!("No word lists yet. Use `app import <name> <file>`.");
    }
    for list in lists {
        println!(
            "{:<24} {:>4} entries  updated {}",
            list.name,
            list.entry_count,
            list.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn run_history(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_services(&args.db_url).await?;
    let items = app.history().list_recent(args.limit).await?;
    if items.is_empty() {
        println!("No quizzes taken yet.");
    }
    for item in items {
        println!(
            "#{:<5} {}  {:<10} {}/{} ({}%) - {}",
            item.id.to_string(),
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.mode,
            item.score,
            item.total,
            item.percentage,
            item.tier.label()
        );
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
