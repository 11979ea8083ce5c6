use std::fmt;
use std::path::{Path, PathBuf};

use quiz_core::Clock;
use quiz_core::model::QuizMode;
use quiz_core::validation::parse_and_validate;
use quiz_core::validation::Validation;
use services::{
    AdvanceOutcome, AnswerLog, AnswerOutcome, AppServices, InputDraftService, RunnerEvent,
    SessionInput, SessionRunner, TickOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod render;

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_COUNT: usize = 5;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMode { raw: String },
    InvalidCount { raw: String },
    InvalidDbUrl { raw: String },
    MissingSource,
    ConflictingSource,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (expected learning or test)")
            }
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingSource => write!(f, "one of --file or --last is required"),
            ArgsError::ConflictingSource => write!(f, "--file and --last cannot be combined"),
        }
    }
}

impl std::error::Error for ArgsError {}

/// Failures that are reported to the user rather than crashing.
#[derive(Debug)]
enum QuizError {
    InvalidJson(serde_json::Error),
    InvalidQuestions { issues: usize },
    NoSavedInput,
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::InvalidJson(err) => write!(f, "input is not valid JSON: {err}"),
            QuizError::InvalidQuestions { issues } => {
                write!(f, "input rejected with {issues} problem(s)")
            }
            QuizError::NoSavedInput => write!(f, "no saved input yet; run with --file first"),
        }
    }
}

impl std::error::Error for QuizError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz validate --file <path> [--write-fixed <path>] [--report <path>]");
    eprintln!("  quiz run (--file <path> | --last) [--mode learning|test] [--count <n>] [--db <sqlite_url>] [--report <path>]");
    eprintln!("  quiz history [--db <sqlite_url>]");
    eprintln!("  quiz prompt");
    eprintln!();
    eprintln!("--report writes a fix request when the input is rejected, or the results after a run.");
    eprintln!();
    eprintln!("Defaults for run:");
    eprintln!("  --mode learning");
    eprintln!("  --count {DEFAULT_COUNT}");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_MODE, QUIZ_COUNT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Validate,
    Run,
    History,
    Prompt,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "validate" => Some(Self::Validate),
            "run" => Some(Self::Run),
            "history" => Some(Self::History),
            "prompt" => Some(Self::Prompt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    File(PathBuf),
    Last,
}

#[derive(Debug)]
struct ValidateArgs {
    file: PathBuf,
    write_fixed: Option<PathBuf>,
    report: Option<PathBuf>,
}

#[derive(Debug)]
struct RunArgs {
    source: Source,
    mode: QuizMode,
    count: usize,
    db_url: String,
    report: Option<PathBuf>,
}

fn default_db_url() -> String {
    std::env::var("QUIZ_DB_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url)
}

fn parse_db_flag(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
}

impl ValidateArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut file = None;
        let mut write_fixed = None;
        let mut report = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => file = Some(PathBuf::from(require_value(args, "--file")?)),
                "--write-fixed" => {
                    write_fixed = Some(PathBuf::from(require_value(args, "--write-fixed")?));
                }
                "--report" => report = Some(PathBuf::from(require_value(args, "--report")?)),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let file = file.ok_or(ArgsError::MissingSource)?;
        Ok(Self {
            file,
            write_fixed,
            report,
        })
    }
}

impl RunArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url();
        let mut mode = std::env::var("QUIZ_MODE")
            .ok()
            .and_then(|value| value.parse::<QuizMode>().ok())
            .unwrap_or_default();
        let mut count = std::env::var("QUIZ_COUNT")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_COUNT);
        let mut source = None;
        let mut report = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => {
                    let path = PathBuf::from(require_value(args, "--file")?);
                    if source.replace(Source::File(path)).is_some() {
                        return Err(ArgsError::ConflictingSource);
                    }
                }
                "--last" => {
                    if source.replace(Source::Last).is_some() {
                        return Err(ArgsError::ConflictingSource);
                    }
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    count = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                }
                "--db" => db_url = parse_db_flag(args)?,
                "--report" => report = Some(PathBuf::from(require_value(args, "--report")?)),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let source = source.ok_or(ArgsError::MissingSource)?;
        Ok(Self {
            source,
            mode,
            count,
            db_url,
            report,
        })
    }
}

fn parse_history_args(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let mut db_url = default_db_url();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_url = parse_db_flag(args)?,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(db_url)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

async fn open_services(db_url: &str) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    Ok(AppServices::new_sqlite(db_url, Clock::system()).await?)
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

async fn validate(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let validation = parse_and_validate(&text).map_err(QuizError::InvalidJson)?;

    if let Some(path) = &args.write_fixed {
        tokio::fs::write(path, validation.normalized_pretty()?).await?;
        println!("Normalized input written to {}", path.display());
    }

    if !validation.is_valid() {
        print!("{}", render::issues(validation.issues()));
        if let Some(path) = &args.report {
            let request = render::fix_request(&validation.normalized_pretty()?, validation.issues());
            tokio::fs::write(path, request).await?;
            println!("Fix request written to {}", path.display());
        }
        return Err(QuizError::InvalidQuestions {
            issues: validation.issues().len(),
        }
        .into());
    }

    println!("{} question(s) are valid.", validation.questions().len());
    Ok(())
}

async fn history(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(db_url).await?;
    let history = services.history().load().await?;
    if history.is_empty() {
        println!("No questions served yet.");
        return Ok(());
    }
    for (i, id) in history.ids().iter().enumerate() {
        println!("{:>3}. {id}", i + 1);
    }
    Ok(())
}

async fn run_quiz(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(&args.db_url).await?;
    let drafts = services.drafts();

    let text = match &args.source {
        Source::File(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            drafts.remember(&text).await?;
            text
        }
        Source::Last => drafts.last_input().await?.ok_or(QuizError::NoSavedInput)?,
    };

    let validation = accept_input(&drafts, &text).await?;
    let repaired = validation.normalized_pretty()?;
    let questions = match validation.into_result() {
        Ok(questions) => questions,
        Err(issues) => {
            print!("{}", render::issues(&issues));
            println!("The repaired input is now the saved draft (quiz run --last).");
            if let Some(path) = &args.report {
                tokio::fs::write(path, render::fix_request(&repaired, &issues)).await?;
                println!("Fix request written to {}", path.display());
            }
            return Err(QuizError::InvalidQuestions {
                issues: issues.len(),
            }
            .into());
        }
    };

    let session = services
        .session_loop()
        .start_session(&questions, args.mode, args.count)
        .await?;
    println!(
        "Starting a {} session with {} question(s).",
        args.mode,
        session.questions().len()
    );

    drive(SessionRunner::new(session), args.report.as_deref()).await
}

/// Validate `text`. A rejected batch replaces the saved draft with its
/// repaired copy, so generated ids and defaulted flags survive to `--last`.
async fn accept_input(
    drafts: &InputDraftService,
    text: &str,
) -> Result<Validation, Box<dyn std::error::Error>> {
    let validation = parse_and_validate(text).map_err(QuizError::InvalidJson)?;
    if !validation.is_valid() {
        drafts.remember(&validation.normalized_pretty()?).await?;
        tracing::info!(issues = validation.issues().len(), "input rejected, repaired draft saved");
    }
    Ok(validation)
}

/// Feed stdin lines and countdown ticks into the runner until the session ends.
async fn drive(
    mut runner: SessionRunner,
    report_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print!("{}", render::question(runner.session()));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    runner.quit();
                    return Ok(());
                };
                let Some(input) = SessionInput::from_key(&line) else {
                    println!("Unknown key: {}", line.trim());
                    continue;
                };
                match runner.handle_input(input) {
                    RunnerEvent::Quit => {
                        tracing::info!("session discarded by user");
                        runner.quit();
                        println!("Session discarded.");
                        return Ok(());
                    }
                    RunnerEvent::Answer(AnswerOutcome::Recorded { .. }) => {
                        match runner.session().feedback() {
                            Some(review) => print!("{}", render::feedback(&review)),
                            None => println!("Answer recorded. Press Enter to continue."),
                        }
                    }
                    RunnerEvent::Answer(AnswerOutcome::Locked) => {
                        println!("This question is already answered.");
                    }
                    RunnerEvent::Answer(AnswerOutcome::OutOfRange) => println!("No such choice."),
                    RunnerEvent::Answer(AnswerOutcome::Ignored) => {}
                    RunnerEvent::Advance(AdvanceOutcome::Ignored) => {
                        println!("Choose an answer first.");
                    }
                    RunnerEvent::Advance(AdvanceOutcome::Moved { .. }) => {
                        print!("{}", render::question(runner.session()));
                    }
                    RunnerEvent::Advance(AdvanceOutcome::Finished(log)) => {
                        return report(&log, report_path).await;
                    }
                }
            }
            outcome = runner.next_tick() => match outcome {
                TickOutcome::Counting { remaining } if remaining <= 5 || remaining % 10 == 0 => {
                    println!("  {remaining}s left");
                }
                TickOutcome::TimedOut { advance, .. } => {
                    println!("Time is up.");
                    match advance {
                        AdvanceOutcome::Finished(log) => return report(&log, report_path).await,
                        _ => print!("{}", render::question(runner.session())),
                    }
                }
                _ => {}
            },
        }
    }
}

async fn report(log: &AnswerLog, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let summary = log.summary()?;
    let reviews = log.review();
    print!("{}", render::summary(&summary, &reviews));
    if let Some(path) = path {
        tokio::fs::write(path, render::results_report(&summary, &reviews)).await?;
        println!("Results written to {}", path.display());
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut iter = argv.into_iter();

    let cmd = match iter.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let report_usage = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    match cmd {
        Command::Validate => validate(ValidateArgs::parse(&mut iter).map_err(report_usage)?).await,
        Command::Run => run_quiz(RunArgs::parse(&mut iter).map_err(report_usage)?).await,
        Command::History => history(&parse_history_args(&mut iter).map_err(report_usage)?).await,
        Command::Prompt => {
            if let Some(arg) = iter.next() {
                return Err(report_usage(ArgsError::UnknownArg(arg)).into());
            }
            print!("{}", render::SCHEMA_PROMPT);
            println!();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        tracing::debug!(error = %err, "quiz exited with an error");
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> std::vec::IntoIter<String> {
        list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn run_args_read_flags() {
        let parsed = RunArgs::parse(&mut args(&[
            "--file", "q.json", "--mode", "test", "--count", "3", "--db", "sqlite::memory:",
        ]))
        .unwrap();
        assert_eq!(parsed.source, Source::File(PathBuf::from("q.json")));
        assert_eq!(parsed.mode, QuizMode::Test);
        assert_eq!(parsed.count, 3);
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }

    #[test]
    fn run_args_need_exactly_one_source() {
        assert!(matches!(
            RunArgs::parse(&mut args(&["--mode", "test"])),
            Err(ArgsError::MissingSource)
        ));
        assert!(matches!(
            RunArgs::parse(&mut args(&["--file", "a.json", "--last"])),
            Err(ArgsError::ConflictingSource)
        ));
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            RunArgs::parse(&mut args(&["--last", "--mode", "exam"])),
            Err(ArgsError::InvalidMode { .. })
        ));
        assert!(matches!(
            RunArgs::parse(&mut args(&["--last", "--count", "-1"])),
            Err(ArgsError::InvalidCount { .. })
        ));
        assert!(matches!(
            ValidateArgs::parse(&mut args(&["--file"])),
            Err(ArgsError::MissingValue { flag: "--file" })
        ));
    }

    #[test]
    fn report_flag_is_accepted_by_validate_and_run() {
        let parsed = ValidateArgs::parse(&mut args(&["--file", "q.json", "--report", "fix.txt"]))
            .unwrap();
        assert_eq!(parsed.report, Some(PathBuf::from("fix.txt")));

        let parsed = RunArgs::parse(&mut args(&["--last", "--report", "out.txt"])).unwrap();
        assert_eq!(parsed.report, Some(PathBuf::from("out.txt")));
        assert_eq!(Command::from_arg("prompt"), Some(Command::Prompt));
    }

    #[tokio::test]
    async fn rejected_input_leaves_repaired_draft() {
        let services = AppServices::in_memory(Clock::system());
        let drafts = services.drafts();
        let raw = r#"[{"question": "No id?", "choices": [{"text": "a"}]}]"#;
        drafts.remember(raw).await.unwrap();

        let validation = accept_input(&drafts, raw).await.unwrap();
        assert!(!validation.is_valid());

        let draft = drafts.last_input().await.unwrap().unwrap();
        let repaired: serde_json::Value = serde_json::from_str(&draft).unwrap();
        assert!(repaired[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(repaired[0]["choices"][0]["is_correct"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn accepted_input_keeps_draft_as_typed() {
        let services = AppServices::in_memory(Clock::system());
        let drafts = services.drafts();
        let raw = r#"[{"question": "Ok?", "choices": [{"text": "a", "is_correct": true}]}]"#;
        drafts.remember(raw).await.unwrap();

        let validation = accept_input(&drafts, raw).await.unwrap();
        assert!(validation.is_valid());
        assert_eq!(drafts.last_input().await.unwrap().as_deref(), Some(raw));
    }

    #[test]
    fn relative_db_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
