use std::fmt;

use quiz_core::model::ContentRef;
use services::{AppServices, Clock, ContentAdapter, SessionError};
use tracing_subscriber::EnvFilter;

mod runner;

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_CONTENT: &str = "conference:1";
const HISTORY_LIMIT: u32 = 10;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidContent { raw: String },
    InvalidSeconds { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidContent { raw } => {
                write!(f, "invalid --content value: {raw} (expected <kind>:<id>)")
            }
            ArgsError::InvalidSeconds { raw } => write!(f, "invalid --seconds value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [run]   [--db <sqlite_url>] [--content <kind>:<id>] [--seconds <n>]");
    eprintln!("  quiz overview [--db <sqlite_url>] [--content <kind>:<id>] [--seconds <n>]");
    eprintln!("  quiz history  [--db <sqlite_url>] [--content <kind>:<id>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --content {DEFAULT_CONTENT}");
    eprintln!("  --seconds <per-quiz setting>");
    eprintln!();
    eprintln!("Kinds: webinar, conference, workshop, program, elearning");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_CONTENT, QUIZ_SECONDS, QUIZ_LOG (or RUST_LOG)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Overview,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "overview" => Some(Self::Overview),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    content: ContentRef,
    seconds: Option<i64>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut content = parse_content(
            std::env::var("QUIZ_CONTENT").unwrap_or_else(|_| DEFAULT_CONTENT.into()),
        )?;
        let mut seconds = std::env::var("QUIZ_SECONDS")
            .ok()
            .map(parse_seconds)
            .transpose()?;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content" => content = parse_content(require_value(args, "--content")?)?,
                "--seconds" => seconds = Some(parse_seconds(require_value(args, "--seconds")?)?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            content,
            seconds,
        })
    }
}

fn parse_content(raw: String) -> Result<ContentRef, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidContent { raw })
}

fn parse_seconds(raw: String) -> Result<i64, ArgsError> {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ArgsError::InvalidSeconds { raw }),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("QUIZ_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means "run".
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), parsed.seconds).await?;
    tracing::debug!(db = %parsed.db_url, content = %parsed.content, ?cmd, "services ready");

    match cmd {
        Command::Run => runner::run_quiz(&services, parsed.content).await,
        Command::Overview => show_overview(&services, parsed.content).await,
        Command::History => show_history(&services, parsed.content).await,
    }
}

async fn show_overview(
    services: &AppServices,
    content: ContentRef,
) -> Result<(), Box<dyn std::error::Error>> {
    let adapter = ContentAdapter::new(content);
    println!("{}", adapter.breadcrumb().join(" / "));
    match services.quiz_loop().overview(content).await {
        Ok(overview) => {
            for rule in overview.rules() {
                println!("  - {rule}");
            }
            Ok(())
        }
        Err(SessionError::Unavailable { .. }) => {
            println!("Quiz not available");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn show_history(
    services: &AppServices,
    content: ContentRef,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = services
        .history()
        .list_recent_attempts(content, HISTORY_LIMIT)
        .await?;
    if items.is_empty() {
        println!("No attempts yet for {content}");
        return Ok(());
    }

    println!("Recent attempts for {content}:");
    for item in items {
        println!(
            "  #{:<4} {}  score {}/{}  skipped {}",
            item.id,
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.score,
            item.total,
            item.skipped
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_flag_parses_kind_and_id() {
        let mut args = vec!["--content".to_string(), "workshop:3".to_string()].into_iter();
        let parsed = Args::parse(&mut args).unwrap();
        assert_eq!(parsed.content, ContentRef::workshop(3));
    }

    #[test]
    fn bad_seconds_are_rejected() {
        let mut args = vec!["--seconds".to_string(), "0".to_string()].into_iter();
        assert!(matches!(
            Args::parse(&mut args),
            Err(ArgsError::InvalidSeconds { .. })
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}
