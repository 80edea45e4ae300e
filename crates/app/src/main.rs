use std::fmt;
use std::sync::Arc;

use quiz_core::model::{QuizSettings, Subject, UsedQuestionScope};
use services::{
    AppServices, BuiltinQuestionSource, Clock, EmojiSet, JsonQuestionSource, QuestionSource,
};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

mod play;
mod versus;

const DEFAULT_HISTORY_LIMIT: u32 = 10;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSubject { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidScope { raw: String },
    InvalidEmojiSet { raw: String },
    PlayerCount { count: usize },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSubject { raw } => write!(f, "invalid --subject value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidScope { raw } => write!(f, "invalid QUIZ_USED_SCOPE value: {raw}"),
            ArgsError::InvalidEmojiSet { raw } => write!(f, "invalid --set value: {raw}"),
            ArgsError::PlayerCount { count } => {
                write!(f, "--players takes 2 to 4 names, got {count}")
            }
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

fn parse_number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play     [--subject <s>] [--db <sqlite_url>] [--seed <n>]");
    eprintln!("  cargo run -p app -- profiles [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- history  [--db <sqlite_url>] [--limit <n>]");
    eprintln!("  cargo run -p app -- match    --players <a,b[,c,d]> [--subject <s>] [--db <sqlite_url>] [--seed <n>]");
    eprintln!("  cargo run -p app -- memory   [--players <a,b[,c,d]>] [--cards <n>] [--set <name>] [--db <sqlite_url>] [--seed <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --subject math");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --limit {DEFAULT_HISTORY_LIMIT}");
    eprintln!("  --set mixed");
    eprintln!("  --cards follows the memory level solo, 16 for a group");
    eprintln!();
    eprintln!("Subjects: grammar, math, spelling");
    eprintln!("Card sets: fruits, animals, vehicles, nature, sports, food, mixed");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_USED_SCOPE (session|global), QUIZ_CONTENT_PACK, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Profiles,
    History,
    Match,
    Memory,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "profiles" => Some(Self::Profiles),
            "history" => Some(Self::History),
            "match" => Some(Self::Match),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    subject: Subject,
    seed: Option<u64>,
    limit: u32,
    players: Vec<String>,
    cards: Option<usize>,
    emoji_set: EmojiSet,
}

/// Comma-separated player names, blanks dropped.
fn parse_players(raw: &str) -> Result<Vec<String>, ArgsError> {
    let names: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect();
    if !(2..=4).contains(&names.len()) {
        return Err(ArgsError::PlayerCount { count: names.len() });
    }
    Ok(names)
}

impl Args {
    fn defaults() -> Self {
        let db_url = normalize_sqlite_url(
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "quiz.sqlite3".to_owned()),
        );
        Self {
            db_url,
            subject: Subject::Math,
            seed: None,
            limit: DEFAULT_HISTORY_LIMIT,
            players: Vec::new(),
            cards: None,
            emoji_set: EmojiSet::default(),
        }
    }

    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::defaults();

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                (Command::Play | Command::Match, "--subject") => {
                    let value = require_value(args, "--subject")?;
                    let subject: Subject = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSubject { raw: value.clone() })?;
                    if !subject.has_question_content() {
                        return Err(ArgsError::InvalidSubject { raw: value });
                    }
                    parsed.subject = subject;
                }
                (Command::Play | Command::Match | Command::Memory, "--seed") => {
                    parsed.seed = Some(parse_number(args, "--seed")?);
                }
                (Command::Match | Command::Memory, "--players") => {
                    parsed.players = parse_players(&require_value(args, "--players")?)?;
                }
                (Command::Memory, "--cards") => parsed.cards = Some(parse_number(args, "--cards")?),
                (Command::Memory, "--set") => {
                    let value = require_value(args, "--set")?;
                    parsed.emoji_set = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidEmojiSet { raw: value })?;
                }
                (Command::History, "--limit") => parsed.limit = parse_number(args, "--limit")?,
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if cmd == Command::Match && parsed.players.is_empty() {
            return Err(ArgsError::MissingValue { flag: "--players" });
        }
        Ok(parsed)
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

fn settings_from_env() -> Result<QuizSettings, ArgsError> {
    let settings = QuizSettings::default();
    match std::env::var("QUIZ_USED_SCOPE") {
        Ok(raw) => {
            let scope: UsedQuestionScope = raw
                .parse()
                .map_err(|_| ArgsError::InvalidScope { raw: raw.clone() })?;
            Ok(settings.with_used_scope(scope))
        }
        Err(_) => Ok(settings),
    }
}

fn question_source(seed: Option<u64>) -> Result<Arc<dyn QuestionSource>, Box<dyn std::error::Error>> {
    if let Ok(path) = std::env::var("QUIZ_CONTENT_PACK") {
        let pack = JsonQuestionSource::from_path(&path)?;
        info!(path = %path, questions = pack.question_count(), "loaded content pack");
        return Ok(Arc::new(pack));
    }
    Ok(match seed {
        Some(seed) => Arc::new(BuiltinQuestionSource::seeded(seed)),
        None => Arc::new(BuiltinQuestionSource::new()),
    })
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("services=info,app=info")),
        )
        .with(log_fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Without a subcommand, start a quiz.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
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
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = settings_from_env()?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::default_clock(),
        settings,
        question_source(parsed.seed)?,
    )
    .await?;

    match cmd {
        Command::Play => play::run_quiz(&services, parsed.subject, parsed.seed).await,
        Command::Profiles => play::print_profiles(&services).await,
        Command::History => play::print_history(&services, parsed.limit).await,
        Command::Match => {
            versus::run_match(&services, parsed.subject, &parsed.players, parsed.seed).await
        }
        Command::Memory => {
            versus::run_memory(
                &services,
                &parsed.players,
                parsed.cards,
                parsed.emoji_set,
                parsed.seed,
            )
            .await
        }
    }
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

    fn parse(cmd: Command, raw: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = raw.iter().map(|s| (*s).to_owned());
        Args::parse(cmd, &mut iter)
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db"
        );
        assert_eq!(normalize_sqlite_url("sqlite:/tmp/q.db".into()), "sqlite:///tmp/q.db");
        assert!(normalize_sqlite_url("quiz.db".into()).starts_with("sqlite:///"));
    }

    #[test]
    fn play_flags_parse() {
        let args = parse(
            Command::Play,
            &["--subject", "Spelling", "--seed", "7", "--db", "sqlite:/tmp/x.db"],
        )
        .unwrap();
        assert_eq!(args.subject, Subject::Spelling);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.db_url, "sqlite:///tmp/x.db");
    }

    #[test]
    fn flags_are_scoped_to_their_command() {
        assert!(matches!(
            parse(Command::Profiles, &["--limit", "3"]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert_eq!(parse(Command::History, &["--limit", "3"]).unwrap().limit, 3);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse(Command::Play, &["--subject", "memory"]),
            Err(ArgsError::InvalidSubject { .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--seed", "abc"]),
            Err(ArgsError::InvalidNumber { flag: "--seed", .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
    }

    #[test]
    fn match_needs_two_to_four_players() {
        let args = parse(Command::Match, &["--players", "Ada, Bo ,", "--subject", "grammar"]).unwrap();
        assert_eq!(args.players, ["Ada", "Bo"]);
        assert_eq!(args.subject, Subject::Grammar);

        assert!(matches!(
            parse(Command::Match, &[]),
            Err(ArgsError::MissingValue { flag: "--players" })
        ));
        assert!(matches!(
            parse(Command::Match, &["--players", "Solo"]),
            Err(ArgsError::PlayerCount { count: 1 })
        ));
        assert!(matches!(
            parse(Command::Match, &["--players", "a,b,c,d,e"]),
            Err(ArgsError::PlayerCount { count: 5 })
        ));
    }

    #[test]
    fn memory_flags_parse() {
        let args = parse(Command::Memory, &["--cards", "24", "--set", "Animals", "--seed", "5"]).unwrap();
        assert_eq!(args.cards, Some(24));
        assert_eq!(args.emoji_set, EmojiSet::Animals);
        assert!(args.players.is_empty());

        assert_eq!(parse(Command::Memory, &[]).unwrap().emoji_set, EmojiSet::Mixed);
        assert!(matches!(
            parse(Command::Memory, &["--set", "planets"]),
            Err(ArgsError::InvalidEmojiSet { .. })
        ));
        assert!(matches!(
            parse(Command::Memory, &["--subject", "math"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }
}
