use std::fmt;

use quiz_core::model::{DEFAULT_PER_QUESTION_SECONDS, Subject, SubmissionKey};

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSubject { raw: String },
    InvalidSeconds { raw: String },
    InvalidKey { raw: String },
    InvalidLimit { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSubject { raw } => write!(f, "invalid --subject value: {raw:?}"),
            ArgsError::InvalidSeconds { raw } => {
                write!(f, "invalid --seconds value: {raw} (expected a positive integer)")
            }
            ArgsError::InvalidKey { raw } => {
                write!(f, "invalid --key value: {raw} (expected subject-time or random)")
            }
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Seed,
    Leaderboard,
}

impl Command {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "seed" => Some(Self::Seed),
            "leaderboard" => Some(Self::Leaderboard),
            _ => None,
        }
    }
}

/// Resolved settings: environment first, flags override.
#[derive(Debug, Clone)]
pub struct Args {
    pub db_url: String,
    pub subject: Option<Subject>,
    pub seconds: u32,
    pub shuffle: bool,
    pub key: SubmissionKey,
    pub limit: u32,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.into(),
            subject: None,
            seconds: DEFAULT_PER_QUESTION_SECONDS,
            shuffle: true,
            key: SubmissionKey::default(),
            limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

impl Args {
    /// Read `QUIZ_*` variables through `lookup`; malformed values keep the default.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            db_url: lookup("QUIZ_DB_URL").map_or(defaults.db_url, normalize_sqlite_url),
            subject: lookup("QUIZ_SUBJECT").and_then(|raw| Subject::new(raw).ok()),
            seconds: lookup("QUIZ_SECONDS")
                .and_then(|raw| raw.parse::<u32>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.seconds),
            shuffle: lookup("QUIZ_SHUFFLE").map_or(defaults.shuffle, |raw| {
                !matches!(raw.trim(), "0" | "false" | "no" | "off")
            }),
            key: lookup("QUIZ_KEY")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.key),
            limit: defaults.limit,
        }
    }

    pub fn parse_flags(
        mut self,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    self.db_url = normalize_sqlite_url(value);
                }
                "--subject" => {
                    let value = require_value(args, "--subject")?;
                    let subject = Subject::new(&value)
                        .map_err(|_| ArgsError::InvalidSubject { raw: value.clone() })?;
                    self.subject = Some(subject);
                }
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    self.seconds = value
                        .parse::<u32>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or(ArgsError::InvalidSeconds { raw: value })?;
                }
                "--no-shuffle" => self.shuffle = false,
                "--key" => {
                    let value = require_value(args, "--key")?;
                    self.key = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidKey { raw: value.clone() })?;
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    self.limit = value
                        .parse::<u32>()
                        .ok()
                        .filter(|limit| *limit > 0)
                        .ok_or(ArgsError::InvalidLimit { raw: value })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(self)
    }

    /// Subject to play or seed; the default one when unset.
    pub fn subject_or_default(&self) -> Subject {
        self.subject.clone().unwrap_or_default()
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play        [options]   # default");
    eprintln!("  cargo run -p app -- seed        [--db <sqlite_url>] [--subject <name>]");
    eprintln!("  cargo run -p app -- leaderboard [--db <sqlite_url>] [--subject <name>] [--limit <n>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>      SQLite database (default: {DEFAULT_DB_URL})");
    eprintln!("  --subject <name>       Quiz subject (default: General)");
    eprintln!("  --seconds <n>          Seconds per question (default: {DEFAULT_PER_QUESTION_SECONDS})");
    eprintln!("  --no-shuffle           Keep the stored question order");
    eprintln!("  --key <kind>           Submission key: subject-time | random");
    eprintln!("  --limit <n>            Leaderboard rows (default: {DEFAULT_LEADERBOARD_LIMIT})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_SUBJECT, QUIZ_SECONDS, QUIZ_SHUFFLE, QUIZ_KEY, RUST_LOG");
}

pub fn normalize_sqlite_url(raw: String) -> String {
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and parent directories) so SQLite can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn flags(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn env_overrides_defaults_and_ignores_garbage() {
        let args = Args::from_env(env(&[
            ("QUIZ_SUBJECT", "Math"),
            ("QUIZ_SECONDS", "0"),
            ("QUIZ_SHUFFLE", "false"),
            ("QUIZ_KEY", "random"),
            ("QUIZ_DB_URL", "sqlite:///tmp/q.sqlite3"),
        ]));
        assert_eq!(args.subject.unwrap().as_str(), "Math");
        assert_eq!(args.seconds, DEFAULT_PER_QUESTION_SECONDS);
        assert!(!args.shuffle);
        assert_eq!(args.key, SubmissionKey::Random);
        assert_eq!(args.db_url, "sqlite:///tmp/q.sqlite3");
    }

    #[test]
    fn flags_override_env() {
        let base = Args::from_env(env(&[("QUIZ_SECONDS", "20")]));
        let args = base
            .parse_flags(&mut flags(&["--seconds", "5", "--no-shuffle", "--limit", "3"]))
            .unwrap();
        assert_eq!(args.seconds, 5);
        assert!(!args.shuffle);
        assert_eq!(args.limit, 3);
        assert_eq!(args.subject_or_default().as_str(), "General");
    }

    #[test]
    fn bad_flags_are_rejected() {
        let err = Args::default()
            .parse_flags(&mut flags(&["--seconds", "0"]))
            .unwrap_err();
        assert!(matches!(err, ArgsError::InvalidSeconds { .. }));

        let err = Args::default()
            .parse_flags(&mut flags(&["--key", "sequential"]))
            .unwrap_err();
        assert!(matches!(err, ArgsError::InvalidKey { .. }));

        let err = Args::default().parse_flags(&mut flags(&["--db"])).unwrap_err();
        assert!(matches!(err, ArgsError::MissingValue { flag: "--db" }));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
