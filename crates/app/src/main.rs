mod args;
mod terminal;

use std::sync::Arc;

use args::{Args, Command, prepare_sqlite_file, print_usage};
use quiz_core::model::{SessionConfig, Subject};
use services::{Clock, LeaderboardService, LoadFailure, QuizLoopService, SessionError};
use storage::repository::Storage;
use storage::sample::seed_questions;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Single-line explanation for a subject that has no questions.
fn missing_subject_message(subject: &Subject, available: &[Subject]) -> String {
    if available.is_empty() {
        return format!("no questions for {subject}; run `seed` to load the sample bank");
    }
    let names = available
        .iter()
        .map(Subject::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("no questions for {subject}; available subjects: {names}")
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
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

    let parsed = Args::from_env(|key| std::env::var(key).ok())
        .parse_flags(&mut argv.into_iter())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    // Open + migrate SQLite here so the library crates stay storage-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    match cmd {
        Command::Play => {
            let subject = parsed.subject_or_default();
            let config =
                SessionConfig::new(subject.clone()).with_per_question_seconds(parsed.seconds)?;
            let service = QuizLoopService::new(
                Clock::default(),
                Arc::clone(&storage.questions),
                Arc::clone(&storage.leaderboard),
            )
            .with_shuffle(parsed.shuffle)
            .with_submission_key(parsed.key);

            match terminal::play(&service, config).await {
                Err(err)
                    if matches!(
                        err.downcast_ref::<SessionError>(),
                        Some(SessionError::Load(LoadFailure::Empty { .. }))
                    ) =>
                {
                    let available = storage.questions.list_subjects().await?;
                    Err(missing_subject_message(&subject, &available).into())
                }
                other => other,
            }
        }
        Command::Seed => {
            let written =
                seed_questions(storage.questions.as_ref(), parsed.subject.as_ref()).await?;
            println!("Seeded {written} questions into {}", parsed.db_url);
            Ok(())
        }
        Command::Leaderboard => {
            let board = LeaderboardService::new(Arc::clone(&storage.leaderboard));
            let rows = board.top(parsed.subject.as_ref(), parsed.limit).await?;
            if rows.is_empty() {
                println!("No results yet.");
                return Ok(());
            }
            println!(
                "{:>4}  {:<12} {:>7} {:>7} {:>6}  {:<4}  id",
                "rank", "subject", "score", "pct", "time", "pass"
            );
            for row in &rows {
                println!(
                    "{:>4}  {:<12} {:>3}/{:<3} {:>6.1}% {:>5}s  {:<4}  {}",
                    row.rank,
                    row.subject.as_str(),
                    row.score,
                    row.total,
                    row.percentage,
                    row.time_taken_seconds,
                    if row.passed { "yes" } else { "no" },
                    row.id
                );
            }
            let stats = board.profile_stats(parsed.subject.as_ref()).await?;
            println!();
            println!(
                "Quizzes taken: {}  best: {:.1}%  average: {:.1}%  highest score: {}",
                stats.quizzes_taken,
                stats.best_percentage,
                stats.average_percentage,
                stats.highest_score
            );
            Ok(())
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

    fn subject(name: &str) -> Subject {
        Subject::new(name).unwrap()
    }

    #[test]
    fn missing_subject_lists_what_is_available() {
        let message =
            missing_subject_message(&subject("History"), &[subject("General"), subject("Math")]);
        assert_eq!(
            message,
            "no questions for History; available subjects: General, Math"
        );
    }

    #[test]
    fn missing_subject_on_empty_bank_suggests_seeding() {
        let message = missing_subject_message(&subject("General"), &[]);
        assert!(message.contains("run `seed`"));
    }
}
