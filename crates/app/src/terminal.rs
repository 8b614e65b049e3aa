use std::io::Write;

use quiz_core::model::{SessionConfig, SessionPhase, SessionState};
use services::{QuestionKey, QuizLoopService, SessionError, SessionProgress, SubmitNotice};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// What a line of input means in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Choose(usize),
    Retake,
    Quit,
    Unknown,
}

fn parse_input(line: &str, phase: SessionPhase) -> Input {
    let line = line.trim();
    if matches!(line, "q" | "quit") {
        return Input::Quit;
    }
    match phase {
        SessionPhase::Completed => match line {
            "r" | "y" | "yes" | "retake" => Input::Retake,
            "n" | "no" => Input::Quit,
            _ => Input::Unknown,
        },
        SessionPhase::Active => line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map_or(Input::Unknown, Input::Choose),
        SessionPhase::Loading => Input::Unknown,
    }
}

/// Tracks what has already been printed so ticks only redraw the timer.
#[derive(Debug, Default)]
struct Screen {
    /// Last question printed; answers are tied to it.
    question: Option<QuestionKey>,
    summary: Option<u32>,
}

impl Screen {
    fn render(&mut self, state: &SessionState) {
        match state.phase {
            SessionPhase::Loading => {}
            SessionPhase::Active => {
                let key = QuestionKey::of(state);
                if self.question != key {
                    self.question = key;
                    if let Some(question) = &state.current_question {
                        let progress = SessionProgress::from(state);
                        println!();
                        println!(
                            "Question {}/{} [{:>3.0}%]: {}",
                            progress.position(),
                            progress.total,
                            progress.fraction() * 100.0,
                            question.prompt()
                        );
                        for (i, option) in question.options().iter().enumerate() {
                            println!("  {}. {option}", i + 1);
                        }
                    }
                }
                print!("\r  {:>3}s left > ", state.remaining_seconds);
                let _ = std::io::stdout().flush();
            }
            SessionPhase::Completed => {
                self.question = None;
                if self.summary == Some(state.attempt) {
                    return;
                }
                self.summary = Some(state.attempt);
                let verdict = if state.passed() {
                    "passed"
                } else {
                    "not passed"
                };
                println!();
                println!(
                    "Finished: {}/{} ({:.1}%, {verdict}) in {}s",
                    state.score,
                    state.total,
                    state.percentage(),
                    state.elapsed_seconds
                );
                println!("Retake? [y/N]");
            }
        }
    }
}

fn report(notice: &SubmitNotice) {
    match &notice.outcome {
        Ok(receipt) => println!("Result saved to leaderboard as {}", receipt.id),
        Err(err) => println!("Could not save result: {err}"),
    }
}

/// Run one interactive session on stdin/stdout until the player quits.
pub async fn play(
    service: &QuizLoopService,
    config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner = service.start_session(config).await?;
    let mut notices = runner
        .take_notices()
        .ok_or("submission notices already taken")?;
    let mut states = runner.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut screen = Screen::default();

    println!("Answer by typing the option number; q quits.");
    screen.render(&states.borrow_and_update());

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                screen.render(&state);
            }
            Some(notice) = notices.recv() => report(&notice),
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let phase = runner.state().phase;
                match parse_input(&line, phase) {
                    Input::Quit => break,
                    Input::Choose(option) => {
                        // Answers are bound to the question on screen, not the live one.
                        let outcome = screen.question.map(|shown| runner.answer(shown, option));
                        match outcome {
                            Some(Ok(_)) => {}
                            Some(Err(SessionError::InvalidOption { .. })) => {
                                println!("No such option.");
                            }
                            Some(Err(SessionError::QuestionChanged)) | None => {
                                println!("Time ran out on that question.");
                            }
                            Some(Err(err)) => debug!(error = %err, "answer ignored"),
                        }
                    }
                    Input::Retake => {
                        runner.restart()?;
                    }
                    Input::Unknown => println!("?"),
                }
            }
        }
    }

    runner.shutdown();
    // Report a write that finished while the player was leaving.
    while let Ok(notice) = notices.try_recv() {
        report(&notice);
    }
    Ok(())
}
