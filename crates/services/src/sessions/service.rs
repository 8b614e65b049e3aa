use std::fmt;

use quiz_core::model::{
    Question, ResultRecord, SessionConfig, SessionPhase, SessionState,
};

use crate::error::SessionError;

//
// ─── TICKETS & OUTCOMES ────────────────────────────────────────────────────────
//

/// Identifies one question-start. A countdown carries the ticket it was
/// scheduled against; once the session moves on, the ticket goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTicket {
    epoch: u64,
    index: usize,
}

impl QuestionTicket {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Host-visible identity of a live question: which attempt, which index.
///
/// Hosts capture it when they show a question and hand it back with the
/// answer, so input typed for one question never lands on the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionKey {
    pub attempt: u32,
    pub index: usize,
}

impl QuestionKey {
    /// Key of the question `state` shows; `None` unless a question is live.
    #[must_use]
    pub fn of(state: &SessionState) -> Option<Self> {
        (state.phase == SessionPhase::Active).then_some(Self {
            attempt: state.attempt,
            index: state.current_index,
        })
    }
}

/// Result of resolving the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The next question started.
    Next { correct: bool, ticket: QuestionTicket },
    /// The last question was resolved and the result frozen.
    Completed { correct: bool, record: ResultRecord },
}

impl Advance {
    #[must_use]
    pub fn was_correct(&self) -> bool {
        match self {
            Advance::Next { correct, .. } | Advance::Completed { correct, .. } => *correct,
        }
    }
}

/// Outcome of delivering one countdown tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// The ticket no longer matches the live question; nothing changed.
    Stale,
    Counted { remaining: u32 },
    /// The countdown hit zero and the question was resolved.
    Expired(Advance),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Synchronous quiz state machine: `Loading -> Active -> Completed`.
///
/// Owns the question list and every mutable field of one attempt. It never
/// sleeps or spawns; time enters only through [`QuizSession::tick`].
pub struct QuizSession {
    config: SessionConfig,
    questions: Vec<Question>,
    phase: SessionPhase,
    current: usize,
    selected: Option<usize>,
    remaining_seconds: u32,
    score: u32,
    elapsed_seconds: u32,
    submitted: bool,
    attempt: u32,
    epoch: u64,
    result: Option<ResultRecord>,
}

impl QuizSession {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let remaining_seconds = config.per_question_seconds();
        Self {
            config,
            questions: Vec::new(),
            phase: SessionPhase::Loading,
            current: 0,
            selected: None,
            remaining_seconds,
            score: 0,
            elapsed_seconds: 0,
            submitted: false,
            attempt: 1,
            epoch: 0,
            result: None,
        }
    }

    /// Provide the question list. An empty list completes the session at once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotLoading` if questions were already loaded.
    pub fn load(&mut self, questions: Vec<Question>) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::NotLoading);
        }
        self.questions = questions;
        self.start_attempt();
        Ok(self.phase)
    }

    /// Select an option on the current question. Last call wins.
    ///
    /// Returns `false` and leaves state untouched when the session is not
    /// active or `index` is out of range.
    pub fn select_option(&mut self, index: usize) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        if self.phase != SessionPhase::Active || !question.has_option(index) {
            return false;
        }
        self.selected = Some(index);
        true
    }

    /// Submit the current selection and move on.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active` and
    /// `SessionError::NoSelection` when nothing is selected yet.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(SessionError::NotActive);
        }
        if self.selected.is_none() {
            return Err(SessionError::NoSelection);
        }
        Ok(self.resolve_current())
    }

    /// Deliver one second of countdown for the question `ticket` belongs to.
    ///
    /// Reaching zero resolves the question with whatever is selected; an
    /// empty selection scores nothing but still advances.
    pub fn tick(&mut self, ticket: QuestionTicket) -> Tick {
        if self.ticket() != Some(ticket) {
            return Tick::Stale;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        if self.remaining_seconds > 0 {
            return Tick::Counted {
                remaining: self.remaining_seconds,
            };
        }
        Tick::Expired(self.resolve_current())
    }

    /// Start a fresh attempt over the same questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` unless the session is completed.
    pub fn restart(&mut self) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::Completed {
            return Err(SessionError::NotCompleted);
        }
        self.attempt = self.attempt.saturating_add(1);
        self.start_attempt();
        Ok(self.phase)
    }

    /// Hand out the frozen result exactly once per attempt.
    ///
    /// Flips `submitted` before the caller starts the write, so repeated
    /// calls (re-renders, duplicate triggers) get `None`. Empty quizzes are
    /// never submitted.
    pub fn claim_submission(&mut self) -> Option<ResultRecord> {
        if self.submitted || self.questions.is_empty() {
            return None;
        }
        let record = self.result.clone()?;
        self.submitted = true;
        Some(record)
    }

    /// Ticket for the live question, if any.
    #[must_use]
    pub fn ticket(&self) -> Option<QuestionTicket> {
        (self.phase == SessionPhase::Active).then_some(QuestionTicket {
            epoch: self.epoch,
            index: self.current,
        })
    }

    /// Key of the live question, if any.
    #[must_use]
    pub fn question_key(&self) -> Option<QuestionKey> {
        (self.phase == SessionPhase::Active).then_some(QuestionKey {
            attempt: self.attempt,
            index: self.current,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn submitted(&self) -> bool {
        self.submitted
    }

    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// Frozen result of the finished attempt.
    #[must_use]
    pub fn result(&self) -> Option<&ResultRecord> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase,
            current_index: self.current,
            total: self.questions.len(),
            selected_option: self.selected,
            remaining_seconds: self.remaining_seconds,
            score: self.score,
            elapsed_seconds: self.elapsed_seconds,
            submitted: self.submitted,
            attempt: self.attempt,
            current_question: self.current_question().cloned(),
        }
    }

    fn start_attempt(&mut self) {
        self.current = 0;
        self.score = 0;
        self.elapsed_seconds = 0;
        self.submitted = false;
        self.result = None;
        if self.questions.is_empty() {
            self.complete();
        } else {
            self.start_question();
        }
    }

    fn start_question(&mut self) {
        self.phase = SessionPhase::Active;
        self.selected = None;
        self.remaining_seconds = self.config.per_question_seconds();
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn complete(&mut self) -> ResultRecord {
        self.phase = SessionPhase::Completed;
        self.selected = None;
        self.remaining_seconds = 0;
        self.epoch = self.epoch.wrapping_add(1);
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let record = ResultRecord::new(
            self.config.subject().clone(),
            self.score,
            total,
            self.elapsed_seconds,
        );
        self.result = Some(record.clone());
        record
    }

    fn resolve_current(&mut self) -> Advance {
        let correct = match (self.current_question(), self.selected) {
            (Some(question), Some(selected)) => question.is_correct(selected),
            _ => false,
        };
        if correct {
            self.score = self.score.saturating_add(1);
        }
        self.current += 1;

        if self.current >= self.questions.len() {
            let record = self.complete();
            Advance::Completed { correct, record }
        } else {
            self.start_question();
            Advance::Next {
                correct,
                ticket: QuestionTicket {
                    epoch: self.epoch,
                    index: self.current,
                },
            }
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("subject", self.config.subject())
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("attempt", &self.attempt)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
