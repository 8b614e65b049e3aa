use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use quiz_core::model::{Question, ResultRecord, SessionConfig, SessionPhase, SessionState};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::error::{SessionError, SubmitFailure};
use super::countdown::{Countdown, TICK_PERIOD};
use super::service::{Advance, QuestionKey, QuestionTicket, QuizSession, Tick};
use super::submitter::{ResultSubmitter, SubmissionReceipt};

/// Outcome of the leaderboard write for one finished attempt.
#[derive(Debug)]
pub struct SubmitNotice {
    pub attempt: u32,
    pub outcome: Result<SubmissionReceipt, SubmitFailure>,
}

struct Live {
    session: QuizSession,
    countdown: Option<Countdown>,
}

struct Context {
    runtime: Handle,
    submitter: ResultSubmitter,
    tick_period: Duration,
    states: watch::Sender<SessionState>,
    notices: mpsc::UnboundedSender<SubmitNotice>,
}

/// One live quiz attempt wired to a countdown and the leaderboard.
///
/// User input and timer ticks go through the same mutex, so a transition is
/// never interleaved with another. Every transition re-syncs the countdown
/// while the lock is still held: the old timer is aborted and its ticket
/// invalidated before the next question becomes visible.
pub struct QuizRunner {
    live: Arc<Mutex<Live>>,
    ctx: Arc<Context>,
    notices: Option<mpsc::UnboundedReceiver<SubmitNotice>>,
}

impl QuizRunner {
    /// Create a runner in `Loading`. Must be called from inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoRuntime` when no runtime is available.
    pub fn new(config: SessionConfig, submitter: ResultSubmitter) -> Result<Self, SessionError> {
        Self::with_tick_period(config, submitter, TICK_PERIOD)
    }

    pub(crate) fn with_tick_period(
        config: SessionConfig,
        submitter: ResultSubmitter,
        tick_period: Duration,
    ) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let session = QuizSession::new(config);
        let (states, _) = watch::channel(session.state());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Ok(Self {
            live: Arc::new(Mutex::new(Live {
                session,
                countdown: None,
            })),
            ctx: Arc::new(Context {
                runtime,
                submitter,
                tick_period,
                states,
                notices: notice_tx,
            }),
            notices: Some(notice_rx),
        })
    }

    /// Load questions and start the first countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotLoading` if questions were already loaded.
    pub fn load(&self, questions: Vec<Question>) -> Result<SessionPhase, SessionError> {
        let mut live = self.lock();
        let phase = live.session.load(questions)?;
        info!(
            subject = %live.session.config().subject(),
            total = live.session.total(),
            "quiz session loaded"
        );
        settle(&mut live, &Arc::downgrade(&self.live), &self.ctx);
        Ok(phase)
    }

    /// Select an option on the current question; `false` if ignored.
    pub fn select_option(&self, index: usize) -> bool {
        let mut live = self.lock();
        let changed = live.session.select_option(index);
        if changed {
            publish(&live, &self.ctx);
        }
        changed
    }

    /// Submit the current selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` or `SessionError::NoSelection` when
    /// there is nothing to advance; state is left unchanged.
    pub fn advance(&self) -> Result<Advance, SessionError> {
        let mut live = self.lock();
        let advance = live.session.advance()?;
        debug!(correct = advance.was_correct(), "question answered");
        settle(&mut live, &Arc::downgrade(&self.live), &self.ctx);
        Ok(advance)
    }

    /// Select `option` and advance in one step, but only while `shown` is
    /// still the live question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionChanged` when `shown` expired or was
    /// answered before this call took the lock, and
    /// `SessionError::InvalidOption` for an out-of-range option. State is left
    /// unchanged in both cases.
    pub fn answer(&self, shown: QuestionKey, option: usize) -> Result<Advance, SessionError> {
        let mut live = self.lock();
        if live.session.question_key() != Some(shown) {
            debug!(?shown, "answer for a question that is no longer live");
            return Err(SessionError::QuestionChanged);
        }
        if !live.session.select_option(option) {
            return Err(SessionError::InvalidOption { index: option });
        }
        let advance = live.session.advance()?;
        debug!(correct = advance.was_correct(), "question answered");
        settle(&mut live, &Arc::downgrade(&self.live), &self.ctx);
        Ok(advance)
    }

    /// Retake the quiz with the same questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` unless the session is completed.
    pub fn restart(&self) -> Result<SessionPhase, SessionError> {
        let mut live = self.lock();
        let phase = live.session.restart()?;
        info!(attempt = live.session.attempt(), "quiz session restarted");
        settle(&mut live, &Arc::downgrade(&self.live), &self.ctx);
        Ok(phase)
    }

    /// Stop the countdown without touching session state.
    pub fn shutdown(&self) {
        let mut live = self.lock();
        if let Some(countdown) = live.countdown.take() {
            countdown.cancel();
            debug!("countdown cancelled by host");
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().session.state()
    }

    #[must_use]
    pub fn result(&self) -> Option<ResultRecord> {
        self.lock().session.result().cloned()
    }

    /// Receiver that sees the state after every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.ctx.states.subscribe()
    }

    /// Submission outcomes. Only the first call returns the receiver.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<SubmitNotice>> {
        self.notices.take()
    }

    fn lock(&self) -> MutexGuard<'_, Live> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for QuizRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for QuizRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizRunner")
            .field("session", &self.lock().session)
            .field("tick_period", &self.ctx.tick_period)
            .finish_non_exhaustive()
    }
}

/// Bring the countdown and leaderboard in line with the session, then publish.
fn settle(live: &mut Live, handle: &Weak<Mutex<Live>>, ctx: &Arc<Context>) {
    let wanted = live.session.ticket();
    let running = live.countdown.as_ref().map(Countdown::ticket);
    if wanted != running {
        if let Some(old) = live.countdown.take() {
            old.cancel();
        }
        live.countdown = wanted.map(|ticket| start_countdown(ticket, handle.clone(), ctx));
    }

    if live.session.is_complete() {
        dispatch_submission(live, ctx);
    }
    publish(live, ctx);
}

fn start_countdown(ticket: QuestionTicket, handle: Weak<Mutex<Live>>, ctx: &Arc<Context>) -> Countdown {
    let tick_ctx = Arc::clone(ctx);
    Countdown::start(&ctx.runtime, ticket, ctx.tick_period, move |ticket| {
        on_tick(&handle, &tick_ctx, ticket)
    })
}

fn on_tick(handle: &Weak<Mutex<Live>>, ctx: &Arc<Context>, ticket: QuestionTicket) -> ControlFlow<()> {
    let Some(shared) = handle.upgrade() else {
        return ControlFlow::Break(());
    };
    let mut live = shared.lock().unwrap_or_else(PoisonError::into_inner);
    match live.session.tick(ticket) {
        Tick::Stale => ControlFlow::Break(()),
        Tick::Counted { remaining } => {
            debug!(index = ticket.index(), remaining, "tick");
            publish(&live, ctx);
            ControlFlow::Continue(())
        }
        Tick::Expired(advance) => {
            info!(
                index = ticket.index(),
                correct = advance.was_correct(),
                "time expired, advancing"
            );
            settle(&mut live, handle, ctx);
            ControlFlow::Break(())
        }
    }
}

fn dispatch_submission(live: &mut Live, ctx: &Arc<Context>) {
    let Some(record) = live.session.claim_submission() else {
        return;
    };
    let attempt = live.session.attempt();
    info!(
        attempt,
        score = record.score(),
        total = record.total(),
        seconds = record.time_taken_seconds(),
        "quiz completed, submitting result"
    );
    let submit_ctx = Arc::clone(ctx);
    ctx.runtime.spawn(async move {
        let outcome = submit_ctx.submitter.submit(&record).await;
        let _ = submit_ctx.notices.send(SubmitNotice { attempt, outcome });
    });
}

fn publish(live: &Live, ctx: &Context) {
    ctx.states.send_replace(live.session.state());
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Subject;
    use quiz_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::repository::{InMemoryRepository, LeaderboardRepository};
    use tokio::time;

    fn question(correct: usize) -> Question {
        Question::new("Q", vec!["a".into(), "b".into(), "c".into()], correct).unwrap()
    }

    fn runner(seconds: u32) -> (QuizRunner, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let submitter = ResultSubmitter::new(fixed_clock(), Arc::new(repo.clone()));
        let config = SessionConfig::new(Subject::new("Math").unwrap())
            .with_per_question_seconds(seconds)
            .unwrap();
        (QuizRunner::new(config, submitter).unwrap(), repo)
    }

    #[test]
    fn new_outside_runtime_fails() {
        let repo = InMemoryRepository::new();
        let submitter = ResultSubmitter::new(fixed_clock(), Arc::new(repo));
        let err = QuizRunner::new(SessionConfig::default(), submitter).unwrap_err();
        assert!(matches!(err, SessionError::NoRuntime));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_count_down_and_publish() {
        let (runner, _repo) = runner(10);
        let rx = runner.subscribe();
        runner.load(vec![question(0), question(1)]).unwrap();

        time::sleep(Duration::from_millis(3_500)).await;
        let state = rx.borrow().clone();
        assert_eq!(state.remaining_seconds, 7);
        assert_eq!(state.elapsed_seconds, 3);
        assert_eq!(state.current_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_advance_restarts_the_timer() {
        let (runner, _repo) = runner(10);
        runner.load(vec![question(0), question(1)]).unwrap();

        time::sleep(Duration::from_millis(4_500)).await;
        runner.select_option(0);
        runner.advance().unwrap();
        assert_eq!(runner.state().remaining_seconds, 10);

        time::sleep(Duration::from_millis(2_200)).await;
        let state = runner.state();
        assert_eq!(state.current_index, 1);
        assert_eq!(state.remaining_seconds, 8);
        assert_eq!(state.elapsed_seconds, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn select_and_advance_in_last_second_advances_once() {
        let (runner, _repo) = runner(2);
        runner.load(vec![question(1), question(0), question(2)]).unwrap();

        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(runner.state().remaining_seconds, 1);
        runner.select_option(1);
        runner.advance().unwrap();

        time::sleep(Duration::from_millis(600)).await;
        let state = runner.state();
        assert_eq!(state.current_index, 1);
        assert_eq!(state.score, 1);
        assert_eq!(state.remaining_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_ticks() {
        let (runner, _repo) = runner(10);
        runner.load(vec![question(0)]).unwrap();
        time::sleep(Duration::from_millis(1_500)).await;
        runner.shutdown();
        time::sleep(Duration::from_secs(30)).await;

        let state = runner.state();
        assert_eq!(state.phase, SessionPhase::Active);
        assert_eq!(state.remaining_seconds, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_quiz_completes_without_submitting() {
        let (mut runner, repo) = runner(10);
        assert_eq!(runner.load(Vec::new()).unwrap(), SessionPhase::Completed);
        let mut notices = runner.take_notices().unwrap();

        time::sleep(Duration::from_secs(1)).await;
        assert!(notices.try_recv().is_err());
        assert!(!runner.state().submitted);
        assert!(repo.list_entries(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_restarts_the_countdown() {
        let (runner, _repo) = runner(10);
        runner.load(vec![question(0)]).unwrap();
        runner.select_option(0);
        runner.advance().unwrap();
        assert_eq!(runner.restart().unwrap(), SessionPhase::Active);

        time::sleep(Duration::from_millis(2_500)).await;
        let state = runner.state();
        assert_eq!(state.attempt, 2);
        assert_eq!(state.remaining_seconds, 8);
        assert_eq!(state.elapsed_seconds, 2);

        time::sleep(Duration::from_secs(9)).await;
        let state = runner.state();
        assert_eq!(state.phase, SessionPhase::Completed);
        assert_eq!(state.attempt, 2);
        assert_eq!(state.elapsed_seconds, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn answer_meant_for_an_expired_question_is_dropped() {
        let (runner, _repo) = runner(2);
        runner.load(vec![question(0), question(0)]).unwrap();
        let shown = QuestionKey::of(&runner.state()).unwrap();

        time::sleep(Duration::from_millis(2_500)).await;
        let err = runner.answer(shown, 0).unwrap_err();
        assert!(matches!(err, SessionError::QuestionChanged));
        let state = runner.state();
        assert_eq!(state.current_index, 1);
        assert_eq!(state.selected_option, None);
        assert_eq!(state.score, 0);

        let shown = QuestionKey::of(&state).unwrap();
        assert!(runner.answer(shown, 0).unwrap().was_correct());
        let state = runner.state();
        assert!(state.is_complete());
        assert_eq!(state.score, 1);
        assert_eq!(QuestionKey::of(&state), None);
    }

    #[tokio::test(start_paused = true)]
    async fn answer_with_unknown_option_leaves_question_live() {
        let (runner, _repo) = runner(10);
        runner.load(vec![question(0), question(1)]).unwrap();
        let shown = QuestionKey::of(&runner.state()).unwrap();

        let err = runner.answer(shown, 7).unwrap_err();
        assert!(matches!(err, SessionError::InvalidOption { index: 7 }));
        let state = runner.state();
        assert_eq!(state.current_index, 0);
        assert_eq!(state.selected_option, None);
        assert_eq!(QuestionKey::of(&state), Some(shown));
    }
}
