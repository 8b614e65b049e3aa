use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{
    LeaderboardEntry, Question, ResultRecord, SessionConfig, SessionPhase, Subject, SubmissionId,
    SubmissionKey,
};
use quiz_core::time::fixed_clock;
use services::{LoadFailure, QuizLoopService, SessionError, SubmitFailure};
use storage::repository::{
    InMemoryRepository, LeaderboardRepository, QuestionRepository, StorageError,
};
use tokio::time;

fn math() -> Subject {
    Subject::new("Math").unwrap()
}

fn question(n: usize, correct: usize) -> Question {
    Question::new(
        format!("Q{n}"),
        vec!["a".into(), "b".into(), "c".into()],
        correct,
    )
    .unwrap()
}

async fn seeded_repo() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.replace_questions(&math(), &[question(1, 0), question(2, 2), question(3, 1)])
        .await
        .unwrap();
    repo
}

fn loop_service(repo: &InMemoryRepository) -> QuizLoopService {
    QuizLoopService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo.clone()))
        .with_shuffle(false)
}

#[tokio::test(start_paused = true)]
async fn full_quiz_submits_once() {
    let repo = seeded_repo().await;
    let svc = loop_service(&repo);
    let mut runner = svc.start_session(SessionConfig::new(math())).await.unwrap();
    let mut notices = runner.take_notices().unwrap();

    for choice in [0, 2, 0] {
        assert!(runner.select_option(choice));
        runner.advance().unwrap();
    }

    let state = runner.state();
    assert_eq!(state.phase, SessionPhase::Completed);
    assert_eq!(state.score, 2);
    assert_eq!(state.total, 3);
    assert!(state.submitted);

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.attempt, 1);
    let receipt = notice.outcome.unwrap();
    assert_eq!(receipt.id.as_str(), "Math-1700000000000");

    let entries = repo.list_entries(None, 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].record.score(), 2);
    assert_eq!(entries[0].record.total(), 3);

    time::sleep(Duration::from_secs(30)).await;
    assert!(notices.try_recv().is_err());
    assert_eq!(repo.list_entries(None, 10).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_question_expires() {
    let repo = seeded_repo().await;
    let svc = loop_service(&repo);
    let runner = svc.start_session(SessionConfig::new(math())).await.unwrap();

    time::sleep(Duration::from_millis(10_500)).await;
    let state = runner.state();
    assert_eq!(state.current_index, 1);
    assert_eq!(state.score, 0);
    assert_eq!(state.remaining_seconds, 10);
    assert_eq!(state.elapsed_seconds, 10);
    assert_eq!(state.selected_option, None);
}

#[tokio::test(start_paused = true)]
async fn restart_submits_each_attempt() {
    let repo = seeded_repo().await;
    let svc = loop_service(&repo).with_submission_key(SubmissionKey::Random);
    let mut runner = svc.start_session(SessionConfig::new(math())).await.unwrap();
    let mut notices = runner.take_notices().unwrap();

    for choice in [0, 2, 1] {
        runner.select_option(choice);
        runner.advance().unwrap();
    }
    let first = notices.recv().await.unwrap();
    assert_eq!(first.attempt, 1);
    assert_eq!(first.outcome.unwrap().record.score(), 3);

    assert_eq!(runner.restart().unwrap(), SessionPhase::Active);
    let state = runner.state();
    assert_eq!(state.attempt, 2);
    assert_eq!(state.current_index, 0);
    assert_eq!(state.score, 0);
    assert_eq!(state.elapsed_seconds, 0);
    assert!(!state.submitted);

    for choice in [1, 1, 1] {
        runner.select_option(choice);
        runner.advance().unwrap();
    }
    let second = notices.recv().await.unwrap();
    assert_eq!(second.attempt, 2);
    assert_eq!(second.outcome.unwrap().record.score(), 1);

    let entries = repo.list_entries(Some(&math()), 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_ne!(entries[0].id, entries[1].id);
}

struct RejectingStore;

#[async_trait]
impl LeaderboardRepository for RejectingStore {
    async fn submit(&self, _id: &SubmissionId, _record: &ResultRecord) -> Result<(), StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn get_entry(&self, _id: &SubmissionId) -> Result<LeaderboardEntry, StorageError> {
        Err(StorageError::NotFound)
    }

    async fn list_entries(
        &self,
        _subject: Option<&Subject>,
        _limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        Ok(Vec::new())
    }
}

#[tokio::test(start_paused = true)]
async fn submit_failure_keeps_results_visible() {
    let repo = seeded_repo().await;
    let svc = QuizLoopService::new(fixed_clock(), Arc::new(repo), Arc::new(RejectingStore))
        .with_shuffle(false);
    let mut runner = svc.start_session(SessionConfig::new(math())).await.unwrap();
    let mut notices = runner.take_notices().unwrap();

    for choice in [0, 0, 1] {
        runner.select_option(choice);
        runner.advance().unwrap();
    }

    let notice = notices.recv().await.unwrap();
    let err = notice.outcome.unwrap_err();
    assert!(matches!(
        err,
        SubmitFailure::Rejected {
            source: StorageError::Connection(_),
            ..
        }
    ));

    let state = runner.state();
    assert_eq!(state.phase, SessionPhase::Completed);
    assert_eq!(state.score, 2);
    assert!(state.submitted);
    assert_eq!(runner.result().unwrap().score(), 2);
}

#[tokio::test]
async fn unknown_subject_fails_to_load() {
    let repo = seeded_repo().await;
    let svc = loop_service(&repo);
    let err = svc
        .start_session(SessionConfig::new(Subject::new("History").unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Load(LoadFailure::Empty { .. })
    ));
}
