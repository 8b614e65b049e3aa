use quiz_core::model::{Question, ResultRecord, Subject, SubmissionId};
use storage::repository::{LeaderboardRepository, QuestionRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn question(prompt: &str, correct: usize) -> Question {
    Question::new(
        prompt,
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        correct,
    )
    .unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrips_questions_in_order() {
    let repo = connect("memdb_questions").await;
    let science = Subject::new("Science").unwrap();

    repo.replace_questions(&science, &[question("first", 2), question("second", 0)])
        .await
        .unwrap();

    let fetched = repo.fetch_questions(&science).await.unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].prompt(), "first");
    assert_eq!(fetched[0].correct_option(), 2);
    assert_eq!(fetched[1].options().len(), 3);

    repo.replace_questions(&science, &[question("only", 1)])
        .await
        .unwrap();
    let fetched = repo.fetch_questions(&science).await.unwrap();
    assert_eq!(fetched.len(), 1);

    let missing = repo
        .fetch_questions(&Subject::new("History").unwrap())
        .await
        .unwrap();
    assert!(missing.is_empty());
    assert_eq!(repo.list_subjects().await.unwrap(), vec![science]);
}

#[tokio::test]
async fn sqlite_leaderboard_rejects_duplicate_ids_and_ranks() {
    let repo = connect("memdb_leaderboard").await;
    let math = Subject::new("Math").unwrap();

    let first = SubmissionId::new("Math-1");
    repo.submit(&first, &ResultRecord::new(math.clone(), 2, 3, 25))
        .await
        .unwrap();
    let err = repo
        .submit(&first, &ResultRecord::new(math.clone(), 3, 3, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    repo.submit(
        &SubmissionId::new("Math-2"),
        &ResultRecord::new(math.clone(), 3, 3, 40),
    )
    .await
    .unwrap();
    repo.submit(
        &SubmissionId::new("Math-3"),
        &ResultRecord::new(math.clone(), 2, 3, 10),
    )
    .await
    .unwrap();

    let ranked = repo.list_entries(Some(&math), 10).await.unwrap();
    let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["Math-2", "Math-3", "Math-1"]);

    let stored = repo.get_entry(&first).await.unwrap();
    assert_eq!(stored.record.score(), 2);
    assert_eq!(stored.record.time_taken_seconds(), 25);

    let top = repo.list_entries(None, 1).await.unwrap();
    assert_eq!(top.len(), 1);

    let err = repo
        .get_entry(&SubmissionId::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
