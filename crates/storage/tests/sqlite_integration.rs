use chrono::Duration;
use quiz_core::model::{
    QuizMode, QuizResult, QuizSession, ResultId, Tier, UserAnswer, parse_word_list,
};
use quiz_core::time::fixed_now;
use storage::repository::{QuizResultRepository, Storage, StorageError, WordListRepository};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn finished_result(minutes: i64) -> QuizResult {
    let at = fixed_now() + Duration::minutes(minutes);
    let words = parse_word_list("hello : xin chào\nworld : thế giới").unwrap();
    let mut session = QuizSession::start(words, QuizMode::Vocabulary, at).unwrap();

    let first = session.current_entry().unwrap().word().to_owned();
    session.submit_answer(&first).unwrap();
    session.advance(at).unwrap();
    session.reveal_answer().unwrap();
    session.advance(at).unwrap();
    session.result().unwrap()
}

#[tokio::test]
async fn sqlite_word_lists_keep_order_and_replace_by_name() {
    let repo = connect("memdb_word_lists").await;
    let words = parse_word_list("one : một\ntwo : hai\nthree : ba").unwrap();

    let id = repo
        .save_word_list("numbers", &words, fixed_now())
        .await
        .unwrap();
    let fetched = repo.get_word_list("numbers").await.unwrap().unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.entries, words);
    assert_eq!(fetched.updated_at, fixed_now());

    let replacement = parse_word_list("four : bốn").unwrap();
    let later = fixed_now() + Duration::days(1);
    let same_id = repo
        .save_word_list("numbers", &replacement, later)
        .await
        .unwrap();
    assert_eq!(same_id, id);

    let lists = repo.list_word_lists().await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].entry_count, 1);
    assert_eq!(lists[0].updated_at, later);

    repo.delete_word_list("numbers").await.unwrap();
    assert!(repo.get_word_list("numbers").await.unwrap().is_none());
    assert!(matches!(
        repo.delete_word_list("numbers").await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_results_roundtrip_answers_and_summary() {
    let repo = connect("memdb_results").await;
    let result = finished_result(0);

    let id = repo.append_result(&result).await.unwrap();
    let fetched = repo.get_result(id).await.unwrap();

    assert_eq!(fetched, result);
    assert_eq!(fetched.summary().percentage(), 50);
    assert_eq!(fetched.summary().tier(), Tier::Fair);
    assert_eq!(fetched.answers()[1].user_answer, UserAnswer::Revealed);

    assert!(matches!(
        repo.get_result(ResultId::new(404)).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_lists_newest_results_first() {
    let storage = Storage::sqlite("sqlite:file:memdb_history?mode=memory&cache=shared")
        .await
        .expect("storage");

    let older = storage.results.append_result(&finished_result(0)).await.unwrap();
    let newer = storage.results.append_result(&finished_result(30)).await.unwrap();

    let rows = storage.results.list_results(10).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![newer, older]);
    assert_eq!(storage.results.list_results(1).await.unwrap().len(), 1);
}
