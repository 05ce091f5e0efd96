use super::*;
use crate::config::RetrievalConfig;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{ContentKind, NewKnowledgeItem};
use crate::database::sqlite::queries::KnowledgeItemQueries;
use crate::knowledge::KnowledgeBase;

async fn test_service() -> (tempfile::TempDir, ChatService) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let database = Database::new(dir.path().join("test.db"))
        .await
        .expect("Failed to create database");

    let responder = ChatResponder::new(
        KnowledgeBase::new(database),
        None,
        RetrievalConfig::default(),
    );
    (dir, ChatService::new(responder))
}

async fn seed_item(service: &ChatService, kind: ContentKind, content_id: i64, title: &str, content: &str) {
    let mut conn = service
        .responder
        .database()
        .pool()
        .acquire()
        .await
        .expect("Failed to acquire connection");
    KnowledgeItemQueries::insert(
        &mut conn,
        &NewKnowledgeItem {
            content_type: kind,
            content_id,
            title: title.to_string(),
            content: content.to_string(),
        },
    )
    .await
    .expect("Failed to insert knowledge item");
}

#[tokio::test]
async fn ask_rejects_blank_question() {
    let (_dir, service) = test_service().await;

    let error = service
        .ask("   ", Some("session-1"))
        .await
        .expect_err("blank question must fail");
    assert!(matches!(error, crate::FolioError::Validation { .. }));

    let history = service
        .history("session-1", DEFAULT_HISTORY_LIMIT)
        .await
        .expect("history should succeed");
    assert!(history.is_empty(), "nothing may be persisted on validation failure");
}

#[tokio::test]
async fn ask_without_provider_persists_fallback_answer() {
    let (_dir, service) = test_service().await;
    seed_item(
        &service,
        ContentKind::CvEntry,
        1,
        "Work Experience: Senior Engineer at Acme",
        "Led the platform team and built distributed systems in Rust.",
    )
    .await;

    let message = service
        .ask("Tell me about their experience", Some("session-1"))
        .await
        .expect("ask should succeed");

    assert_eq!(message.question, "Tell me about their experience");
    let answer = message.answer.expect("answer must be persisted");
    assert!(answer.starts_with("Here's what I found:"));
    assert!(answer.contains("Led the platform team"));
}

#[tokio::test]
async fn ask_without_matches_returns_topic_menu() {
    let (_dir, service) = test_service().await;

    let message = service
        .ask("zzzqqq", Some("session-1"))
        .await
        .expect("ask should succeed");

    let answer = message.answer.expect("answer must be persisted");
    assert!(answer.contains("You can ask about"));
}

#[tokio::test]
async fn history_merges_legacy_rows_oldest_first() {
    let (_dir, service) = test_service().await;

    service
        .ask("first question", None)
        .await
        .expect("legacy ask should succeed");
    service
        .ask("second question", Some("session-a"))
        .await
        .expect("session ask should succeed");
    service
        .ask("other session question", Some("session-b"))
        .await
        .expect("other session ask should succeed");

    let history = service
        .history("session-a", DEFAULT_HISTORY_LIMIT)
        .await
        .expect("history should succeed");

    let questions: Vec<&str> = history.iter().map(|m| m.question.as_str()).collect();
    assert_eq!(questions, vec!["first question", "second question"]);
}
