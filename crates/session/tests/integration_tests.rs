//! Integration tests for agentdesk-session
//!
//! Covers both InteractionStore implementations plus concurrent use of the
//! file store and the conversation buffer.

use agentdesk_session::{
    ConversationMemory, Interaction, InteractionStore, JsonlInteractionStore,
    MemoryInteractionStore, StoreStats,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

fn stores(dir: &TempDir) -> Vec<Arc<dyn InteractionStore>> {
    vec![
        Arc::new(MemoryInteractionStore::new()),
        Arc::new(JsonlInteractionStore::new(dir.path().join("interactions"))),
    ]
}

// ============================================================================
// Contract tests (run against every store)
// ============================================================================

#[tokio::test]
async fn test_unknown_session_history_is_empty() {
    let dir = TempDir::new().unwrap();
    for store in stores(&dir) {
        assert!(store.history("never-seen").await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_history_is_ordered_without_gaps_or_duplicates() {
    let dir = TempDir::new().unwrap();
    let t1 = Utc::now();
    let t2 = t1 + Duration::seconds(1);
    let t3 = t2 + Duration::seconds(1);

    for store in stores(&dir) {
        store.append(&Interaction::at("s1", "first", "r1", t1)).await.unwrap();
        store.append(&Interaction::at("s1", "second", "r2", t2)).await.unwrap();
        store.append(&Interaction::at("s1", "third", "r3", t3)).await.unwrap();

        let history = store.history("s1").await.unwrap();
        let inputs: Vec<&str> = history.iter().map(|i| i.user_input.as_str()).collect();
        assert_eq!(inputs, vec!["first", "second", "third"]);
        assert_eq!(history[0].created_at, t1);
        assert_eq!(history[2].created_at, t3);
    }
}

#[tokio::test]
async fn test_out_of_order_timestamps_are_sorted() {
    let dir = TempDir::new().unwrap();
    let t = Utc::now();

    for store in stores(&dir) {
        store
            .append(&Interaction::at("s1", "later", "", t + Duration::seconds(5)))
            .await
            .unwrap();
        store.append(&Interaction::at("s1", "earlier", "", t)).await.unwrap();

        let history = store.history("s1").await.unwrap();
        assert_eq!(history[0].user_input, "earlier");
        assert_eq!(history[1].user_input, "later");
    }
}

#[tokio::test]
async fn test_sessions_do_not_mix() {
    let dir = TempDir::new().unwrap();
    for store in stores(&dir) {
        store.append(&Interaction::new("a", "for a", "ra")).await.unwrap();
        store.append(&Interaction::new("b", "for b", "rb")).await.unwrap();

        let a = store.history("a").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].user_input, "for a");

        assert_eq!(
            store.stats().await.unwrap(),
            StoreStats {
                sessions: 2,
                interactions: 2
            }
        );
    }
}

// ============================================================================
// File store specifics
// ============================================================================

#[tokio::test]
async fn test_jsonl_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("interactions");

    {
        let store = JsonlInteractionStore::new(&path);
        store.append(&Interaction::new("cli:demo", "hello", "hi")).await.unwrap();
    }

    let reopened = JsonlInteractionStore::new(&path);
    let history = reopened.history("cli:demo").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].agent_response, "hi");
    assert!(path.join("cli%3Ademo.jsonl").exists());
}

#[tokio::test]
async fn test_jsonl_lookalike_session_ids_use_separate_files() {
    let dir = TempDir::new().unwrap();
    let store = JsonlInteractionStore::new(dir.path());

    store.append(&Interaction::new("a:b", "colon", "")).await.unwrap();
    store.append(&Interaction::new("a_b", "underscore", "")).await.unwrap();
    store.append(&Interaction::new("a/b", "slash", "")).await.unwrap();

    assert!(dir.path().join("a%3Ab.jsonl").exists());
    assert!(dir.path().join("a%5Fb.jsonl").exists());
    assert!(dir.path().join("a%2Fb.jsonl").exists());
    assert!(!dir.path().join("a").exists());

    for (id, input) in [("a:b", "colon"), ("a_b", "underscore"), ("a/b", "slash")] {
        let history = store.history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_input, input);
    }

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.sessions, 3);
    assert_eq!(stats.interactions, 3);
}

#[tokio::test]
async fn test_jsonl_concurrent_appends_to_lookalike_ids_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonlInteractionStore::new(dir.path()));

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        let id = if i % 2 == 0 { "x:y" } else { "x_y" };
        handles.push(tokio::spawn(async move {
            store
                .append(&Interaction::new(id, format!("msg {}", i), ""))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.history("x:y").await.unwrap().len(), 10);
    assert_eq!(store.history("x_y").await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_jsonl_skips_corrupt_lines() {
    let dir = TempDir::new().unwrap();
    let store = JsonlInteractionStore::new(dir.path());
    store.append(&Interaction::new("s1", "good", "")).await.unwrap();

    let file = dir.path().join("s1.jsonl");
    let mut content = tokio::fs::read_to_string(&file).await.unwrap();
    content.push_str("{truncated\n");
    tokio::fs::write(&file, content).await.unwrap();

    let history = store.history("s1").await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_jsonl_stats_on_missing_dir() {
    let dir = TempDir::new().unwrap();
    let store = JsonlInteractionStore::new(dir.path().join("not-created"));
    assert_eq!(store.stats().await.unwrap(), StoreStats::default());
}

#[tokio::test]
async fn test_jsonl_concurrent_appends_same_session() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonlInteractionStore::new(dir.path()));

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .append(&Interaction::new("shared", format!("q{}", i), "r"))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let history = store.history("shared").await.unwrap();
    assert_eq!(history.len(), 20);
    let mut inputs: Vec<String> = history.into_iter().map(|i| i.user_input).collect();
    inputs.sort();
    inputs.dedup();
    assert_eq!(inputs.len(), 20);
}

// ============================================================================
// Conversation memory
// ============================================================================

#[tokio::test]
async fn test_conversation_memory_concurrent_turns() {
    let memory = Arc::new(ConversationMemory::new());

    let mut handles = Vec::new();
    for i in 0..10 {
        let memory = memory.clone();
        handles.push(tokio::spawn(async move {
            let session = if i % 2 == 0 { "even" } else { "odd" };
            memory
                .record_turn(session, format!("q{}", i), format!("a{}", i))
                .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let even = memory.history("even").await;
    assert_eq!(even.len(), 10);
    // every user message is immediately followed by its own answer
    for pair in even.chunks(2) {
        assert_eq!(pair[0].role, "user");
        assert_eq!(pair[1].role, "assistant");
        assert_eq!(pair[0].content[1..], pair[1].content[1..]);
    }
    assert_eq!(memory.len("odd").await, 10);
}
