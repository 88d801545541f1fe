//! Functional tests for retry behavior and chunked persistence.
//!
//! Covered guarantees:
//! - Rate-limit errors from the generation seam are retried with backoff and
//!   the operation still succeeds; other errors are surfaced immediately.
//! - A persistent rate limit exhausts the bounded budget and reports how
//!   many attempts were consumed.
//! - Snapshots far larger than the storage write ceiling survive a
//!   save/load cycle byte for byte via the chunking codec.
//! - A persistence failure mid-mutation rolls the live collection back.

use std::sync::Arc;
use std::time::Duration;
use stitch_chunk::{ChunkedCodec, MemoryStore};
use stitch_core::{
    EngineError, ProjectRepository, ProjectSession, RetryPolicy, SessionRegistry,
};
use stitch_model::PatchOp;
use stitch_snapshot::ProjectState;
use stitch_test_utils::{collection, RecordingProgress, ScriptedGenerator};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

/// Two rate limits then success: the caller sees only the success.
#[tokio::test]
async fn rate_limits_are_retried_transparently() {
    init_tracing();
    let generator = Arc::new(ScriptedGenerator::new());
    generator.push_patch(Err(EngineError::RateLimited { retry_after: None }));
    generator.push_patch(Err(EngineError::RateLimited {
        retry_after: Some(Duration::from_millis(2)),
    }));
    generator.push_patch(Ok([PatchOp::Add {
        path: "out.txt".into(),
        content: "made it".into(),
    }]
    .into_iter()
    .collect()));

    let registry = SessionRegistry::with_retry(
        Arc::clone(&generator) as Arc<dyn stitch_core::Generator>,
        Arc::new(MemoryStore::new()),
        fast_retry(),
    );
    let session = registry.open("p").await.unwrap();

    let outcome = session
        .refine("persist through pressure", Arc::new(RecordingProgress::new()))
        .await
        .unwrap();
    assert_eq!(outcome.files.get("out.txt"), Some("made it"));
    assert_eq!(session.state(), ProjectState::Idle);
}

/// A rate limit that never lifts consumes the whole budget and reports it.
#[tokio::test]
async fn persistent_rate_limit_exhausts_budget() {
    let generator = Arc::new(ScriptedGenerator::new());
    for _ in 0..3 {
        generator.push_patch(Err(EngineError::RateLimited { retry_after: None }));
    }

    let registry = SessionRegistry::with_retry(
        Arc::clone(&generator) as Arc<dyn stitch_core::Generator>,
        Arc::new(MemoryStore::new()),
        fast_retry(),
    );
    let session = registry.open("p").await.unwrap();

    let result = session
        .refine("never succeeds", Arc::new(RecordingProgress::new()))
        .await;
    match result {
        Err(EngineError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(session.state(), ProjectState::Failed);
}

/// Oversized input is not transient: one attempt, immediate error.
#[tokio::test]
async fn oversized_input_is_not_retried() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.push_patch(Err(EngineError::InputTooLarge(
        "project exceeds context".into(),
    )));

    let registry = SessionRegistry::with_retry(
        Arc::clone(&generator) as Arc<dyn stitch_core::Generator>,
        Arc::new(MemoryStore::new()),
        fast_retry(),
    );
    let session = registry.open("p").await.unwrap();

    let result = session
        .refine("too big", Arc::new(RecordingProgress::new()))
        .await;
    assert!(matches!(result, Err(EngineError::InputTooLarge(_))));
}

/// A snapshot several times the write ceiling round-trips exactly. The tiny
/// codec thresholds stand in for the production 800 KB ceiling.
#[tokio::test]
async fn oversized_snapshot_round_trips_through_chunking() {
    let store = Arc::new(MemoryStore::new());
    let repo = ProjectRepository::with_codec(Arc::clone(&store), ChunkedCodec::new(128, 10));

    let big_body = "fn generated_item() { /* body */ }\n".repeat(200);
    let files = collection(&[
        ("src/big.rs", big_body.as_str()),
        ("src/smol.rs", "pub fn tiny() {}"),
        ("README.md", "# big project\nwith unicode: héllo ♞\n"),
    ]);

    repo.persist_snapshot("huge", &files).await.unwrap();
    assert!(store.chunk_count("huge/snapshot") > 1);

    let loaded = repo.read_snapshot("huge").await.unwrap().unwrap();
    assert_eq!(loaded, files);
}

/// When the store rejects the post-patch write, the session rolls back to
/// the pre-image instead of exposing an unpersisted mutation. The rollback
/// reaches storage too: neither the snapshot nor the checkpoint document
/// carries any trace of the failed patch.
#[tokio::test]
async fn persistence_failure_rolls_back_the_mutation() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.push_patch(Ok([PatchOp::Update {
        path: "a.txt".into(),
        content: "v2".into(),
    }]
    .into_iter()
    .collect()));

    let store = Arc::new(MemoryStore::new());
    let session = ProjectSession::new(
        "p",
        Arc::clone(&generator) as Arc<dyn stitch_core::Generator>,
        ProjectRepository::new(Arc::clone(&store)),
        RetryPolicy::none(),
        collection(&[("a.txt", "v1")]),
    );

    store.fail_next_write();
    let result = session
        .refine("doomed", Arc::new(RecordingProgress::new()))
        .await;

    assert!(matches!(result, Err(EngineError::Storage(_))));
    assert_eq!(session.state(), ProjectState::Failed);
    assert_eq!(session.files().await.get("a.txt"), Some("v1"));
    assert!(session.list_checkpoints().await.is_empty());

    let repo = ProjectRepository::new(store);
    let persisted = repo.read_snapshot("p").await.unwrap().unwrap();
    assert_eq!(persisted.get("a.txt"), Some("v1"));
    assert!(repo.list_checkpoints("p").await.unwrap().is_empty());
}
