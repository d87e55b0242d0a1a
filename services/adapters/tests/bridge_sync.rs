//! End-to-end behaviour of the adapters and the bridge session

use bridge_adapters::stores::{InMemoryEditorStore, InMemoryFormStore};
use bridge_adapters::{BaseAdapter, BridgeSession, ConnectionPhase, EditorBackend, FormStateEvent};
use config::{AdapterSettings, BridgeSettings};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use types::{
    Container, DocumentIssue, DocumentStatistics, DocumentValidator, ParagraphBlock,
    StructuralValidator, TransformationStrategy,
};

fn sample_document() -> InMemoryEditorStore {
    InMemoryEditorStore::with_document(
        &[
            Container::new("b", "Body", 2),
            Container::new("a", "Opening", 1),
        ],
        &[
            ParagraphBlock::new("p1", "First words.", Some("a"), 1),
            ParagraphBlock::new("p2", "Second part.", Some("b"), 1),
            ParagraphBlock::new("p3", "Loose note.", None, 1),
        ],
    )
    .unwrap()
}

fn session_over(editor: &InMemoryEditorStore, form: &InMemoryFormStore) -> BridgeSession {
    BridgeSession::new(
        BridgeSettings::default(),
        Arc::new(editor.clone()),
        Arc::new(form.clone()),
    )
}

/// Counts whole-document validations
struct CountingValidator {
    calls: Arc<AtomicUsize>,
}

impl DocumentValidator for CountingValidator {
    fn validate(&self, containers: &[Container], paragraphs: &[ParagraphBlock]) -> Vec<DocumentIssue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StructuralValidator.validate(containers, paragraphs)
    }

    fn validate_container(&self, container_id: &str, paragraphs: &[ParagraphBlock]) -> Vec<DocumentIssue> {
        StructuralValidator.validate_container(container_id, paragraphs)
    }

    fn statistics(&self, containers: &[Container], paragraphs: &[ParagraphBlock]) -> DocumentStatistics {
        StructuralValidator.statistics(containers, paragraphs)
    }
}

#[tokio::test]
async fn test_editor_content_survives_a_round_trip() {
    let editor = sample_document();
    let form = InMemoryFormStore::new();
    let session = session_over(&editor, &form);
    assert!(session.connect_all().await);

    let forward = session.sync_editor_to_form().await.unwrap();
    assert!(forward.applied);
    let expected = "## Opening\n\nFirst words.\n\n## Body\n\nSecond part.\n\nLoose note.";
    assert_eq!(forward.result.transformed_content, expected);
    assert_eq!(forward.result.strategy, TransformationStrategy::ExistingContent);
    assert_eq!(form.editor_content(), expected);

    let backward = session.sync_form_to_editor().await.unwrap();
    assert!(backward.applied);
    assert_eq!(backward.result.editor_content, expected);
    assert_eq!(editor.completed_content(), expected);
}

#[tokio::test]
async fn test_explicit_strategy_is_honoured() {
    let editor = sample_document();
    let form = InMemoryFormStore::new();
    let session = session_over(&editor, &form);
    assert!(session.connect_all().await);

    let options = session
        .engine()
        .settings()
        .clone()
        .with_strategy(TransformationStrategy::ParagraphFallback);
    let outcome = session.sync_editor_to_form_with(&options).await.unwrap();

    assert_eq!(outcome.result.transformed_content, "Loose note.");
    assert_eq!(form.editor_content(), "Loose note.");
}

#[tokio::test]
async fn test_disconnected_extract_never_reads_the_store() {
    let editor = sample_document();
    let adapter = BaseAdapter::editor(Arc::new(editor.clone()), AdapterSettings::editor());

    assert!(adapter.extract_data().await.is_none());
    assert!(!adapter.health_check().await);
    assert_eq!(editor.core_reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_connect_retries_until_store_appears() {
    let editor = sample_document();
    editor.set_available(false);
    let adapter = BaseAdapter::editor(Arc::new(editor.clone()), AdapterSettings::editor());

    let revive = editor.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        revive.set_available(true);
    });

    let started = Instant::now();
    assert!(adapter.connect().await);

    // Attempts at 0 ms, 1000 ms and 2500 ms
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2_500) && elapsed < Duration::from_millis(2_600));
    let state = adapter.connection_state();
    assert_eq!(state.connection_attempts, 3);
    assert_eq!(state.phase, ConnectionPhase::Connected);
}

#[tokio::test]
async fn test_identical_payloads_share_one_validation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let editor = sample_document();
    let backend = EditorBackend::new(Arc::new(editor), &AdapterSettings::editor())
        .with_validator(Arc::new(CountingValidator {
            calls: Arc::clone(&calls),
        }));
    let adapter = BaseAdapter::new(backend, "editor", "test", AdapterSettings::editor());
    assert!(adapter.connect().await);

    let snapshot = adapter.extract_data().await.unwrap();
    let first = adapter.validate_data(&snapshot);
    let second = adapter.validate_data(&snapshot.clone());

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(first.is_valid_for_transfer);
}

#[tokio::test]
async fn test_lost_store_yields_fallback_snapshot() {
    let editor = sample_document();
    let adapter = BaseAdapter::editor(Arc::new(editor.clone()), AdapterSettings::editor());
    assert!(adapter.connect().await);

    editor.set_available(false);
    let snapshot = adapter.extract_data().await.unwrap();

    assert!(snapshot.is_fallback());
    assert!(!adapter.validate_data(&snapshot).is_valid_for_transfer);
    assert!(!adapter.health_check().await);
    assert!(adapter.is_connected());
}

#[tokio::test]
async fn test_listeners_see_state_change_then_update() {
    let editor = sample_document();
    let form = InMemoryFormStore::new();
    let session = session_over(&editor, &form);
    assert!(session.connect_all().await);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session
        .multi_step()
        .add_listener(Arc::new(move |event: &FormStateEvent| -> anyhow::Result<()> {
            let label = match event {
                FormStateEvent::StateChanged(_) => "changed",
                FormStateEvent::Updated(_) => "updated",
            };
            sink.lock().push(label);
            Ok(())
        }));

    session.sync_editor_to_form().await.unwrap();

    assert_eq!(*events.lock(), vec!["changed", "updated"]);
}

#[tokio::test]
async fn test_form_to_editor_needs_editor_setters() {
    let editor = sample_document();
    let form = InMemoryFormStore::new();
    let session = session_over(&editor, &form);
    assert!(session.connect_all().await);
    session.sync_editor_to_form().await.unwrap();

    editor.set_setters_enabled(false, true);
    let outcome = session.sync_form_to_editor().await.unwrap();

    assert!(outcome.result.transformation_success);
    assert!(!outcome.applied);
}

#[tokio::test]
async fn test_reset_disconnects_and_clears_engine_cache() {
    let editor = sample_document();
    let form = InMemoryFormStore::new();
    let session = session_over(&editor, &form);
    assert!(session.connect_all().await);
    session.sync_editor_to_form().await.unwrap();
    assert_eq!(session.engine().cache_stats().editor_to_form_entries, 1);

    session.reset().await;

    assert!(!session.editor().is_connected());
    assert!(!session.multi_step().is_connected());
    assert_eq!(session.engine().cache_stats().editor_to_form_entries, 0);
    assert_eq!(session.editor().performance_metrics().total_operations, 0);
}
