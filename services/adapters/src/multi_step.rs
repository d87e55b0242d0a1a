//! # Multi-Step Adapter
//!
//! Wraps the multi-step form store. Raw fields are coerced one by one into
//! [`FormValues`]; missing or mistyped fields take their defaults. Each
//! extraction compares `(step, timestamp)` with the previous one and notifies
//! listeners when either moved.
//!
//! Writes go through whichever update mechanisms the store exposes; a write
//! counts as applied when any one of them succeeds.

use crate::base::{BaseAdapter, BridgeBackend};
use crate::error::{AdapterError, Result};
use crate::stores::{FormStore, FormUpdateFunctions};
use async_trait::async_trait;
use config::AdapterSettings;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use types::form::LOW_COMPLETION_THRESHOLD;
use types::{current_millis, EditorToFormResult, FormValues, MultiStepFormSnapshot, ValidationResult};

/// Name reported by the multi-step adapter
pub const MULTI_STEP_ADAPTER_NAME: &str = "multi-step";

/// Set on snapshots whose raw `formValues` was not an object
const FORM_VALUES_WELL_FORMED: &str = "formValuesWellFormed";

/// Multi-step adapter: the shared lifecycle around a [`MultiStepBackend`]
pub type MultiStepAdapter = BaseAdapter<MultiStepBackend>;

/// Handle returned by [`MultiStepBackend::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Notification delivered to form state listeners
#[derive(Debug, Clone)]
pub enum FormStateEvent {
    /// Step or timestamp moved since the previous extraction
    StateChanged(MultiStepFormSnapshot),
    /// Re-extraction after a transformation result was applied
    Updated(MultiStepFormSnapshot),
}

impl FormStateEvent {
    pub fn snapshot(&self) -> &MultiStepFormSnapshot {
        match self {
            FormStateEvent::StateChanged(snapshot) | FormStateEvent::Updated(snapshot) => snapshot,
        }
    }
}

/// Callback receiving [`FormStateEvent`]s; errors are logged and skipped
pub type FormStateListener = Arc<dyn Fn(&FormStateEvent) -> anyhow::Result<()> + Send + Sync>;

/// Form-store primitives and listener registry
pub struct MultiStepBackend {
    store: Arc<dyn FormStore>,
    listeners: Mutex<Vec<(ListenerId, FormStateListener)>>,
    next_listener_id: AtomicU64,
    last_observed: Mutex<Option<(u32, i64)>>,
    capabilities: Mutex<Vec<&'static str>>,
}

impl MultiStepBackend {
    pub fn new(store: Arc<dyn FormStore>) -> Self {
        Self {
            store,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            last_observed: Mutex::new(None),
            capabilities: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn FormStore> {
        &self.store
    }

    /// Update mechanisms found at connection time
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.capabilities.lock().clone()
    }

    // ========================================================================
    // LISTENERS
    // ========================================================================

    pub fn add_listener(&self, listener: FormStateListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    /// Returns whether a listener was removed
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() < before
    }

    pub fn clear_listeners(&self) {
        self.listeners.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver `event` to every listener registered at call time
    pub fn notify(&self, event: &FormStateEvent) {
        let listeners: Vec<(ListenerId, FormStateListener)> = self.listeners.lock().clone();
        for (id, listener) in listeners {
            if let Err(e) = listener(event) {
                warn!(listener = id.0, error = %e, "Form state listener failed");
            }
        }
    }

    // ========================================================================
    // STORE ACCESS
    // ========================================================================

    fn read_snapshot(&self) -> Result<MultiStepFormSnapshot> {
        let raw = self.store.form_state().map_err(AdapterError::store)?;

        let (form_values, well_formed) = match raw.form_values.as_ref() {
            Some(Value::Object(record)) => (normalize_form_values(record), true),
            other => {
                warn!(found = ?other.map(value_kind), "formValues is not an object, using defaults");
                (FormValues::default(), false)
            }
        };

        let snapshot_timestamp = raw
            .last_updated
            .as_ref()
            .and_then(coerce_i64)
            .unwrap_or_else(current_millis);

        let mut metadata = BTreeMap::new();
        metadata.insert(FORM_VALUES_WELL_FORMED.to_string(), Value::Bool(well_formed));
        metadata.insert(
            "completionPercentage".to_string(),
            json!(form_values.completion_percentage()),
        );
        metadata.insert(
            "missingRequiredFields".to_string(),
            json!(form_values.missing_required_fields()),
        );
        metadata.insert("capabilities".to_string(), json!(self.capabilities()));

        Ok(MultiStepFormSnapshot {
            current_step: coerce_step(raw.current_step.as_ref()),
            progress_percentage: coerce_f64(raw.progress_percentage.as_ref()),
            show_preview: coerce_bool(raw.show_preview.as_ref()),
            editor_completed_content: coerce_string(raw.editor_completed_content.as_ref()),
            is_editor_completed: coerce_bool(raw.is_editor_completed.as_ref()),
            form_values,
            snapshot_timestamp,
            metadata,
        })
    }

    fn observe(&self, snapshot: &MultiStepFormSnapshot) {
        let current = (snapshot.current_step, snapshot.snapshot_timestamp);
        let previous = self.last_observed.lock().replace(current);
        if previous != Some(current) {
            debug!(step = current.0, timestamp = current.1, "Form state changed");
            self.notify(&FormStateEvent::StateChanged(snapshot.clone()));
        }
    }

    /// Try every editor-field mechanism the store exposes
    ///
    /// Returns whether at least one succeeded.
    fn apply_editor_fields(&self, functions: &FormUpdateFunctions, content: &str, completed: bool) -> bool {
        let mut applied = Vec::with_capacity(3);

        if let Some(set_content) = &functions.set_editor_content {
            match set_content(content.to_string()) {
                Ok(()) => applied.push("set_editor_content"),
                Err(e) => warn!(error = %e, "set_editor_content failed"),
            }
        }

        if let Some(set_completed) = &functions.set_editor_completed {
            match set_completed(completed) {
                Ok(()) => applied.push("set_editor_completed"),
                Err(e) => warn!(error = %e, "set_editor_completed failed"),
            }
        }

        if let Some(set_field) = &functions.set_form_value {
            let written = set_field("editorCompletedContent", Value::String(content.to_string()))
                .and_then(|()| set_field("isEditorCompleted", Value::Bool(completed)));
            match written {
                Ok(()) => applied.push("set_form_value"),
                Err(e) => warn!(error = %e, "set_form_value failed"),
            }
        }

        debug!(mechanisms = ?applied, "Editor fields applied");
        !applied.is_empty()
    }
}

/// Record keys owned by the editor write path
const EDITOR_FIELDS: [&str; 2] = ["editorCompletedContent", "isEditorCompleted"];

// ============================================================================
// COERCION
// ============================================================================

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn coerce_optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn coerce_f64(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|n| n.is_finite()).map(|n| n as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Whole, non-negative step number; anything else becomes 0
fn coerce_step(value: Option<&Value>) -> u32 {
    let step = coerce_f64(value);
    if step >= 0.0 && step.fract() == 0.0 && step <= f64::from(u32::MAX) {
        step as u32
    } else {
        0
    }
}

fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Map a raw field record onto [`FormValues`], ignoring unknown keys
fn normalize_form_values(record: &Map<String, Value>) -> FormValues {
    let text = |key: &str| coerce_string(record.get(key));
    FormValues {
        user_image: text("userImage"),
        nickname: text("nickname"),
        email_prefix: text("emailPrefix"),
        email_domain: text("emailDomain"),
        bio: text("bio"),
        title: text("title"),
        description: text("description"),
        tags: text("tags"),
        main_image: coerce_optional_string(record.get("mainImage")),
        media: coerce_string_list(record.get("media")),
        slider_images: coerce_string_list(record.get("sliderImages")),
        editor_completed_content: text("editorCompletedContent"),
        is_editor_completed: coerce_bool(record.get("isEditorCompleted")),
    }
}

// ============================================================================
// PRIMITIVES
// ============================================================================

#[async_trait]
impl BridgeBackend for MultiStepBackend {
    type Data = MultiStepFormSnapshot;
    type Snapshot = MultiStepFormSnapshot;

    async fn perform_connection(&self) -> Result<()> {
        let state = self.store.form_state().map_err(AdapterError::store)?;
        if !matches!(state.form_values, Some(Value::Object(_))) {
            return Err(AdapterError::MissingCapability("formValues".to_string()));
        }

        let available = self.store.update_functions().available();
        if available.is_empty() {
            return Err(AdapterError::MissingCapability(
                "no update functions exposed".to_string(),
            ));
        }
        if available.len() < 3 {
            info!(capabilities = ?available, "Form store connected with reduced capabilities");
        }
        *self.capabilities.lock() = available;
        Ok(())
    }

    async fn perform_disconnection(&self) -> Result<()> {
        self.capabilities.lock().clear();
        *self.last_observed.lock() = None;
        Ok(())
    }

    async fn perform_health_check(&self) -> Result<bool> {
        Ok(self
            .store
            .form_state()
            .map(|state| matches!(state.form_values, Some(Value::Object(_))))
            .unwrap_or(false))
    }

    async fn extract_data_from_system(&self) -> Result<MultiStepFormSnapshot> {
        let snapshot = self.read_snapshot()?;
        self.observe(&snapshot);
        Ok(snapshot)
    }

    /// Write the field record, then the editor fields
    ///
    /// The record's own editor fields are skipped; the snapshot's top-level
    /// editor content and flag are the values that land in the store.
    async fn update_data_to_system(&self, data: &MultiStepFormSnapshot) -> Result<bool> {
        let functions = self.store.update_functions();

        let mut record_written = false;
        if let Some(set_field) = &functions.set_form_value {
            if let Value::Object(fields) = serde_json::to_value(&data.form_values)? {
                let mut failed = 0usize;
                for (name, value) in fields {
                    if EDITOR_FIELDS.contains(&name.as_str()) {
                        continue;
                    }
                    if let Err(e) = set_field(&name, value) {
                        warn!(field = %name, error = %e, "Form field write failed");
                        failed += 1;
                    }
                }
                record_written = failed == 0;
            }
        }

        let editor_written = self.apply_editor_fields(
            &functions,
            &data.editor_completed_content,
            data.is_editor_completed,
        );

        Ok(editor_written || record_written)
    }

    fn validate_extracted_data(&self, data: &MultiStepFormSnapshot) -> ValidationResult {
        let mut result = ValidationResult::new();

        let well_formed = data
            .metadata
            .get(FORM_VALUES_WELL_FORMED)
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if !well_formed {
            result.add_error("formValues", "formValues must be an object");
        }
        if !data.has_valid_step() {
            result.add_error(
                "currentStep",
                format!("step {} is outside the form's step range", data.current_step),
            );
        }
        if data.snapshot_timestamp <= 0 {
            result.add_error("snapshotTimestamp", "snapshot timestamp must be positive");
        }

        let completion = data.form_values.completion_percentage();
        result.set_metric("completionPercentage", completion);
        if completion < LOW_COMPLETION_THRESHOLD {
            result.add_warning(format!("low form completion: {:.1}%", completion));
            result.set_flag("LOW_COMPLETION");
        }

        let missing = data.form_values.missing_required_fields();
        result.set_metric("missingRequiredFields", missing.len() as f64);
        result.set_metric("currentStep", f64::from(data.current_step));
        if data.show_preview {
            result.set_flag("PREVIEW_OPEN");
        }

        result.has_minimum_content = !data.editor_completed_content.trim().is_empty();
        result.has_required_structure = well_formed && missing.is_empty();
        result.finish()
    }

    fn create_data_snapshot(&self, data: &MultiStepFormSnapshot) -> MultiStepFormSnapshot {
        data.clone()
    }

    fn cache_key(&self, data: &MultiStepFormSnapshot) -> Option<String> {
        Some(format!(
            "form_snapshot_{}_{}",
            data.current_step, data.snapshot_timestamp
        ))
    }
}

impl BaseAdapter<MultiStepBackend> {
    /// Multi-step adapter over `store`
    pub fn multi_step(store: Arc<dyn FormStore>, settings: AdapterSettings) -> Self {
        BaseAdapter::new(
            MultiStepBackend::new(store),
            MULTI_STEP_ADAPTER_NAME,
            env!("CARGO_PKG_VERSION"),
            settings,
        )
    }

    pub fn add_listener(&self, listener: FormStateListener) -> ListenerId {
        self.backend().add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.backend().remove_listener(id)
    }

    pub fn clear_listeners(&self) {
        self.backend().clear_listeners();
    }

    /// Write an editor → form result into the store
    ///
    /// Succeeds when any update mechanism succeeded. The store is then read
    /// back and listeners receive [`FormStateEvent::Updated`] before this
    /// returns.
    pub async fn update_from_transformation_result(&self, result: &EditorToFormResult) -> bool {
        if !self.is_connected() {
            debug!("Transformation result not applied: not connected");
            return false;
        }
        if !result.transformation_success {
            warn!(errors = ?result.transformation_errors, "Refusing to apply failed transformation");
            return false;
        }

        let started = Instant::now();
        let functions = self.backend().store().update_functions();
        let applied = self.backend().apply_editor_fields(
            &functions,
            &result.transformed_content,
            result.transformed_is_completed,
        );
        self.record_operation(applied, started.elapsed());

        if !applied {
            warn!("No update mechanism accepted the transformation result");
            return false;
        }

        if let Some(snapshot) = self.extract_data().await {
            self.backend().notify(&FormStateEvent::Updated(snapshot));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::InMemoryFormStore;
    use types::TransformationStrategy;

    fn store_with_values() -> InMemoryFormStore {
        let store = InMemoryFormStore::new();
        store.set_form_values(json!({
            "nickname": "writer",
            "emailPrefix": 42,
            "title": ["not", "a", "string"],
            "media": ["a.png", 3, "b.png"],
            "isEditorCompleted": "true",
            "unknownField": "ignored"
        }));
        store.set_raw_step(json!("3"));
        store
    }

    fn transformation(content: &str) -> EditorToFormResult {
        EditorToFormResult {
            transformed_content: content.to_string(),
            transformed_is_completed: true,
            transformation_success: true,
            transformation_errors: Vec::new(),
            strategy: TransformationStrategy::ExistingContent,
            transformed_at: current_millis(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_normalization_coerces_field_by_field() {
        let backend = MultiStepBackend::new(Arc::new(store_with_values()));
        let snapshot = backend.read_snapshot().unwrap();

        assert_eq!(snapshot.current_step, 3);
        assert_eq!(snapshot.form_values.nickname, "writer");
        assert_eq!(snapshot.form_values.email_prefix, "42");
        assert_eq!(snapshot.form_values.title, "");
        assert_eq!(snapshot.form_values.media, vec!["a.png", "b.png"]);
        assert!(snapshot.form_values.is_editor_completed);
        assert!(snapshot.snapshot_timestamp > 0);
    }

    #[test]
    fn test_step_coercion_rejects_fractions_and_negatives() {
        assert_eq!(coerce_step(Some(&json!(2))), 2);
        assert_eq!(coerce_step(Some(&json!(2.5))), 0);
        assert_eq!(coerce_step(Some(&json!(-1))), 0);
        assert_eq!(coerce_step(Some(&json!(null))), 0);
        assert_eq!(coerce_step(None), 0);
    }

    #[tokio::test]
    async fn test_connection_needs_object_and_a_mechanism() {
        let store = InMemoryFormStore::new();
        let backend = MultiStepBackend::new(Arc::new(store.clone()));

        store.set_mechanisms(&[InMemoryFormStore::SET_FORM_VALUE]);
        assert!(backend.perform_connection().await.is_ok());
        assert_eq!(backend.capabilities(), vec!["set_form_value"]);

        store.set_mechanisms(&[]);
        assert!(matches!(
            backend.perform_connection().await,
            Err(AdapterError::MissingCapability(_))
        ));

        store.set_mechanisms(&[InMemoryFormStore::SET_EDITOR_CONTENT]);
        store.set_form_values(json!("not an object"));
        assert!(backend.perform_connection().await.is_err());
    }

    #[tokio::test]
    async fn test_state_change_events_follow_step_or_timestamp() {
        let store = InMemoryFormStore::new();
        let backend = MultiStepBackend::new(Arc::new(store.clone()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        backend.add_listener(Arc::new(move |event: &FormStateEvent| -> anyhow::Result<()> {
            sink.lock().push(event.snapshot().current_step);
            Ok(())
        }));

        backend.extract_data_from_system().await.unwrap();
        backend.extract_data_from_system().await.unwrap();
        store.set_step(2);
        backend.extract_data_from_system().await.unwrap();

        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_block_others() {
        let backend = MultiStepBackend::new(Arc::new(InMemoryFormStore::new()));
        let calls = Arc::new(AtomicU64::new(0));

        backend.add_listener(Arc::new(|_: &FormStateEvent| -> anyhow::Result<()> {
            anyhow::bail!("listener broke")
        }));
        let counter = Arc::clone(&calls);
        let id = backend.add_listener(Arc::new(move |_: &FormStateEvent| -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        backend.extract_data_from_system().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(backend.remove_listener(id));
        assert!(!backend.remove_listener(id));
        assert_eq!(backend.listener_count(), 1);
        backend.clear_listeners();
        assert_eq!(backend.listener_count(), 0);
    }

    async fn connected(store: &InMemoryFormStore) -> MultiStepAdapter {
        let adapter = BaseAdapter::multi_step(Arc::new(store.clone()), AdapterSettings::multi_step());
        assert!(adapter.connect().await);
        adapter
    }

    #[tokio::test]
    async fn test_update_keeps_new_editor_content_over_stale_record() {
        let store = InMemoryFormStore::new();
        store.set_form_values(json!({ "nickname": "writer" }));
        let adapter = connected(&store).await;

        let mut snapshot = adapter.extract_data().await.unwrap();
        snapshot.editor_completed_content = "new body".to_string();
        snapshot.is_editor_completed = true;
        snapshot.form_values.nickname = "author".to_string();

        assert!(adapter.update_data(&snapshot).await);

        assert_eq!(store.editor_content(), "new body");
        assert!(store.is_editor_completed());
        assert_eq!(store.form_value("editorCompletedContent"), Some(json!("new body")));
        assert_eq!(store.form_value("isEditorCompleted"), Some(json!(true)));
        assert_eq!(store.form_value("nickname"), Some(json!("author")));

        let reread = adapter.extract_data().await.unwrap();
        assert_eq!(reread.form_values.editor_completed_content, "new body");
        assert!(reread.form_values.is_editor_completed);
    }

    #[tokio::test]
    async fn test_update_through_generic_setter_alone() {
        let store = InMemoryFormStore::new();
        store.set_mechanisms(&[InMemoryFormStore::SET_FORM_VALUE]);
        let adapter = connected(&store).await;

        let mut snapshot = adapter.extract_data().await.unwrap();
        snapshot.editor_completed_content = "only the record".to_string();
        snapshot.form_values.bio = "short bio".to_string();

        assert!(adapter.update_data(&snapshot).await);

        assert_eq!(store.editor_content(), "");
        assert_eq!(store.form_value("editorCompletedContent"), Some(json!("only the record")));
        assert_eq!(store.form_value("bio"), Some(json!("short bio")));
    }

    #[tokio::test]
    async fn test_update_fails_when_every_mechanism_fails() {
        let store = InMemoryFormStore::new();
        let adapter = connected(&store).await;
        let snapshot = adapter.extract_data().await.unwrap();

        store.fail_mechanism(InMemoryFormStore::SET_EDITOR_CONTENT);
        store.fail_mechanism(InMemoryFormStore::SET_EDITOR_COMPLETED);
        store.fail_mechanism(InMemoryFormStore::SET_FORM_VALUE);

        assert!(!adapter.update_data(&snapshot).await);
        assert_eq!(adapter.performance_metrics().failed_operations, 1);
    }

    #[test]
    fn test_validation_flags_low_completion_as_warning() {
        let backend = MultiStepBackend::new(Arc::new(store_with_values()));
        let snapshot = backend.read_snapshot().unwrap();

        let report = backend.validate_extracted_data(&snapshot);

        assert!(report.is_valid_for_transfer);
        assert!(report.validation_flags.contains("LOW_COMPLETION"));
        assert_eq!(report.validation_warnings.len(), 1);
    }

    #[test]
    fn test_validation_rejects_bad_step_and_malformed_values() {
        let store = InMemoryFormStore::new();
        store.set_form_values(json!([1, 2]));
        store.set_step(9);
        let backend = MultiStepBackend::new(Arc::new(store));
        let snapshot = backend.read_snapshot().unwrap();

        let report = backend.validate_extracted_data(&snapshot);

        assert!(!report.is_valid_for_transfer);
        assert!(report.error_details.contains_key("currentStep"));
        assert!(report.error_details.contains_key("formValues"));
    }

    #[tokio::test]
    async fn test_result_applied_when_any_mechanism_succeeds() {
        let store = InMemoryFormStore::new();
        store.fail_mechanism(InMemoryFormStore::SET_EDITOR_CONTENT);
        let adapter = BaseAdapter::multi_step(Arc::new(store.clone()), AdapterSettings::multi_step());
        assert!(adapter.connect().await);

        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        adapter.add_listener(Arc::new(move |event: &FormStateEvent| -> anyhow::Result<()> {
            if let FormStateEvent::Updated(snapshot) = event {
                sink.lock().push(snapshot.form_values.editor_completed_content.clone());
            }
            Ok(())
        }));

        assert!(adapter.update_from_transformation_result(&transformation("body")).await);

        assert_eq!(store.editor_content(), "");
        assert!(store.is_editor_completed());
        assert_eq!(store.form_value("editorCompletedContent"), Some(json!("body")));
        assert_eq!(*updates.lock(), vec!["body".to_string()]);
    }

    #[tokio::test]
    async fn test_result_rejected_when_every_mechanism_fails() {
        let store = InMemoryFormStore::new();
        store.set_mechanisms(&[InMemoryFormStore::SET_EDITOR_CONTENT]);
        store.fail_mechanism(InMemoryFormStore::SET_EDITOR_CONTENT);
        let adapter = BaseAdapter::multi_step(Arc::new(store), AdapterSettings::multi_step());
        assert!(adapter.connect().await);

        assert!(!adapter.update_from_transformation_result(&transformation("body")).await);
        assert_eq!(adapter.performance_metrics().failed_operations, 1);
    }

    #[tokio::test]
    async fn test_failed_transformation_is_not_applied() {
        let store = InMemoryFormStore::new();
        let adapter = BaseAdapter::multi_step(Arc::new(store.clone()), AdapterSettings::multi_step());
        assert!(adapter.connect().await);

        let failed = EditorToFormResult::failure("boom", TransformationStrategy::Auto, 1);
        assert!(!adapter.update_from_transformation_result(&failed).await);
        assert_eq!(store.editor_content(), "");
    }
}
