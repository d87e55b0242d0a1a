//! In-memory stores for tests, demos and the probe binary

use super::{
    ContentSetter, EditorSetters, EditorStore, FieldSetter, FlagSetter, FormStore,
    FormUpdateFunctions, RawEditorState, RawFormState, RawUiState,
};
use anyhow::{anyhow, bail, Context};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use types::{current_millis, Container, ParagraphBlock};

// ============================================================================
// EDITOR STORE
// ============================================================================

#[derive(Debug, Default)]
struct EditorInner {
    containers: Vec<Value>,
    paragraphs: Vec<Value>,
    completed_content: String,
    is_completed: bool,
    ui: RawUiState,
    core_available: bool,
    ui_available: bool,
    content_setter: bool,
    flag_setter: bool,
}

/// Editor store backed by a lock-protected record
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct InMemoryEditorStore {
    inner: Arc<RwLock<EditorInner>>,
    core_reads: Arc<AtomicUsize>,
}

impl Default for InMemoryEditorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEditorStore {
    /// Empty, reachable store with both setters
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(EditorInner {
                core_available: true,
                ui_available: true,
                content_setter: true,
                flag_setter: true,
                ..Default::default()
            })),
            core_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Store holding a well-formed document
    pub fn with_document(containers: &[Container], paragraphs: &[ParagraphBlock]) -> anyhow::Result<Self> {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for container in containers {
                inner.containers.push(serde_json::to_value(container)?);
            }
            for paragraph in paragraphs {
                inner.paragraphs.push(serde_json::to_value(paragraph)?);
            }
        }
        Ok(store)
    }

    /// Load a document record: `{ "containers": [..], "paragraphs": [..],
    /// "completedContent": "..", "isCompleted": bool }`
    ///
    /// List entries are kept as-is, malformed ones included.
    pub fn from_document(document: &Value) -> anyhow::Result<Self> {
        let record = document
            .as_object()
            .ok_or_else(|| anyhow!("document must be a JSON object"))?;

        let list = |name: &str| -> anyhow::Result<Vec<Value>> {
            match record.get(name) {
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(Value::Array(items)) => Ok(items.clone()),
                Some(_) => bail!("document field '{}' must be an array", name),
            }
        };

        let store = Self::new();
        {
            let mut inner = store.inner.write();
            inner.containers = list("containers").context("reading containers")?;
            inner.paragraphs = list("paragraphs").context("reading paragraphs")?;
            inner.completed_content = record
                .get("completedContent")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            inner.is_completed = record
                .get("isCompleted")
                .and_then(Value::as_bool)
                .unwrap_or(false);
        }
        Ok(store)
    }

    /// Append a container record without validating it
    pub fn push_raw_container(&self, value: Value) {
        self.inner.write().containers.push(value);
    }

    /// Append a paragraph record without validating it
    pub fn push_raw_paragraph(&self, value: Value) {
        self.inner.write().paragraphs.push(value);
    }

    pub fn set_ui_state(&self, ui: RawUiState) {
        self.inner.write().ui = ui;
    }

    pub fn set_completed(&self, is_completed: bool) {
        self.inner.write().is_completed = is_completed;
    }

    /// Make the core state unreachable (or reachable again)
    pub fn set_available(&self, available: bool) {
        self.inner.write().core_available = available;
    }

    /// Make the UI state unreachable (or reachable again)
    pub fn set_ui_available(&self, available: bool) {
        self.inner.write().ui_available = available;
    }

    /// Choose which setters the store exposes
    pub fn set_setters_enabled(&self, content: bool, flag: bool) {
        let mut inner = self.inner.write();
        inner.content_setter = content;
        inner.flag_setter = flag;
    }

    pub fn completed_content(&self) -> String {
        self.inner.read().completed_content.clone()
    }

    pub fn is_completed(&self) -> bool {
        self.inner.read().is_completed
    }

    /// How many times `core_state` has been called
    pub fn core_reads(&self) -> usize {
        self.core_reads.load(Ordering::SeqCst)
    }
}

impl EditorStore for InMemoryEditorStore {
    fn core_state(&self) -> anyhow::Result<RawEditorState> {
        self.core_reads.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read();
        if !inner.core_available {
            bail!("editor store unavailable");
        }
        Ok(RawEditorState {
            containers: inner.containers.clone(),
            paragraphs: inner.paragraphs.clone(),
            completed_content: inner.completed_content.clone(),
            is_completed: inner.is_completed,
        })
    }

    fn ui_state(&self) -> anyhow::Result<RawUiState> {
        let inner = self.inner.read();
        if !inner.ui_available {
            bail!("editor UI state unavailable");
        }
        Ok(inner.ui.clone())
    }

    fn setters(&self) -> EditorSetters {
        let (content_enabled, flag_enabled) = {
            let inner = self.inner.read();
            (inner.content_setter, inner.flag_setter)
        };

        let content_state = Arc::clone(&self.inner);
        let set_completed_content: ContentSetter = Arc::new(move |content: String| -> anyhow::Result<()> {
            content_state.write().completed_content = content;
            Ok(())
        });

        let flag_state = Arc::clone(&self.inner);
        let set_is_completed: FlagSetter = Arc::new(move |flag: bool| -> anyhow::Result<()> {
            flag_state.write().is_completed = flag;
            Ok(())
        });

        EditorSetters {
            set_completed_content: content_enabled.then_some(set_completed_content),
            set_is_completed: flag_enabled.then_some(set_is_completed),
        }
    }
}

// ============================================================================
// FORM STORE
// ============================================================================

#[derive(Debug)]
struct FormInner {
    form_values: Value,
    current_step: Value,
    progress_percentage: Value,
    show_preview: Value,
    editor_completed_content: String,
    is_editor_completed: bool,
    last_updated: i64,
    available: bool,
    mechanisms: HashSet<&'static str>,
    failing: HashSet<&'static str>,
}

impl FormInner {
    fn touch(&mut self) {
        self.last_updated = current_millis().max(self.last_updated + 1);
    }

    fn check(&self, mechanism: &'static str) -> anyhow::Result<()> {
        if self.failing.contains(mechanism) {
            bail!("{} rejected the write", mechanism);
        }
        Ok(())
    }
}

/// Multi-step form store backed by a lock-protected record
///
/// Every write bumps `last_updated`, so consecutive writes are always
/// observable as a state change. Clones share the same state.
#[derive(Debug, Clone)]
pub struct InMemoryFormStore {
    inner: Arc<RwLock<FormInner>>,
}

impl Default for InMemoryFormStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFormStore {
    pub const SET_EDITOR_CONTENT: &'static str = "set_editor_content";
    pub const SET_EDITOR_COMPLETED: &'static str = "set_editor_completed";
    pub const SET_FORM_VALUE: &'static str = "set_form_value";

    /// Empty form on step 1 with every update mechanism
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(FormInner {
                form_values: Value::Object(Map::new()),
                current_step: json!(1),
                progress_percentage: json!(0),
                show_preview: json!(false),
                editor_completed_content: String::new(),
                is_editor_completed: false,
                last_updated: current_millis(),
                available: true,
                mechanisms: [
                    Self::SET_EDITOR_CONTENT,
                    Self::SET_EDITOR_COMPLETED,
                    Self::SET_FORM_VALUE,
                ]
                .into_iter()
                .collect(),
                failing: HashSet::new(),
            })),
        }
    }

    /// Replace the raw field record
    pub fn set_form_values(&self, values: Value) {
        let mut inner = self.inner.write();
        inner.form_values = values;
        inner.touch();
    }

    /// Overwrite one raw field inside the record
    pub fn set_raw_field(&self, name: &str, value: Value) {
        let mut inner = self.inner.write();
        if let Value::Object(map) = &mut inner.form_values {
            map.insert(name.to_string(), value);
        }
        inner.touch();
    }

    pub fn set_step(&self, step: u32) {
        let mut inner = self.inner.write();
        inner.current_step = json!(step);
        inner.touch();
    }

    /// Set the raw step value, mistyped values included
    pub fn set_raw_step(&self, step: Value) {
        let mut inner = self.inner.write();
        inner.current_step = step;
        inner.touch();
    }

    pub fn set_available(&self, available: bool) {
        self.inner.write().available = available;
    }

    /// Expose only the named update mechanisms
    pub fn set_mechanisms(&self, mechanisms: &[&'static str]) {
        self.inner.write().mechanisms = mechanisms.iter().copied().collect();
    }

    /// Make a mechanism fail every write
    pub fn fail_mechanism(&self, mechanism: &'static str) {
        self.inner.write().failing.insert(mechanism);
    }

    pub fn editor_content(&self) -> String {
        self.inner.read().editor_completed_content.clone()
    }

    pub fn is_editor_completed(&self) -> bool {
        self.inner.read().is_editor_completed
    }

    /// Raw value of one field inside the record
    pub fn form_value(&self, name: &str) -> Option<Value> {
        self.inner.read().form_values.get(name).cloned()
    }
}

impl FormStore for InMemoryFormStore {
    fn form_state(&self) -> anyhow::Result<RawFormState> {
        let inner = self.inner.read();
        if !inner.available {
            bail!("form store unavailable");
        }
        Ok(RawFormState {
            form_values: Some(inner.form_values.clone()),
            current_step: Some(inner.current_step.clone()),
            progress_percentage: Some(inner.progress_percentage.clone()),
            show_preview: Some(inner.show_preview.clone()),
            editor_completed_content: Some(Value::String(inner.editor_completed_content.clone())),
            is_editor_completed: Some(Value::Bool(inner.is_editor_completed)),
            last_updated: Some(json!(inner.last_updated)),
        })
    }

    fn update_functions(&self) -> FormUpdateFunctions {
        let mechanisms = self.inner.read().mechanisms.clone();

        let state = Arc::clone(&self.inner);
        let set_editor_content: ContentSetter = Arc::new(move |content: String| -> anyhow::Result<()> {
            let mut inner = state.write();
            inner.check(Self::SET_EDITOR_CONTENT)?;
            inner.editor_completed_content = content;
            inner.touch();
            Ok(())
        });

        let state = Arc::clone(&self.inner);
        let set_editor_completed: FlagSetter = Arc::new(move |flag: bool| -> anyhow::Result<()> {
            let mut inner = state.write();
            inner.check(Self::SET_EDITOR_COMPLETED)?;
            inner.is_editor_completed = flag;
            inner.touch();
            Ok(())
        });

        let state = Arc::clone(&self.inner);
        let set_form_value: FieldSetter = Arc::new(move |name: &str, value: Value| -> anyhow::Result<()> {
            let mut inner = state.write();
            inner.check(Self::SET_FORM_VALUE)?;
            match &mut inner.form_values {
                Value::Object(map) => {
                    map.insert(name.to_string(), value);
                }
                _ => bail!("form values are not an object"),
            }
            inner.touch();
            Ok(())
        });

        FormUpdateFunctions {
            set_editor_content: mechanisms
                .contains(Self::SET_EDITOR_CONTENT)
                .then_some(set_editor_content),
            set_editor_completed: mechanisms
                .contains(Self::SET_EDITOR_COMPLETED)
                .then_some(set_editor_completed),
            set_form_value: mechanisms
                .contains(Self::SET_FORM_VALUE)
                .then_some(set_form_value),
        }
    }
}
