//! Store ports wrapped by the adapters
//!
//! A store is whatever owns the live editor or form state. The adapters only
//! need a synchronous accessor for the fields they read and optional setter
//! handles for the fields they write back. List entries and form fields
//! arrive as raw JSON and are parsed once at the adapter boundary.

pub mod memory;

use serde_json::Value;
use std::sync::Arc;

pub use memory::{InMemoryEditorStore, InMemoryFormStore};

/// Writes a content string into a store
pub type ContentSetter = Arc<dyn Fn(String) -> anyhow::Result<()> + Send + Sync>;

/// Writes a completion flag into a store
pub type FlagSetter = Arc<dyn Fn(bool) -> anyhow::Result<()> + Send + Sync>;

/// Writes an arbitrary named form field
pub type FieldSetter = Arc<dyn Fn(&str, Value) -> anyhow::Result<()> + Send + Sync>;

// ============================================================================
// EDITOR
// ============================================================================

/// Core document state as the store holds it
#[derive(Debug, Clone, Default)]
pub struct RawEditorState {
    /// Container records, possibly malformed
    pub containers: Vec<Value>,
    /// Paragraph records, possibly malformed
    pub paragraphs: Vec<Value>,
    /// Content the store last generated or received
    pub completed_content: String,
    pub is_completed: bool,
}

/// Transient selection state of the editor UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawUiState {
    pub active_paragraph_id: Option<String>,
    pub selected_paragraph_ids: Vec<String>,
    pub is_preview_open: bool,
}

/// Write-back capabilities of an editor store
#[derive(Clone, Default)]
pub struct EditorSetters {
    pub set_completed_content: Option<ContentSetter>,
    pub set_is_completed: Option<FlagSetter>,
}

/// Document editor state owner
pub trait EditorStore: Send + Sync {
    /// Containers, paragraphs and generated content
    fn core_state(&self) -> anyhow::Result<RawEditorState>;

    /// Selection and preview state
    fn ui_state(&self) -> anyhow::Result<RawUiState>;

    /// Setter handles; absent ones are `None`
    fn setters(&self) -> EditorSetters;
}

// ============================================================================
// MULTI-STEP FORM
// ============================================================================

/// Form state as the store holds it; every field may be missing or mistyped
#[derive(Debug, Clone, Default)]
pub struct RawFormState {
    /// Field record, expected to be a JSON object
    pub form_values: Option<Value>,
    pub current_step: Option<Value>,
    pub progress_percentage: Option<Value>,
    pub show_preview: Option<Value>,
    pub editor_completed_content: Option<Value>,
    pub is_editor_completed: Option<Value>,
    /// Store-side modification time (ms since epoch)
    pub last_updated: Option<Value>,
}

/// Update mechanisms a form store may expose
#[derive(Clone, Default)]
pub struct FormUpdateFunctions {
    pub set_editor_content: Option<ContentSetter>,
    pub set_editor_completed: Option<FlagSetter>,
    pub set_form_value: Option<FieldSetter>,
}

impl FormUpdateFunctions {
    /// Names of the mechanisms that are present
    pub fn available(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.set_editor_content.is_some() {
            names.push("set_editor_content");
        }
        if self.set_editor_completed.is_some() {
            names.push("set_editor_completed");
        }
        if self.set_form_value.is_some() {
            names.push("set_form_value");
        }
        names
    }
}

/// Multi-step form state owner
pub trait FormStore: Send + Sync {
    /// Current field values and progress
    fn form_state(&self) -> anyhow::Result<RawFormState>;

    /// Update handles; absent ones are `None`
    fn update_functions(&self) -> FormUpdateFunctions;
}
