//! # Editor Adapter
//!
//! Wraps the document editor store. Extraction parses the raw container and
//! paragraph records, regenerates the completed content and assembles an
//! [`EditorStateSnapshot`]. Any failure on the way yields
//! [`EditorStateSnapshot::fallback`] rather than an error.

use crate::base::{BaseAdapter, BridgeBackend};
use crate::error::{AdapterError, Result};
use crate::stores::EditorStore;
use async_trait::async_trait;
use config::AdapterSettings;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use types::{
    current_millis, Container, ContentGenerator, DocumentValidator, EditorSnapshotMetadata,
    EditorStateSnapshot, FormToEditorResult, ParagraphBlock, SectionedContentGenerator,
    StructuralValidator, ValidationResult, FALLBACK_SNAPSHOT_FLAG,
};

/// Name reported by the editor adapter
pub const EDITOR_ADAPTER_NAME: &str = "editor";

/// Editor adapter: the shared lifecycle around an [`EditorBackend`]
pub type EditorAdapter = BaseAdapter<EditorBackend>;

/// Editor-store primitives
pub struct EditorBackend {
    store: Arc<dyn EditorStore>,
    generator: Arc<dyn ContentGenerator>,
    validator: Arc<dyn DocumentValidator>,
    auto_validation: bool,
}

impl EditorBackend {
    /// Backend with the default generator and validator
    pub fn new(store: Arc<dyn EditorStore>, settings: &AdapterSettings) -> Self {
        Self {
            store,
            generator: Arc::new(SectionedContentGenerator),
            validator: Arc::new(StructuralValidator),
            auto_validation: settings.enable_auto_validation,
        }
    }

    /// Replace the content generator
    pub fn with_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replace the document validator
    pub fn with_validator(mut self, validator: Arc<dyn DocumentValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn store(&self) -> &Arc<dyn EditorStore> {
        &self.store
    }

    fn build_snapshot(&self) -> Result<EditorStateSnapshot> {
        let started = Instant::now();
        let core = self.store.core_state().map_err(AdapterError::store)?;
        let ui = self.store.ui_state().map_err(AdapterError::store)?;

        let containers: Vec<Container> = parse_entries(core.containers, "container");
        let paragraphs: Vec<ParagraphBlock> = parse_entries(core.paragraphs, "paragraph");

        let generated = match self.generator.generate(&containers, &paragraphs) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Content generator failed, concatenating locally");
                concatenate_locally(&containers, &paragraphs)
            }
        };
        let completed_content = if generated.trim().is_empty() {
            core.completed_content
        } else {
            generated
        };

        let metadata = EditorSnapshotMetadata::describe(
            &containers,
            &paragraphs,
            &completed_content,
            started.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(EditorStateSnapshot {
            containers,
            paragraphs,
            completed_content,
            is_completed: core.is_completed,
            active_paragraph_id: ui.active_paragraph_id,
            selected_paragraph_ids: ui.selected_paragraph_ids,
            is_preview_open: ui.is_preview_open,
            extracted_at: current_millis(),
            metadata,
        })
    }
}

/// Parse raw records, dropping the ones that do not fit the type
fn parse_entries<T: DeserializeOwned>(raw: Vec<Value>, kind: &str) -> Vec<T> {
    let total = raw.len();
    let parsed: Vec<T> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(kind, index, error = %e, "Dropping malformed entry");
                None
            }
        })
        .collect();

    if parsed.len() < total {
        debug!(kind, kept = parsed.len(), total, "Malformed entries filtered");
    }
    parsed
}

/// Containers in order with their ordered paragraphs, then unassigned
/// paragraphs; no headings
fn concatenate_locally(containers: &[Container], paragraphs: &[ParagraphBlock]) -> String {
    let mut sorted_containers: Vec<&Container> = containers.iter().collect();
    sorted_containers.sort_by_key(|c| c.order);

    let mut blocks: Vec<&str> = Vec::with_capacity(paragraphs.len());
    for container in sorted_containers {
        let mut owned: Vec<&ParagraphBlock> =
            paragraphs.iter().filter(|p| p.belongs_to(&container.id)).collect();
        owned.sort_by_key(|p| p.order);
        blocks.extend(owned.iter().map(|p| p.content.trim()));
    }

    let mut unassigned: Vec<&ParagraphBlock> = paragraphs.iter().filter(|p| !p.is_assigned()).collect();
    unassigned.sort_by_key(|p| p.order);
    blocks.extend(unassigned.iter().map(|p| p.content.trim()));

    blocks.retain(|text| !text.is_empty());
    blocks.join("\n\n")
}

#[async_trait]
impl BridgeBackend for EditorBackend {
    type Data = EditorStateSnapshot;
    type Snapshot = EditorStateSnapshot;

    async fn perform_connection(&self) -> Result<()> {
        self.store.core_state().map_err(AdapterError::store)?;
        self.store.ui_state().map_err(AdapterError::store)?;
        Ok(())
    }

    async fn perform_disconnection(&self) -> Result<()> {
        debug!("Editor store released");
        Ok(())
    }

    async fn perform_health_check(&self) -> Result<bool> {
        Ok(self.store.core_state().is_ok() && self.store.ui_state().is_ok())
    }

    async fn extract_data_from_system(&self) -> Result<EditorStateSnapshot> {
        match self.build_snapshot() {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!(error = %e, "Editor extraction failed, returning fallback snapshot");
                Ok(EditorStateSnapshot::fallback(current_millis()))
            }
        }
    }

    /// Write content, then the completion flag
    ///
    /// The two writes are not atomic. If the flag write fails the new
    /// content is already in the store and the old flag stays beside it;
    /// the error names the failing setter.
    async fn update_data_to_system(&self, data: &EditorStateSnapshot) -> Result<bool> {
        let setters = self.store.setters();
        let (Some(set_content), Some(set_completed)) =
            (setters.set_completed_content, setters.set_is_completed)
        else {
            warn!("Editor store lacks a content or completion setter");
            return Ok(false);
        };

        set_content(data.completed_content.clone()).map_err(|e| AdapterError::SetterFailed {
            setter: "set_completed_content",
            reason: format!("{:#}", e),
        })?;
        set_completed(data.is_completed).map_err(|e| AdapterError::SetterFailed {
            setter: "set_is_completed",
            reason: format!("{:#}", e),
        })?;
        Ok(true)
    }

    fn validate_extracted_data(&self, data: &EditorStateSnapshot) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.extracted_at <= 0 {
            result.add_error("extractedAt", "extraction timestamp must be positive");
        }
        if data.is_fallback() {
            result.add_error("snapshot", "snapshot is an extraction fallback");
            result.set_flag(FALLBACK_SNAPSHOT_FLAG);
        }
        if data.containers.is_empty() {
            result.add_warning("no containers");
        }
        if data.paragraphs.is_empty() {
            result.add_warning("no paragraphs");
        }

        if self.auto_validation {
            for issue in self.validator.validate(&data.containers, &data.paragraphs) {
                if issue.is_error() {
                    result.add_error(issue.key(), issue.to_string());
                } else {
                    result.add_warning(issue.to_string());
                }
            }
            result.set_flag("AUTO_VALIDATED");
        }

        let stats = self.validator.statistics(&data.containers, &data.paragraphs);
        result.set_metric("containerCount", stats.container_count as f64);
        result.set_metric("paragraphCount", stats.paragraph_count as f64);
        result.set_metric("unassignedParagraphCount", stats.unassigned_paragraph_count as f64);
        result.set_metric("wordCount", stats.word_count as f64);
        result.set_metric("contentLength", data.completed_content.len() as f64);
        if stats.unassigned_paragraph_count > 0 {
            result.set_flag("HAS_UNASSIGNED_PARAGRAPHS");
        }

        result.has_minimum_content = !data.completed_content.trim().is_empty();
        result.has_required_structure = !data.containers.is_empty();
        result.finish()
    }

    fn create_data_snapshot(&self, data: &EditorStateSnapshot) -> EditorStateSnapshot {
        match serde_json::to_value(data).and_then(serde_json::from_value) {
            Ok(copy) => copy,
            Err(e) => {
                warn!(error = %e, "Editor snapshot copy failed, returning fallback snapshot");
                EditorStateSnapshot::fallback(current_millis())
            }
        }
    }

    fn cache_key(&self, data: &EditorStateSnapshot) -> Option<String> {
        (!data.is_fallback()).then(|| format!("editor_snapshot_{}", data.extracted_at))
    }
}

impl BaseAdapter<EditorBackend> {
    /// Editor adapter over `store` with the default collaborators
    pub fn editor(store: Arc<dyn EditorStore>, settings: AdapterSettings) -> Self {
        let backend = EditorBackend::new(store, &settings);
        BaseAdapter::new(backend, EDITOR_ADAPTER_NAME, env!("CARGO_PKG_VERSION"), settings)
    }

    /// Write a form → editor result into the store
    ///
    /// The current snapshot supplies everything except content and
    /// completion, which come from the result.
    pub async fn apply_form_result(&self, result: &FormToEditorResult) -> bool {
        if !result.transformation_success {
            debug!("Skipping unsuccessful form result");
            return false;
        }
        let Some(current) = self.extract_data().await else {
            return false;
        };

        let updated = EditorStateSnapshot {
            completed_content: result.editor_content.clone(),
            is_completed: result.editor_is_completed,
            ..current
        };
        self.update_data(&updated).await
    }
}
