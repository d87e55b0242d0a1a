//! Bidirectional transformation engine

use crate::cache::{CacheCounters, VerifiedCache};
use crate::error::{Result, TransformError};
use crate::hash::{content_fingerprint, fingerprint_of, integrity_descriptor, to_hex};
use crate::strategy;
use config::TransformationSettings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::{
    current_millis, ContentMetadata, EditorStateSnapshot, EditorToFormResult, FormToEditorResult,
    MultiStepFormSnapshot, TransformationMetadata, TransformationStrategy,
};

pub const WARNING_NO_CONTAINERS: &str = "no containers";
pub const WARNING_UNASSIGNED_PARAGRAPHS: &str = "unassigned paragraphs exist";
pub const WARNING_EMPTY_RESULT: &str = "empty result";

/// Aggregated cache counters for both directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub editor_to_form_entries: usize,
    pub form_to_editor_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub integrity_evictions: u64,
}

impl CacheStats {
    fn combine(editor: CacheCounters, form: CacheCounters) -> Self {
        Self {
            editor_to_form_entries: editor.entries,
            form_to_editor_entries: form.entries,
            hits: editor.hits + form.hits,
            misses: editor.misses + form.misses,
            expirations: editor.expirations + form.expirations,
            integrity_evictions: editor.integrity_evictions + form.integrity_evictions,
        }
    }
}

/// Converts snapshots between the editor and form domains
///
/// Holds no store references. Each direction has its own verified cache;
/// expiry happens lazily on access, through [`TransformEngine::sweep_expired`],
/// or through a sweeper bound to the engine's lifetime.
pub struct TransformEngine {
    settings: TransformationSettings,
    editor_to_form: VerifiedCache<EditorToFormResult>,
    form_to_editor: VerifiedCache<FormToEditorResult>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(TransformationSettings::default())
    }
}

impl TransformEngine {
    pub fn new(settings: TransformationSettings) -> Self {
        let ttl = settings.cache_ttl();
        Self {
            settings,
            editor_to_form: VerifiedCache::new("editor_to_form", ttl),
            form_to_editor: VerifiedCache::new("form_to_editor", ttl),
        }
    }

    /// Settings the engine was built with
    pub fn settings(&self) -> &TransformationSettings {
        &self.settings
    }

    /// Derive form content from an editor snapshot
    ///
    /// Never fails: any error becomes a result with
    /// `transformation_success = false` and a single error string.
    pub fn transform_editor_to_form(
        &self,
        snapshot: &EditorStateSnapshot,
        options: &TransformationSettings,
    ) -> EditorToFormResult {
        match self.try_editor_to_form(snapshot, options) {
            Ok(result) => result,
            Err(e) => {
                warn!("Editor to form transformation failed: {}", e);
                EditorToFormResult::failure(e.to_string(), options.strategy, current_millis())
            }
        }
    }

    /// Derive editor content from a form snapshot
    pub fn transform_form_to_editor(
        &self,
        snapshot: &MultiStepFormSnapshot,
        options: &TransformationSettings,
    ) -> FormToEditorResult {
        match self.try_form_to_editor(snapshot, options) {
            Ok(result) => result,
            Err(e) => {
                warn!("Form to editor transformation failed: {}", e);
                FormToEditorResult::failure(e.to_string(), current_millis())
            }
        }
    }

    fn try_editor_to_form(
        &self,
        snapshot: &EditorStateSnapshot,
        options: &TransformationSettings,
    ) -> Result<EditorToFormResult> {
        let started = Instant::now();
        validate_editor_snapshot(snapshot)?;

        let key = if options.enable_caching {
            Some(editor_cache_key(snapshot, options)?)
        } else {
            None
        };
        if let Some(cached) = key.and_then(|k| self.editor_to_form.get(k)) {
            debug!("Editor to form cache hit ({})", cached.strategy);
            return Ok(cached);
        }

        let outcome = strategy::apply(snapshot, options.strategy, options.min_existing_content_len);
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let metadata = if options.include_metadata {
            describe_transformation(snapshot, &outcome.content, processing_time_ms)
        } else {
            TransformationMetadata {
                processing_time_ms,
                ..Default::default()
            }
        };

        let result = EditorToFormResult {
            transformed_content: outcome.content,
            transformed_is_completed: snapshot.is_completed,
            transformation_success: true,
            transformation_errors: Vec::new(),
            strategy: outcome.strategy,
            transformed_at: current_millis(),
            metadata,
        };

        if options.validate_result {
            validate_editor_result(&result)?;
        }

        if let Some(key) = key {
            self.editor_to_form
                .insert(key, result.clone(), outcome.strategy);
        }

        debug!(
            "Editor to form transformed with {} ({} chars)",
            result.strategy,
            result.transformed_content.len()
        );
        Ok(result)
    }

    fn try_form_to_editor(
        &self,
        snapshot: &MultiStepFormSnapshot,
        options: &TransformationSettings,
    ) -> Result<FormToEditorResult> {
        let started = Instant::now();
        validate_form_snapshot(snapshot)?;

        let key = if options.enable_caching {
            Some(fingerprint_of(&(
                snapshot,
                TransformationStrategy::ExistingContent,
            ))?)
        } else {
            None
        };
        if let Some(cached) = key.and_then(|k| self.form_to_editor.get(k)) {
            debug!("Form to editor cache hit");
            return Ok(cached);
        }

        let content = if snapshot.editor_completed_content.is_empty() {
            snapshot.form_values.editor_completed_content.clone()
        } else {
            snapshot.editor_completed_content.clone()
        };
        let is_completed = snapshot.is_editor_completed || snapshot.form_values.is_editor_completed;
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let quality_metrics = if options.include_metadata {
            quality_metrics(&content, snapshot)
        } else {
            BTreeMap::new()
        };

        let result = FormToEditorResult {
            content_metadata: ContentMetadata {
                content_length: content.len(),
                is_completed,
                transformation_success: true,
                processing_time_ms,
                integrity_descriptor: integrity_descriptor(&content, is_completed),
            },
            integrity_hash: to_hex(content_fingerprint(&content, is_completed)),
            editor_content: content,
            editor_is_completed: is_completed,
            transformation_success: true,
            transformation_errors: Vec::new(),
            strategy: TransformationStrategy::ExistingContent,
            transformed_at: current_millis(),
            quality_metrics,
        };

        if let Some(key) = key {
            self.form_to_editor
                .insert(key, result.clone(), TransformationStrategy::ExistingContent);
        }

        Ok(result)
    }

    /// Current cache counters
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats::combine(self.editor_to_form.counters(), self.form_to_editor.counters())
    }

    /// Evict TTL-expired entries from both caches
    pub fn sweep_expired(&self) -> usize {
        self.editor_to_form.sweep_expired() + self.form_to_editor.sweep_expired()
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        self.editor_to_form.clear();
        self.form_to_editor.clear();
        debug!("Transformation caches cleared");
    }

    /// Sweep both caches every `interval` for as long as the engine lives
    ///
    /// The task holds only a weak reference and exits once the engine is
    /// dropped, [`SweeperHandle::shutdown`] is called, or the handle is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let engine: Weak<Self> = Arc::downgrade(self);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        let Some(engine) = engine.upgrade() else {
                            break;
                        };
                        let removed = engine.sweep_expired();
                        if removed > 0 {
                            debug!("Cache sweep evicted {} expired entries", removed);
                        }
                    }
                }
            }
            debug!("Cache sweeper stopped");
        });

        info!("Cache sweeper started ({}ms interval)", period.as_millis());
        SweeperHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    #[cfg(test)]
    pub(crate) fn editor_cache(&self) -> &VerifiedCache<EditorToFormResult> {
        &self.editor_to_form
    }
}

/// Handle to a running cache sweeper; dropping it stops the task
pub struct SweeperHandle {
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn editor_cache_key(snapshot: &EditorStateSnapshot, options: &TransformationSettings) -> Result<u64> {
    fingerprint_of(&(snapshot, options.strategy, options.min_existing_content_len))
}

fn validate_editor_snapshot(snapshot: &EditorStateSnapshot) -> Result<()> {
    if snapshot.extracted_at <= 0 {
        return Err(TransformError::InvalidSnapshot(format!(
            "extraction timestamp must be positive, got {}",
            snapshot.extracted_at
        )));
    }
    if snapshot.is_fallback() {
        return Err(TransformError::InvalidSnapshot(
            "fallback snapshot carries no editor state".to_string(),
        ));
    }
    Ok(())
}

fn validate_form_snapshot(snapshot: &MultiStepFormSnapshot) -> Result<()> {
    if snapshot.snapshot_timestamp <= 0 {
        return Err(TransformError::InvalidSnapshot(format!(
            "snapshot timestamp must be positive, got {}",
            snapshot.snapshot_timestamp
        )));
    }
    if !snapshot.has_valid_step() {
        return Err(TransformError::InvalidSnapshot(format!(
            "step {} is out of range",
            snapshot.current_step
        )));
    }
    Ok(())
}

fn validate_editor_result(result: &EditorToFormResult) -> Result<()> {
    if result.strategy == TransformationStrategy::Auto {
        return Err(TransformError::InvalidResult(
            "strategy was not resolved".to_string(),
        ));
    }
    if result.transformation_success && !result.transformation_errors.is_empty() {
        return Err(TransformError::InvalidResult(
            "successful result carries errors".to_string(),
        ));
    }
    Ok(())
}

fn describe_transformation(
    snapshot: &EditorStateSnapshot,
    content: &str,
    processing_time_ms: f64,
) -> TransformationMetadata {
    let assigned = snapshot.paragraphs.iter().filter(|p| p.is_assigned()).count();
    let unassigned = snapshot.paragraphs.len() - assigned;

    let mut warnings = BTreeSet::new();
    if snapshot.containers.is_empty() {
        warnings.insert(WARNING_NO_CONTAINERS.to_string());
    }
    if unassigned > 0 {
        warnings.insert(WARNING_UNASSIGNED_PARAGRAPHS.to_string());
    }
    if content.trim().is_empty() {
        warnings.insert(WARNING_EMPTY_RESULT.to_string());
    }

    TransformationMetadata {
        container_count: snapshot.containers.len(),
        paragraph_count: snapshot.paragraphs.len(),
        assigned_paragraph_count: assigned,
        unassigned_paragraph_count: unassigned,
        total_content_length: content.len(),
        processing_time_ms,
        validation_warnings: warnings,
    }
}

fn quality_metrics(content: &str, snapshot: &MultiStepFormSnapshot) -> BTreeMap<String, f64> {
    let paragraphs = content
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .count();

    let mut metrics = BTreeMap::new();
    metrics.insert("contentLength".to_string(), content.len() as f64);
    metrics.insert("wordCount".to_string(), content.split_whitespace().count() as f64);
    metrics.insert("paragraphCount".to_string(), paragraphs as f64);
    metrics.insert(
        "hasContent".to_string(),
        if content.trim().is_empty() { 0.0 } else { 1.0 },
    );
    metrics.insert(
        "formCompletion".to_string(),
        snapshot.form_values.completion_percentage(),
    );
    metrics
}
