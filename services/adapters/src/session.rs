//! # Bridge Session
//!
//! Composition root owning one editor adapter, one multi-step adapter and
//! one transformation engine. Callers create as many sessions as they need;
//! nothing here is global.
//!
//! A sync extracts from the source adapter, validates, transforms, and
//! writes into the target adapter, in that order, within one call.

use crate::editor::EditorAdapter;
use crate::monitor::HealthMonitor;
use crate::multi_step::MultiStepAdapter;
use crate::stores::{EditorStore, FormStore};
use crate::BaseAdapter;
use config::{BridgeSettings, TransformationSettings};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};
use transform::{SweeperHandle, TransformEngine};
use types::{current_millis, EditorToFormResult, FormToEditorResult};

/// Result of one sync and whether the target store accepted it
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome<R> {
    pub result: R,
    pub applied: bool,
}

struct BackgroundTasks {
    editor_monitor: HealthMonitor,
    form_monitor: HealthMonitor,
    sweeper: SweeperHandle,
}

/// Editor ↔ form bridge instance
pub struct BridgeSession {
    settings: BridgeSettings,
    editor: Arc<EditorAdapter>,
    multi_step: Arc<MultiStepAdapter>,
    engine: Arc<TransformEngine>,
    background: Mutex<Option<BackgroundTasks>>,
}

impl BridgeSession {
    pub fn new(
        settings: BridgeSettings,
        editor_store: Arc<dyn EditorStore>,
        form_store: Arc<dyn FormStore>,
    ) -> Self {
        Self {
            editor: Arc::new(BaseAdapter::editor(editor_store, settings.editor.clone())),
            multi_step: Arc::new(BaseAdapter::multi_step(
                form_store,
                settings.multi_step.clone(),
            )),
            engine: Arc::new(TransformEngine::new(settings.transformation.clone())),
            settings,
            background: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn editor(&self) -> &Arc<EditorAdapter> {
        &self.editor
    }

    pub fn multi_step(&self) -> &Arc<MultiStepAdapter> {
        &self.multi_step
    }

    pub fn engine(&self) -> &Arc<TransformEngine> {
        &self.engine
    }

    /// Connect both adapters concurrently; `true` only if both connected
    pub async fn connect_all(&self) -> bool {
        let (editor, form) = tokio::join!(self.editor.connect(), self.multi_step.connect());
        info!(editor, form, "Bridge connection finished");
        editor && form
    }

    /// Stop background tasks and disconnect both adapters
    pub async fn disconnect_all(&self) {
        self.stop_background().await;
        tokio::join!(self.editor.disconnect(), self.multi_step.disconnect());
    }

    /// Editor → form with the session's transformation settings
    pub async fn sync_editor_to_form(&self) -> Option<SyncOutcome<EditorToFormResult>> {
        let options = self.engine.settings().clone();
        self.sync_editor_to_form_with(&options).await
    }

    /// Editor → form with explicit transformation options
    ///
    /// `None` when no editor snapshot could be extracted. A snapshot that
    /// fails validation yields a failed result that is not applied.
    pub async fn sync_editor_to_form_with(
        &self,
        options: &TransformationSettings,
    ) -> Option<SyncOutcome<EditorToFormResult>> {
        let snapshot = self.editor.extract_data().await?;

        let report = self.editor.validate_data(&snapshot);
        if !report.is_valid_for_transfer {
            warn!(errors = ?report.validation_errors, "Editor snapshot rejected");
            return Some(SyncOutcome {
                result: EditorToFormResult::failure(
                    report.validation_errors.join("; "),
                    options.strategy,
                    current_millis(),
                ),
                applied: false,
            });
        }

        let result = self.engine.transform_editor_to_form(&snapshot, options);
        let applied = result.transformation_success
            && self
                .multi_step
                .update_from_transformation_result(&result)
                .await;

        info!(
            success = result.transformation_success,
            applied,
            strategy = %result.strategy,
            "Editor to form sync finished"
        );
        Some(SyncOutcome { result, applied })
    }

    /// Form → editor with the session's transformation settings
    ///
    /// `None` when no form snapshot could be extracted.
    pub async fn sync_form_to_editor(&self) -> Option<SyncOutcome<FormToEditorResult>> {
        let snapshot = self.multi_step.extract_data().await?;

        let report = self.multi_step.validate_data(&snapshot);
        for warning in &report.validation_warnings {
            warn!("Form snapshot warning: {}", warning);
        }

        let result = self
            .engine
            .transform_form_to_editor(&snapshot, self.engine.settings());
        let applied =
            result.transformation_success && self.editor.apply_form_result(&result).await;

        info!(
            success = result.transformation_success,
            applied,
            "Form to editor sync finished"
        );
        Some(SyncOutcome { result, applied })
    }

    /// Disconnect, then drop cached results, metrics and listeners
    pub async fn reset(&self) {
        self.disconnect_all().await;
        self.engine.clear_cache();
        self.editor.reset_metrics();
        self.multi_step.reset_metrics();
        self.multi_step.clear_listeners();
        info!("Bridge session reset");
    }

    /// Start health monitors for both adapters and the engine's cache
    /// sweeper; a second call is a no-op
    pub fn start_background(&self) {
        let mut background = self.background.lock();
        if background.is_some() {
            return;
        }

        *background = Some(BackgroundTasks {
            editor_monitor: HealthMonitor::spawn(
                &self.editor,
                self.settings.editor.health_check_interval(),
            ),
            form_monitor: HealthMonitor::spawn(
                &self.multi_step,
                self.settings.multi_step.health_check_interval(),
            ),
            sweeper: self
                .engine
                .spawn_sweeper(self.settings.transformation.sweep_interval()),
        });
    }

    pub fn is_background_running(&self) -> bool {
        self.background.lock().is_some()
    }

    /// Stop background tasks and wait for them to exit
    pub async fn stop_background(&self) {
        let tasks = self.background.lock().take();
        if let Some(tasks) = tasks {
            tasks.editor_monitor.shutdown().await;
            tasks.form_monitor.shutdown().await;
            tasks.sweeper.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{InMemoryEditorStore, InMemoryFormStore};
    use types::{Container, ParagraphBlock};

    fn session() -> (BridgeSession, InMemoryEditorStore, InMemoryFormStore) {
        let editor = InMemoryEditorStore::with_document(
            &[Container::new("c1", "Intro", 1)],
            &[ParagraphBlock::new("p1", "Hello", Some("c1"), 1)],
        )
        .unwrap();
        let form = InMemoryFormStore::new();
        let session = BridgeSession::new(
            BridgeSettings::default(),
            Arc::new(editor.clone()),
            Arc::new(form.clone()),
        );
        (session, editor, form)
    }

    #[tokio::test]
    async fn test_sync_before_connect_extracts_nothing() {
        let (session, editor, _form) = session();

        assert!(session.sync_editor_to_form().await.is_none());
        assert!(session.sync_form_to_editor().await.is_none());
        assert_eq!(editor.core_reads(), 0);
    }

    #[tokio::test]
    async fn test_editor_to_form_applies_content() {
        let (session, _editor, form) = session();
        assert!(session.connect_all().await);

        let outcome = session.sync_editor_to_form().await.unwrap();

        assert!(outcome.applied);
        assert!(outcome.result.transformation_success);
        assert_eq!(form.editor_content(), "## Intro\n\nHello");
    }

    #[tokio::test]
    async fn test_invalid_snapshot_is_not_applied() {
        let (session, editor, form) = session();
        assert!(session.connect_all().await);
        editor.set_available(false);

        let outcome = session.sync_editor_to_form().await.unwrap();

        assert!(!outcome.applied);
        assert!(!outcome.result.transformation_success);
        assert_eq!(form.editor_content(), "");
    }

    #[tokio::test]
    async fn test_background_tasks_start_once_and_stop() {
        let (session, _editor, _form) = session();
        session.start_background();
        session.start_background();
        assert!(session.is_background_running());

        session.reset().await;

        assert!(!session.is_background_running());
        assert!(!session.editor().is_connected());
    }
}
