//! Editor-domain model: containers, paragraphs and the extracted snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Flag carried by snapshots produced after an extraction failure
pub const FALLBACK_SNAPSHOT_FLAG: &str = "FALLBACK_SNAPSHOT";

/// A named section of the document
///
/// `id` and `order` are unique within a valid document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Stable identifier
    pub id: String,
    /// Heading rendered above the container's paragraphs
    pub name: String,
    /// Position of the container within the document
    pub order: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Container {
    /// Create a container stamped with the current time
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            order,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single paragraph, optionally owned by a container
///
/// `order` is only meaningful among paragraphs of the same container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphBlock {
    /// Stable identifier
    pub id: String,
    /// Raw paragraph text
    pub content: String,
    /// Owning container, `None` for unassigned paragraphs
    pub container_id: Option<String>,
    /// Position within the owning container
    pub order: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl ParagraphBlock {
    /// Create a paragraph stamped with the current time
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        container_id: Option<&str>,
        order: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            content: content.into(),
            container_id: container_id.map(str::to_string),
            order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the paragraph belongs to a container
    pub fn is_assigned(&self) -> bool {
        self.container_id.is_some()
    }

    /// Whether the paragraph belongs to the given container
    pub fn belongs_to(&self, container_id: &str) -> bool {
        self.container_id.as_deref() == Some(container_id)
    }
}

/// Bookkeeping attached to every editor snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshotMetadata {
    /// Time spent building the snapshot
    pub processing_duration_ms: f64,
    /// True when the snapshot carries non-empty generated content
    pub data_integrity: bool,
    pub container_count: usize,
    pub paragraph_count: usize,
    pub assigned_paragraph_count: usize,
    pub unassigned_paragraph_count: usize,
    pub content_length: usize,
    /// Free-form markers such as [`FALLBACK_SNAPSHOT_FLAG`]
    pub flags: BTreeSet<String>,
}

impl EditorSnapshotMetadata {
    /// Derive counts from the snapshot contents
    pub fn describe(
        containers: &[Container],
        paragraphs: &[ParagraphBlock],
        content: &str,
        processing_duration_ms: f64,
    ) -> Self {
        let assigned = paragraphs.iter().filter(|p| p.is_assigned()).count();
        Self {
            processing_duration_ms,
            data_integrity: !content.trim().is_empty(),
            container_count: containers.len(),
            paragraph_count: paragraphs.len(),
            assigned_paragraph_count: assigned,
            unassigned_paragraph_count: paragraphs.len() - assigned,
            content_length: content.len(),
            flags: BTreeSet::new(),
        }
    }
}

/// Immutable projection of the document editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorStateSnapshot {
    pub containers: Vec<Container>,
    pub paragraphs: Vec<ParagraphBlock>,
    /// Content generated from the containers and paragraphs
    pub completed_content: String,
    pub is_completed: bool,
    pub active_paragraph_id: Option<String>,
    pub selected_paragraph_ids: Vec<String>,
    pub is_preview_open: bool,
    /// Extraction time in milliseconds since the Unix epoch
    pub extracted_at: i64,
    pub metadata: EditorSnapshotMetadata,
}

impl EditorStateSnapshot {
    /// Deterministic empty snapshot returned when extraction fails
    pub fn fallback(extracted_at: i64) -> Self {
        let mut metadata = EditorSnapshotMetadata::default();
        metadata.flags.insert(FALLBACK_SNAPSHOT_FLAG.to_string());

        Self {
            containers: Vec::new(),
            paragraphs: Vec::new(),
            completed_content: String::new(),
            is_completed: false,
            active_paragraph_id: None,
            selected_paragraph_ids: Vec::new(),
            is_preview_open: false,
            extracted_at,
            metadata,
        }
    }

    /// Whether this snapshot is the extraction fallback
    pub fn is_fallback(&self) -> bool {
        self.metadata.flags.contains(FALLBACK_SNAPSHOT_FLAG)
    }

    /// Paragraphs without an owning container
    pub fn unassigned_paragraphs(&self) -> impl Iterator<Item = &ParagraphBlock> {
        self.paragraphs.iter().filter(|p| !p.is_assigned())
    }
}
