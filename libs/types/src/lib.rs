//! # Bridge Types Library
//!
//! Shared data model for the editor ↔ multi-step form bridge.
//!
//! ## Design Philosophy
//!
//! - **Snapshots, not handles**: every extraction produces a fresh, immutable
//!   [`EditorStateSnapshot`] or [`MultiStepFormSnapshot`]; nothing here holds a
//!   reference back to the owning store
//! - **Boundary parsing**: raw store records are parsed into [`Container`] and
//!   [`ParagraphBlock`] once, at the adapter boundary, through serde
//! - **Reports, not panics**: validation produces a [`ValidationResult`]
//!   listing errors and warnings separately; nothing in this crate throws
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Container, ParagraphBlock, SectionedContentGenerator, ContentGenerator};
//!
//! let containers = vec![Container::new("intro", "Introduction", 1)];
//! let paragraphs = vec![ParagraphBlock::new("p1", "Hello world", Some("intro"), 1)];
//!
//! let content = SectionedContentGenerator
//!     .generate(&containers, &paragraphs)
//!     .unwrap();
//! assert!(content.starts_with("## Introduction"));
//! ```
//!
//! ## Integration Points
//!
//! - **Adapters** (`bridge-adapters`): produce and consume the snapshots
//! - **Transformation engine** (`transform`): converts snapshots between domains
//!   and reports through [`EditorToFormResult`] / [`FormToEditorResult`]

pub mod document;
pub mod editor;
pub mod form;
pub mod time;
pub mod transformation;
pub mod validation;

pub use document::{
    render_container_sections, ContentGenerator, DocumentError, DocumentIssue,
    DocumentStatistics, DocumentValidator, SectionedContentGenerator, StructuralValidator,
};
pub use editor::{
    Container, EditorSnapshotMetadata, EditorStateSnapshot, ParagraphBlock,
    FALLBACK_SNAPSHOT_FLAG,
};
pub use form::{FormValues, MultiStepFormSnapshot, MAX_STEP, MIN_STEP};
pub use time::current_millis;
pub use transformation::{
    ContentMetadata, EditorToFormResult, FormToEditorResult, TransformationMetadata,
    TransformationStrategy,
};
pub use validation::ValidationResult;
