//! # Transformation Engine
//!
//! Converts snapshots between the document editor and the multi-step form.
//! The engine is pure with respect to the stores: it receives snapshots and
//! returns result records, never touching either side directly.
//!
//! ## Editor → form strategies
//!
//! | Strategy                  | Content source                                         |
//! |---------------------------|--------------------------------------------------------|
//! | `EXISTING_CONTENT`        | the snapshot's generated content, verbatim             |
//! | `REBUILD_FROM_CONTAINERS` | containers in order, each under a `## name` heading    |
//! | `PARAGRAPH_FALLBACK`      | unassigned paragraphs in order, blank-line separated   |
//! | `AUTO`                    | existing content if present, otherwise a rebuild       |
//!
//! ## Caching
//!
//! Each direction keeps a cache keyed by an xxh3 fingerprint of the input
//! snapshot and strategy. Reads check the TTL and then re-verify the cached
//! result's significant fields against the fingerprint taken at insertion;
//! anything stale or altered is evicted and recomputed.
//!
//! ```rust
//! use config::TransformationSettings;
//! use transform::TransformEngine;
//! use types::{Container, EditorStateSnapshot, ParagraphBlock, TransformationStrategy};
//!
//! let mut snapshot = EditorStateSnapshot::fallback(1_700_000_000_000);
//! snapshot.metadata.flags.clear();
//! snapshot.containers = vec![Container::new("c1", "Intro", 1)];
//! snapshot.paragraphs = vec![ParagraphBlock::new("p1", "Hello", Some("c1"), 1)];
//!
//! let engine = TransformEngine::default();
//! let options = TransformationSettings::default()
//!     .with_strategy(TransformationStrategy::RebuildFromContainers);
//! let result = engine.transform_editor_to_form(&snapshot, &options);
//!
//! assert!(result.transformation_success);
//! assert_eq!(result.transformed_content, "## Intro\n\nHello");
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod hash;
pub mod strategy;

pub use cache::{CacheCounters, Verifiable, VerifiedCache};
pub use engine::{CacheStats, SweeperHandle, TransformEngine};
pub use error::{Result, TransformError};
pub use hash::{content_fingerprint, fingerprint, fingerprint_of, integrity_descriptor};
pub use strategy::StrategyOutcome;
