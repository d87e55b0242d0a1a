//! # Bridge Adapters - Editor ↔ Multi-Step Form Lifecycle Layer
//!
//! ## Purpose
//!
//! Uniform lifecycle wrappers around the two state owners of the bridge: the
//! document editor store and the multi-step form store. Each adapter can
//! connect, health-check, extract, update, validate and snapshot its store,
//! and never lets a failure escape its public surface.
//!
//! ## Integration Points
//!
//! - **Stores**: [`stores::EditorStore`] and [`stores::FormStore`] ports; the
//!   in-memory implementations in [`stores::memory`] back tests and the
//!   `bridge_probe` binary
//! - **Transformation**: [`BridgeSession`] feeds snapshots through
//!   `transform::TransformEngine` and writes the results back
//! - **Resilience**: connection attempts go through `resilience::with_timeout`
//!   and `resilience::with_retry`; failures are classified for diagnostics
//! - **Configuration**: every timeout, retry and TTL comes from
//!   `config::AdapterSettings`
//!
//! ## Architecture Role
//!
//! ```text
//! EditorStore ◄──► EditorAdapter ◄──► TransformEngine ◄──► MultiStepAdapter ◄──► FormStore
//!                  └──────────────── BridgeSession ────────────────┘
//! ```
//!
//! [`BaseAdapter`] owns the shared lifecycle; a [`BridgeBackend`] supplies the
//! seven store-specific primitives. [`EditorAdapter`] and [`MultiStepAdapter`]
//! are `BaseAdapter` over [`EditorBackend`] and [`MultiStepBackend`].
//!
//! ## Failure Contract
//!
//! | Operation        | On failure                               |
//! |------------------|------------------------------------------|
//! | `connect`        | `false` after all retry attempts         |
//! | `disconnect`     | always completes                         |
//! | `health_check`   | `false`, connection kept                 |
//! | `extract_data`   | `None`, or a fallback snapshot (editor)  |
//! | `update_data`    | `false`                                  |
//! | `validate_data`  | report listing errors and warnings       |
//!
//! ## Example
//!
//! ```rust,no_run
//! use bridge_adapters::stores::{InMemoryEditorStore, InMemoryFormStore};
//! use bridge_adapters::BridgeSession;
//! use config::BridgeSettings;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let session = BridgeSession::new(
//!     BridgeSettings::default(),
//!     Arc::new(InMemoryEditorStore::new()),
//!     Arc::new(InMemoryFormStore::new()),
//! );
//! if session.connect_all().await {
//!     if let Some(outcome) = session.sync_editor_to_form().await {
//!         println!("applied: {}", outcome.applied);
//!     }
//! }
//! # }
//! ```

pub mod base;
pub mod cache;
pub mod circuit_breaker;
pub mod common;
pub mod editor;
pub mod error;
pub mod monitor;
pub mod multi_step;
pub mod session;
pub mod stores;

pub use base::{BaseAdapter, BridgeBackend};
pub use cache::DataCache;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
pub use common::{
    coerce_primitive, AdapterInfo, ConnectionPhase, ConnectionState, ErrorDetails,
    PerformanceMetrics,
};
pub use editor::{EditorAdapter, EditorBackend, EDITOR_ADAPTER_NAME};
pub use error::{AdapterError, Result};
pub use monitor::HealthMonitor;
pub use multi_step::{
    FormStateEvent, FormStateListener, ListenerId, MultiStepAdapter, MultiStepBackend,
    MULTI_STEP_ADAPTER_NAME,
};
pub use session::{BridgeSession, SyncOutcome};
