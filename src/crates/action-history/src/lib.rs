//! # action-history - Undo/Redo Timeline for the Forecasting Dashboard
//!
//! **Session-scoped, in-memory history of user actions** with non-destructive
//! undo and redo, and jumps to any recorded point. Every dashboard flow that
//! changes state (uploading a dataset, cleaning it, editing the forecast
//! configuration, running or comparing models, exporting) records an
//! [`Action`] here; the undo/redo controls and the history timeline drive the
//! store back and forth.
//!
//! ## Overview
//!
//! - **Linear timeline** - One ordered list of actions plus a cursor. Recording
//!   after an undo discards the redo future, as in any editor.
//! - **Delta replay** - Actions are deltas over mutable application state, not
//!   snapshots. Undo, redo and jumps are sequences of single-action calls into
//!   an [`ActionExecutor`].
//! - **Confirmed moves** - The cursor moves only after the executor confirms
//!   a step, so the recorded timeline never runs ahead of real state.
//! - **Serialized intents** - One intent at a time; overlapping intents are
//!   rejected or queued ([`BusyPolicy`]).
//! - **Observable** - Every committed change is broadcast as a
//!   [`HistoryEvent`] and published as the latest [`HistorySnapshot`].
//! - **Ephemeral** - Nothing is persisted; dropping the store ends the history.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use action_history::{Action, ActionType, HistoryStore, testing::RecordingExecutor};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = HistoryStore::new(RecordingExecutor::new());
//!
//!     let upload = Action::new(ActionType::DataUpload, "Uploaded sales.csv", json!({"rows": 365}))
//!         .with_inverse(json!({"rows": 0}));
//!     let upload_id = upload.id;
//!     store.record(upload).await?;
//!
//!     store
//!         .record(
//!             Action::new(ActionType::ConfigChange, "Horizon 30 days", json!({"horizon": 30}))
//!                 .with_inverse(json!({"horizon": 14})),
//!         )
//!         .await?;
//!
//!     store.undo().await?;
//!     store.redo().await?;
//!     store.jump_to(upload_id).await?;
//!
//!     let state = store.describe_state();
//!     println!("cursor: {:?}, can redo: {}", state.cursor, state.can_redo);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`action`] - [`Action`], [`ActionId`], [`ActionType`]
//! - [`history`] - [`History`] aggregate and [`HistorySnapshot`]
//! - [`executor`] - [`ActionExecutor`] contract
//! - [`store`] - [`HistoryStore`]
//! - [`events`] - [`HistoryEvent`] notifications
//! - [`config`] - [`HistoryConfig`] loading and validation
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - [`HistoryError`]
//! - [`testing`] - [`RecordingExecutor`](testing::RecordingExecutor) for tests

pub mod action;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod history;
pub mod logging;
pub mod store;
pub mod testing;

// Re-export main types
pub use action::{Action, ActionId, ActionType, Payload};
pub use config::{BusyPolicy, FromEnv, HistoryConfig, LogFormat, LoggingConfig, ValidateConfig};
pub use error::{HistoryError, Result};
pub use events::{HistoryEvent, HistoryOperation};
pub use executor::{ActionExecutor, Direction, ExecutorFailure, ExecutorResult};
pub use history::{History, HistorySnapshot, PushOutcome};
pub use logging::init_logging;
pub use store::HistoryStore;
