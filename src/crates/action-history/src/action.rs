//! Action records kept in the history timeline
//!
//! An [`Action`] is one unit of user work in the dashboard: an upload, a
//! cleaning pass, a configuration edit, a forecast run, an export. The store
//! never interprets an action's payloads; it hands them back to the
//! [`ActionExecutor`](crate::executor::ActionExecutor) when the action has to
//! be re-applied or reverted.
//!
//! # Core Types
//!
//! - [`Action`] - A recorded unit of work with forward and (optional) inverse payloads
//! - [`ActionId`] - Unique, creation-ordered identifier
//! - [`ActionType`] - Closed set of action categories
//! - [`Payload`] - Opaque data owned by the action's producer
//!
//! # Example
//!
//! ```rust
//! use action_history::{Action, ActionType};
//! use serde_json::json;
//!
//! let action = Action::new(
//!     ActionType::ConfigChange,
//!     "Set horizon to 30 days",
//!     json!({"horizon": 30}),
//! )
//! .with_inverse(json!({"horizon": 14}));
//!
//! assert!(action.is_reversible());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque producer-defined data used to re-apply or revert an action
pub type Payload = serde_json::Value;

static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an action
///
/// Ids issued by [`ActionId::next`] increase monotonically for the lifetime of
/// the process, so they order actions by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(u64);

impl ActionId {
    /// Wrap an explicit id
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Issue a fresh id, greater than every id issued before it
    pub fn next() -> Self {
        Self(NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Category of user work an action represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A dataset was uploaded
    DataUpload,
    /// Cleaning applied to the dataset (outliers, missing values, ...)
    DataCleaning,
    /// A transformation applied to the dataset (log, differencing, ...)
    DataTransformation,
    /// Forecast configuration edited
    ConfigChange,
    /// A forecast was generated
    ForecastGeneration,
    /// Models were compared
    ModelComparison,
    /// Results were exported
    ExportOperation,
}

impl ActionType {
    /// All action types, in pipeline order
    pub const ALL: [ActionType; 7] = [
        ActionType::DataUpload,
        ActionType::DataCleaning,
        ActionType::DataTransformation,
        ActionType::ConfigChange,
        ActionType::ForecastGeneration,
        ActionType::ModelComparison,
        ActionType::ExportOperation,
    ];

    /// Human-readable label for timelines and menus
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::DataUpload => "Data Upload",
            ActionType::DataCleaning => "Data Cleaning",
            ActionType::DataTransformation => "Data Transformation",
            ActionType::ConfigChange => "Configuration Change",
            ActionType::ForecastGeneration => "Forecast Generation",
            ActionType::ModelComparison => "Model Comparison",
            ActionType::ExportOperation => "Export",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded unit of user work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique id; creation-ordered unless set through [`Action::with_id`]
    pub id: ActionId,

    /// Category of work
    #[serde(rename = "type")]
    pub action_type: ActionType,

    /// Summary for display; carries no meaning for the store
    pub description: String,

    /// Creation time
    pub timestamp: DateTime<Utc>,

    /// Data the executor needs to re-apply this action
    pub forward_payload: Payload,

    /// Data the executor needs to revert this action.
    /// `None` marks the action irreversible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse_payload: Option<Payload>,

    /// Producer metadata for display (source panel, row counts, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Action {
    /// Create an irreversible action with a fresh id.
    /// Attach an inverse with [`Action::with_inverse`].
    pub fn new(action_type: ActionType, description: impl Into<String>, forward: Payload) -> Self {
        Self {
            id: ActionId::next(),
            action_type,
            description: description.into(),
            timestamp: Utc::now(),
            forward_payload: forward,
            inverse_payload: None,
            metadata: HashMap::new(),
        }
    }

    /// Override the generated id.
    ///
    /// Generated ids follow creation order; an explicit id only has to be
    /// unique within a timeline. The timeline is always ordered by when
    /// actions were recorded, never by id, so producers that supply their own
    /// ids give up the creation-order guarantee and nothing else.
    pub fn with_id(mut self, id: ActionId) -> Self {
        self.id = id;
        self
    }

    /// Set the inverse payload, making the action reversible
    pub fn with_inverse(mut self, inverse: Payload) -> Self {
        self.inverse_payload = Some(inverse);
        self
    }

    /// Add display metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether the action can be undone
    pub fn is_reversible(&self) -> bool {
        self.inverse_payload.is_some()
    }
}
