//! Error types for history operations
//!
//! Every public operation on the store returns a [`Result`]; nothing in this
//! crate signals failure by panicking.
//!
//! # Error Taxonomy
//!
//! ```text
//! HistoryError
//! ├── NothingToUndo        - cursor is before the first entry
//! ├── NothingToRedo        - cursor is at the last entry
//! ├── ActionNotReversible  - producer recorded no inverse payload
//! ├── ExecutorFailed       - executor refused a step; cursor did not move past it
//! ├── OperationInProgress  - another intent holds the store
//! ├── UnknownActionId      - jump target is not in the timeline
//! ├── DuplicateActionId    - record called with an id already in the timeline
//! ├── Interrupted          - the runtime shut down under an in-flight intent
//! ├── Config               - invalid configuration
//! ├── Io                   - reading a configuration file
//! └── Serialization        - decoding a configuration file
//! ```

use crate::action::ActionId;
use thiserror::Error;

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors that can occur while recording or navigating the history
#[derive(Error, Debug)]
pub enum HistoryError {
    /// There is no applied action to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// There is no undone action to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// The action was recorded without an inverse payload
    #[error("Action {id} cannot be undone")]
    ActionNotReversible {
        /// The irreversible action
        id: ActionId,
    },

    /// The executor reported that a step did not take effect
    ///
    /// `reached` is the cursor after the last step that did succeed
    /// (`None` when that is before the first entry).
    #[error("Executor failed: {reason}")]
    ExecutorFailed {
        /// Reason reported by the executor
        reason: String,
        /// Cursor position the store settled on
        reached: Option<usize>,
    },

    /// Another intent is still being processed
    #[error("Another history operation is in progress")]
    OperationInProgress,

    /// `jump_to` referenced an id that is not in the timeline
    #[error("Unknown action id: {0}")]
    UnknownActionId(ActionId),

    /// `record` was called with an id that is already in the timeline
    #[error("Duplicate action id: {0}")]
    DuplicateActionId(ActionId),

    /// The task running an intent was cancelled by the runtime
    #[error("Intent interrupted: {0}")]
    Interrupted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HistoryError {
    /// Whether the error should be shown to the user as a disabled or
    /// refused control rather than as a failure
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            HistoryError::NothingToUndo
                | HistoryError::NothingToRedo
                | HistoryError::ActionNotReversible { .. }
        )
    }

    /// Whether repeating the same intent later may succeed without any other change
    pub fn is_transient(&self) -> bool {
        matches!(self, HistoryError::OperationInProgress)
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for HistoryError {
    fn from(err: serde_yaml::Error) -> Self {
        HistoryError::Serialization(err.to_string())
    }
}
