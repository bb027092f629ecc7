//! History change notifications
//!
//! The store publishes a [`HistoryEvent`] after every committed mutation and
//! whenever the executor refuses a step. Presentation code renders from
//! `Changed` snapshots; the notification layer turns `Failed` into toasts.

use crate::error::HistoryError;
use crate::history::HistorySnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intent that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOperation {
    Record,
    Undo,
    Redo,
    JumpTo,
    Clear,
}

impl fmt::Display for HistoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HistoryOperation::Record => "record",
            HistoryOperation::Undo => "undo",
            HistoryOperation::Redo => "redo",
            HistoryOperation::JumpTo => "jump_to",
            HistoryOperation::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// Event broadcast to history subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEvent {
    /// The timeline or cursor changed
    Changed {
        operation: HistoryOperation,
        snapshot: HistorySnapshot,
    },
    /// The executor refused a step
    Failed {
        operation: HistoryOperation,
        /// User-presentable message
        message: String,
        /// Cursor the store settled on
        reached: Option<usize>,
    },
}

impl HistoryEvent {
    pub fn changed(operation: HistoryOperation, snapshot: HistorySnapshot) -> Self {
        HistoryEvent::Changed {
            operation,
            snapshot,
        }
    }

    pub fn failed(operation: HistoryOperation, error: &HistoryError) -> Self {
        let reached = match error {
            HistoryError::ExecutorFailed { reached, .. } => *reached,
            _ => None,
        };
        HistoryEvent::Failed {
            operation,
            message: error.to_string(),
            reached,
        }
    }

    pub fn operation(&self) -> HistoryOperation {
        match self {
            HistoryEvent::Changed { operation, .. } | HistoryEvent::Failed { operation, .. } => {
                *operation
            }
        }
    }

    /// The snapshot carried by a `Changed` event
    pub fn snapshot(&self) -> Option<&HistorySnapshot> {
        match self {
            HistoryEvent::Changed { snapshot, .. } => Some(snapshot),
            HistoryEvent::Failed { .. } => None,
        }
    }

    /// Short description for logs and toasts
    pub fn description(&self) -> String {
        match self {
            HistoryEvent::Changed {
                operation,
                snapshot,
            } => match &snapshot.current {
                Some(current) => format!(
                    "History {}: at \"{}\" ({} of {})",
                    operation,
                    current.description,
                    snapshot.cursor.map_or(0, |c| c + 1),
                    snapshot.len()
                ),
                None => format!("History {}: at start ({} entries)", operation, snapshot.len()),
            },
            HistoryEvent::Failed {
                operation,
                message,
                ..
            } => format!("History {} failed: {}", operation, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionId, ActionType};
    use crate::history::History;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_changed_event_serialization() {
        let mut history = History::new();
        history
            .push(Action::new(ActionType::DataUpload, "upload sales.csv", json!({})).with_id(ActionId::new(1)))
            .unwrap();
        let event = HistoryEvent::changed(HistoryOperation::Record, history.snapshot(Uuid::new_v4(), 1));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("changed"));
        assert_eq!(value["operation"], json!("record"));
        assert_eq!(value["snapshot"]["cursor"], json!(0));
        assert_eq!(event.description(), "History record: at \"upload sales.csv\" (1 of 1)");
    }

    #[test]
    fn test_failed_event_carries_reached_index() {
        let error = HistoryError::ExecutorFailed {
            reason: "model fit diverged".to_string(),
            reached: Some(2),
        };
        let event = HistoryEvent::failed(HistoryOperation::JumpTo, &error);

        assert_eq!(event.operation(), HistoryOperation::JumpTo);
        assert!(event.snapshot().is_none());
        match &event {
            HistoryEvent::Failed { message, reached, .. } => {
                assert_eq!(message, "Executor failed: model fit diverged");
                assert_eq!(*reached, Some(2));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(
            event.description(),
            "History jump_to failed: Executor failed: model fit diverged"
        );
    }
}
