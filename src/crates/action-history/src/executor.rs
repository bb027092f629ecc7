//! Executor contract for applying and reverting actions
//!
//! The **[`ActionExecutor`]** trait is the seam between the history store and
//! the application state it describes (uploaded data, forecast configuration,
//! forecast results). The store only orchestrates: it decides which action to
//! re-apply or revert next and asks the executor to do it. The executor is the
//! only party that touches real state.
//!
//! # Contract
//!
//! - **One action per call** - each call applies or reverts exactly one
//!   action's delta. Multi-step jumps are sequences of single calls.
//! - **Confirm or refuse** - return `Ok(())` only once the effect has taken
//!   place. Return [`ExecutorFailure`] if it did not; the store then leaves its
//!   cursor where it was.
//! - **Opaque payloads** - the store never inspects
//!   [`Action::forward_payload`] or [`Action::inverse_payload`]. Their shape is
//!   agreed between the producer of the action and the executor.
//! - **No concurrent calls** - the store never issues a second call while one
//!   is in flight.
//!
//! # Implementing an Executor
//!
//! ```rust,ignore
//! use action_history::{Action, ActionExecutor, ActionType, ExecutorFailure, ExecutorResult};
//! use async_trait::async_trait;
//!
//! struct DashboardExecutor {
//!     state: tokio::sync::Mutex<DashboardState>,
//! }
//!
//! #[async_trait]
//! impl ActionExecutor for DashboardExecutor {
//!     async fn apply_forward(&self, action: &Action) -> ExecutorResult {
//!         let mut state = self.state.lock().await;
//!         match action.action_type {
//!             ActionType::ConfigChange => state.apply_config(&action.forward_payload),
//!             ActionType::ForecastGeneration => state.rerun_forecast(&action.forward_payload).await,
//!             _ => state.apply_data_delta(&action.forward_payload),
//!         }
//!         .map_err(|e| ExecutorFailure::new(e.to_string()))
//!     }
//!
//!     async fn apply_inverse(&self, action: &Action) -> ExecutorResult {
//!         let payload = action
//!             .inverse_payload
//!             .as_ref()
//!             .ok_or_else(|| ExecutorFailure::new("no inverse payload"))?;
//!         let mut state = self.state.lock().await;
//!         state
//!             .apply_data_delta(payload)
//!             .map_err(|e| ExecutorFailure::new(e.to_string()))
//!     }
//! }
//! ```

use crate::action::Action;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Executor refusal: the step did not take effect
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ExecutorFailure {
    /// Why the step did not take effect, suitable for a toast
    pub reason: String,
}

impl ExecutorFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outcome of a single executor step
pub type ExecutorResult = std::result::Result<(), ExecutorFailure>;

/// Which effect of an action a step applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Re-apply the action (redo)
    Forward,
    /// Revert the action (undo)
    Inverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Inverse => f.write_str("inverse"),
        }
    }
}

/// Applies and reverts recorded actions against application state
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Re-apply `action` using its forward payload
    async fn apply_forward(&self, action: &Action) -> ExecutorResult;

    /// Revert `action` using its inverse payload.
    ///
    /// The store only calls this for actions whose
    /// [`inverse_payload`](Action::inverse_payload) is present.
    async fn apply_inverse(&self, action: &Action) -> ExecutorResult;

    /// Apply one step in the given direction
    async fn apply(&self, direction: Direction, action: &Action) -> ExecutorResult {
        match direction {
            Direction::Forward => self.apply_forward(action).await,
            Direction::Inverse => self.apply_inverse(action).await,
        }
    }
}

#[async_trait]
impl<E: ActionExecutor + ?Sized> ActionExecutor for Arc<E> {
    async fn apply_forward(&self, action: &Action) -> ExecutorResult {
        (**self).apply_forward(action).await
    }

    async fn apply_inverse(&self, action: &Action) -> ExecutorResult {
        (**self).apply_inverse(action).await
    }

    async fn apply(&self, direction: Direction, action: &Action) -> ExecutorResult {
        (**self).apply(direction, action).await
    }
}

#[async_trait]
impl<E: ActionExecutor + ?Sized> ActionExecutor for Box<E> {
    async fn apply_forward(&self, action: &Action) -> ExecutorResult {
        (**self).apply_forward(action).await
    }

    async fn apply_inverse(&self, action: &Action) -> ExecutorResult {
        (**self).apply_inverse(action).await
    }

    async fn apply(&self, direction: Direction, action: &Action) -> ExecutorResult {
        (**self).apply(direction, action).await
    }
}
