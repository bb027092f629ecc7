//! Test support: a scriptable executor that records every call
//!
//! [`RecordingExecutor`] accepts every step unless told otherwise, keeps a log
//! of the calls it received, and can be scripted to refuse a later call or to
//! hold calls open so tests can observe the store while a step is in flight.
//!
//! ```rust,ignore
//! use action_history::testing::RecordingExecutor;
//! use std::sync::Arc;
//!
//! let executor = Arc::new(RecordingExecutor::new());
//! let store = HistoryStore::new(executor.clone());
//!
//! // Third call from now is refused
//! executor.fail_after(2, "forecast service unavailable");
//! ```

use crate::action::{Action, ActionId};
use crate::executor::{ActionExecutor, Direction, ExecutorFailure, ExecutorResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// One call received by a [`RecordingExecutor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorCall {
    pub direction: Direction,
    pub id: ActionId,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct Script {
    /// (successes remaining before the failure, reason)
    countdown: Option<(usize, String)>,
    /// Calls refused every time until cleared
    refused: HashMap<(ActionId, Direction), String>,
}

/// Handle that holds a gated executor's calls until released
#[derive(Debug, Clone)]
pub struct ExecutorGate {
    entered: Arc<Notify>,
    permits: Arc<Semaphore>,
}

impl ExecutorGate {
    /// Wait until a call has reached the executor
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let `calls` held or future calls proceed
    pub fn release(&self, calls: usize) {
        self.permits.add_permits(calls);
    }
}

/// Executor that logs calls and fails on demand
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<ExecutorCall>>,
    script: Mutex<Script>,
    gate: Option<ExecutorGate>,
}

impl RecordingExecutor {
    /// An executor that accepts every call immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor whose calls each wait for a permit from the returned gate
    pub fn gated() -> (Self, ExecutorGate) {
        let gate = ExecutorGate {
            entered: Arc::new(Notify::new()),
            permits: Arc::new(Semaphore::new(0)),
        };
        let executor = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (executor, gate)
    }

    /// Accept the next `successes` calls, then refuse one with `reason`
    pub fn fail_after(&self, successes: usize, reason: impl Into<String>) {
        self.script.lock().countdown = Some((successes, reason.into()));
    }

    /// Refuse every call for `id` in `direction` until [`Self::clear_failures`]
    pub fn refuse(&self, id: ActionId, direction: Direction, reason: impl Into<String>) {
        self.script.lock().refused.insert((id, direction), reason.into());
    }

    /// Remove all scripted failures
    pub fn clear_failures(&self) {
        let mut script = self.script.lock();
        script.countdown = None;
        script.refused.clear();
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().clone()
    }

    /// Ids of successful calls in `direction`, in order
    pub fn applied(&self, direction: Direction) -> Vec<ActionId> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.succeeded && c.direction == direction)
            .map(|c| c.id)
            .collect()
    }

    async fn handle(&self, direction: Direction, action: &Action) -> ExecutorResult {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            if let Ok(permit) = gate.permits.acquire().await {
                permit.forget();
            }
        }

        let outcome = self.scripted_outcome(direction, action.id);
        self.calls.lock().push(ExecutorCall {
            direction,
            id: action.id,
            succeeded: outcome.is_ok(),
        });
        outcome
    }

    fn scripted_outcome(&self, direction: Direction, id: ActionId) -> ExecutorResult {
        let mut script = self.script.lock();

        if let Some(reason) = script.refused.get(&(id, direction)) {
            return Err(ExecutorFailure::new(reason.clone()));
        }

        match script.countdown.take() {
            Some((0, reason)) => Err(ExecutorFailure::new(reason)),
            Some((remaining, reason)) => {
                script.countdown = Some((remaining - 1, reason));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn apply_forward(&self, action: &Action) -> ExecutorResult {
        self.handle(Direction::Forward, action).await
    }

    async fn apply_inverse(&self, action: &Action) -> ExecutorResult {
        if action.inverse_payload.is_none() {
            return Err(ExecutorFailure::new(format!(
                "action {} has no inverse payload",
                action.id
            )));
        }
        self.handle(Direction::Inverse, action).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType;
    use serde_json::json;

    fn action(id: u64) -> Action {
        Action::new(ActionType::ConfigChange, "edit", json!({}))
            .with_id(ActionId::new(id))
            .with_inverse(json!({}))
    }

    #[tokio::test]
    async fn test_fail_after_counts_successes() {
        let executor = RecordingExecutor::new();
        executor.fail_after(2, "boom");

        assert!(executor.apply_forward(&action(1)).await.is_ok());
        assert!(executor.apply_forward(&action(2)).await.is_ok());
        let err = executor.apply_forward(&action(3)).await.unwrap_err();
        assert_eq!(err.reason, "boom");
        // The countdown is spent
        assert!(executor.apply_forward(&action(4)).await.is_ok());

        let succeeded: Vec<bool> = executor.calls().iter().map(|c| c.succeeded).collect();
        assert_eq!(succeeded, vec![true, true, false, true]);
    }

    #[tokio::test]
    async fn test_refuse_specific_step() {
        let executor = RecordingExecutor::new();
        executor.refuse(ActionId::new(5), Direction::Inverse, "cannot restore rows");

        assert!(executor.apply_forward(&action(5)).await.is_ok());
        assert!(executor.apply_inverse(&action(5)).await.is_err());
        assert!(executor.apply_inverse(&action(5)).await.is_err());

        executor.clear_failures();
        assert!(executor.apply_inverse(&action(5)).await.is_ok());
        assert_eq!(executor.applied(Direction::Inverse), vec![ActionId::new(5)]);
    }

    #[tokio::test]
    async fn test_gate_holds_calls() {
        let (executor, gate) = RecordingExecutor::gated();
        let executor = Arc::new(executor);

        let pending = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.apply_forward(&action(1)).await })
        };

        gate.wait_entered().await;
        assert!(executor.calls().is_empty());

        gate.release(1);
        pending.await.unwrap().unwrap();
        assert_eq!(executor.calls().len(), 1);
    }
}
