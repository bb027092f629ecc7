//! The history store: serialized undo, redo and jump over an executor
//!
//! **[`HistoryStore`]** owns one session's [`History`] and is the only way to
//! change it. It validates each intent against the current timeline, drives
//! the [`ActionExecutor`] one action at a time, moves the cursor only after the
//! executor confirms a step, and publishes the result to subscribers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  UI intents: record / undo / redo / jump_to / clear          │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  HistoryStore                                                │
//! │  ┌────────────────────────────┐   ┌───────────────────────┐  │
//! │  │ Mutex<StoreState>          │   │ broadcast::Sender     │──┼──▶ HistoryEvent
//! │  │  • History (entries/cursor)│   │ watch::Sender         │──┼──▶ HistorySnapshot
//! │  │  • version                 │   └───────────────────────┘  │
//! │  └─────────────┬──────────────┘                              │
//! └────────────────┼─────────────────────────────────────────────┘
//!                  │ apply_forward / apply_inverse (one action per call)
//!                  ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ActionExecutor (application state: data, config, forecasts) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Concurrency
//!
//! The state mutex is held for the whole of each intent, including the time
//! spent awaiting the executor. An intent that finds it held is rejected with
//! [`HistoryError::OperationInProgress`] under [`BusyPolicy::Reject`], or waits
//! its turn under [`BusyPolicy::Queue`]. `tokio::sync::Mutex` is FIFO, so
//! queued intents run in arrival order.
//!
//! Intents that call the executor (`undo`, `redo`, `jump_to`) run on their own
//! task once they hold the lock. Dropping the caller's future, for example
//! through a timeout, does not cancel them: the task finishes every step,
//! commits and publishes before the next intent is admitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use action_history::{Action, ActionType, HistoryStore};
//! use serde_json::json;
//!
//! let store = HistoryStore::new(dashboard_executor);
//! let mut events = store.subscribe();
//!
//! // The upload already happened; the store only records it.
//! store
//!     .record(
//!         Action::new(ActionType::DataUpload, "Uploaded sales.csv", json!({"dataset": "sales"}))
//!             .with_inverse(json!({"dataset": null})),
//!     )
//!     .await?;
//!
//! store.undo().await?;
//! assert!(store.describe_state().can_redo);
//! ```

use crate::action::{Action, ActionId};
use crate::config::{BusyPolicy, HistoryConfig, ValidateConfig};
use crate::error::{HistoryError, Result};
use crate::events::{HistoryEvent, HistoryOperation};
use crate::executor::{ActionExecutor, Direction};
use crate::history::{History, HistorySnapshot};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Mutable state guarded by the store's lock
#[derive(Debug)]
struct StoreState {
    history: History,
    version: u64,
}

/// Everything an intent task needs besides the locked state
struct Shared<E> {
    session_id: Uuid,
    config: HistoryConfig,
    executor: E,
    events: broadcast::Sender<HistoryEvent>,
    snapshot: watch::Sender<HistorySnapshot>,
}

/// Session-scoped action history driving an [`ActionExecutor`]
pub struct HistoryStore<E> {
    shared: Arc<Shared<E>>,
    state: Arc<Mutex<StoreState>>,
}

impl<E: ActionExecutor + 'static> HistoryStore<E> {
    /// Create an empty store with the default configuration
    pub fn new(executor: E) -> Self {
        Self::build(executor, HistoryConfig::default())
    }

    /// Create an empty store with a validated configuration
    pub fn with_config(executor: E, config: HistoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(executor, config))
    }

    fn build(executor: E, config: HistoryConfig) -> Self {
        let session_id = Uuid::new_v4();
        let history = History::with_max_entries(config.max_entries);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (snapshot, _) = watch::channel(history.snapshot(session_id, 0));

        debug!(session_id = %session_id, busy_policy = ?config.busy_policy, "Created history store");

        Self {
            shared: Arc::new(Shared {
                session_id,
                config,
                executor,
                events,
                snapshot,
            }),
            state: Arc::new(Mutex::new(StoreState {
                history,
                version: 0,
            })),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.shared.config
    }

    pub fn executor(&self) -> &E {
        &self.shared.executor
    }

    /// Subscribe to change and failure events
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.shared.events.subscribe()
    }

    /// Watch the latest committed snapshot
    pub fn watch(&self) -> watch::Receiver<HistorySnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// The last committed state. Never blocks, even while an intent is in flight.
    pub fn describe_state(&self) -> HistorySnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Whether an intent currently holds the store
    pub fn is_busy(&self) -> bool {
        self.state.try_lock().is_err()
    }

    pub fn len(&self) -> usize {
        self.shared.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.snapshot.borrow().is_empty()
    }

    /// Record an action whose effect has already been applied.
    ///
    /// Discards the redo future, appends `action` and moves the cursor to it.
    /// The executor is not called.
    pub async fn record(&self, action: Action) -> Result<HistorySnapshot> {
        let state = self.acquire(HistoryOperation::Record).await?;
        self.shared.record(state, action)
    }

    /// Revert the current action and move the cursor back by one.
    ///
    /// Returns the action that was undone.
    pub async fn undo(&self) -> Result<Action> {
        let state = self.acquire(HistoryOperation::Undo).await?;
        let shared = self.shared.clone();
        run_detached(async move { shared.undo(state).await }).await
    }

    /// Re-apply the next undone action and move the cursor forward by one.
    ///
    /// Returns the action that was redone.
    pub async fn redo(&self) -> Result<Action> {
        let state = self.acquire(HistoryOperation::Redo).await?;
        let shared = self.shared.clone();
        run_detached(async move { shared.redo(state).await }).await
    }

    /// Move the cursor to the action with `id`, replaying or reverting every
    /// action in between one at a time, in causal order.
    ///
    /// If a step fails the jump stops there; the steps already taken are kept
    /// and the error reports the index reached. A backward jump across an
    /// irreversible action is refused before any step is taken.
    pub async fn jump_to(&self, id: ActionId) -> Result<Action> {
        let state = self.acquire(HistoryOperation::JumpTo).await?;
        let shared = self.shared.clone();
        run_detached(async move { shared.jump_to(state, id).await }).await
    }

    /// Drop the whole timeline. Application state is left untouched.
    pub async fn clear(&self) -> Result<HistorySnapshot> {
        let state = self.acquire(HistoryOperation::Clear).await?;
        Ok(self.shared.clear(state))
    }

    async fn acquire(&self, operation: HistoryOperation) -> Result<OwnedMutexGuard<StoreState>> {
        match self.shared.config.busy_policy {
            BusyPolicy::Reject => self.state.clone().try_lock_owned().map_err(|_| {
                warn!(session_id = %self.shared.session_id, operation = %operation, "Rejected intent: store busy");
                HistoryError::OperationInProgress
            }),
            BusyPolicy::Queue => Ok(self.state.clone().lock_owned().await),
        }
    }
}

/// Run an intent that calls the executor on its own task.
///
/// The task owns the store lock, so once spawned it finishes and commits even
/// if the caller stops waiting.
async fn run_detached<T, F>(intent: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(intent).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => Err(HistoryError::Interrupted(err.to_string())),
    }
}

impl<E: ActionExecutor> Shared<E> {
    fn record(&self, mut state: OwnedMutexGuard<StoreState>, action: Action) -> Result<HistorySnapshot> {
        let id = action.id;
        let action_type = action.action_type;
        let outcome = state.history.push(action).map_err(|e| {
            warn!(session_id = %self.session_id, action_id = %id, "Rejected record: {}", e);
            e
        })?;

        if !outcome.discarded.is_empty() {
            debug!(
                session_id = %self.session_id,
                discarded = outcome.discarded.len(),
                "Discarded redo history"
            );
        }
        if !outcome.evicted.is_empty() {
            debug!(
                session_id = %self.session_id,
                evicted = outcome.evicted.len(),
                "Evicted oldest history entries"
            );
        }

        let snapshot = self.commit(&mut state, HistoryOperation::Record);
        info!(
            session_id = %self.session_id,
            action_id = %id,
            action_type = %action_type,
            entries = snapshot.len(),
            "Recorded action"
        );
        Ok(snapshot)
    }

    async fn undo(&self, mut state: OwnedMutexGuard<StoreState>) -> Result<Action> {
        let action = state
            .history
            .current()
            .cloned()
            .ok_or(HistoryError::NothingToUndo)?;

        if !action.is_reversible() {
            warn!(session_id = %self.session_id, action_id = %action.id, "Cannot undo irreversible action");
            return Err(HistoryError::ActionNotReversible { id: action.id });
        }

        if let Err(err) = self.step(&mut state, Direction::Inverse, &action).await {
            self.notify_failure(HistoryOperation::Undo, &err);
            return Err(err);
        }

        self.commit(&mut state, HistoryOperation::Undo);
        info!(session_id = %self.session_id, action_id = %action.id, "Undid action");
        Ok(action)
    }

    async fn redo(&self, mut state: OwnedMutexGuard<StoreState>) -> Result<Action> {
        let action = state
            .history
            .next()
            .cloned()
            .ok_or(HistoryError::NothingToRedo)?;

        if let Err(err) = self.step(&mut state, Direction::Forward, &action).await {
            self.notify_failure(HistoryOperation::Redo, &err);
            return Err(err);
        }

        self.commit(&mut state, HistoryOperation::Redo);
        info!(session_id = %self.session_id, action_id = %action.id, "Redid action");
        Ok(action)
    }

    async fn jump_to(&self, mut state: OwnedMutexGuard<StoreState>, id: ActionId) -> Result<Action> {
        let target = state.history.position_of(id).ok_or_else(|| {
            error!(session_id = %self.session_id, action_id = %id, "Jump to unknown action");
            HistoryError::UnknownActionId(id)
        })?;

        let start = state.history.cursor();
        if start == Some(target) {
            return Ok(state.history.entries()[target].clone());
        }

        let (direction, steps): (Direction, Vec<Action>) = match start {
            Some(current) if target < current => (
                Direction::Inverse,
                state.history.entries()[target + 1..=current]
                    .iter()
                    .rev()
                    .cloned()
                    .collect(),
            ),
            _ => (
                Direction::Forward,
                state.history.entries()[start.map_or(0, |c| c + 1)..=target].to_vec(),
            ),
        };

        if direction == Direction::Inverse {
            if let Some(blocker) = steps.iter().find(|a| !a.is_reversible()) {
                warn!(
                    session_id = %self.session_id,
                    action_id = %blocker.id,
                    "Jump blocked by irreversible action"
                );
                return Err(HistoryError::ActionNotReversible { id: blocker.id });
            }
        }

        debug!(
            session_id = %self.session_id,
            target = target,
            steps = steps.len(),
            direction = %direction,
            "Jumping through history"
        );

        let mut failure = None;
        let mut moved = 0usize;
        for action in &steps {
            match self.step(&mut state, direction, action).await {
                Ok(()) => moved += 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if moved > 0 {
            self.commit(&mut state, HistoryOperation::JumpTo);
        }

        match failure {
            Some(err) => {
                self.notify_failure(HistoryOperation::JumpTo, &err);
                Err(err)
            }
            None => {
                info!(session_id = %self.session_id, action_id = %id, steps = moved, "Jumped to action");
                Ok(state.history.entries()[target].clone())
            }
        }
    }

    fn clear(&self, mut state: OwnedMutexGuard<StoreState>) -> HistorySnapshot {
        let dropped = state.history.len();
        state.history.clear();
        let snapshot = self.commit(&mut state, HistoryOperation::Clear);
        info!(session_id = %self.session_id, dropped = dropped, "Cleared history");
        snapshot
    }

    /// Run one executor call and, only if it succeeds, move the cursor
    async fn step(
        &self,
        state: &mut StoreState,
        direction: Direction,
        action: &Action,
    ) -> Result<()> {
        debug!(
            session_id = %self.session_id,
            action_id = %action.id,
            direction = %direction,
            "Executor step"
        );

        if let Err(failure) = self.executor.apply(direction, action).await {
            warn!(
                session_id = %self.session_id,
                action_id = %action.id,
                direction = %direction,
                "Executor step failed: {}",
                failure
            );
            return Err(HistoryError::ExecutorFailed {
                reason: failure.reason,
                reached: state.history.cursor(),
            });
        }

        match direction {
            Direction::Forward => state.history.step_forward(),
            Direction::Inverse => state.history.step_back(),
        }
    }

    fn commit(&self, state: &mut StoreState, operation: HistoryOperation) -> HistorySnapshot {
        state.version += 1;
        let snapshot = state.history.snapshot(self.session_id, state.version);
        self.snapshot.send_replace(snapshot.clone());
        // No subscribers is fine.
        let _ = self
            .events
            .send(HistoryEvent::changed(operation, snapshot.clone()));
        snapshot
    }

    fn notify_failure(&self, operation: HistoryOperation, err: &HistoryError) {
        let _ = self.events.send(HistoryEvent::failed(operation, err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType;
    use crate::testing::RecordingExecutor;
    use serde_json::json;
    use std::sync::Arc;

    fn reversible(id: u64) -> Action {
        Action::new(ActionType::DataCleaning, format!("clean {}", id), json!({"op": id}))
            .with_id(ActionId::new(id))
            .with_inverse(json!({"undo": id}))
    }

    #[tokio::test]
    async fn test_record_does_not_call_executor() {
        let executor = Arc::new(RecordingExecutor::new());
        let store = HistoryStore::new(executor.clone());

        let snapshot = store.record(reversible(1)).await.unwrap();
        assert_eq!(snapshot.cursor, Some(0));
        assert_eq!(snapshot.version, 1);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_undo_redo_round_trip() {
        let executor = Arc::new(RecordingExecutor::new());
        let store = HistoryStore::new(executor.clone());
        store.record(reversible(1)).await.unwrap();
        store.record(reversible(2)).await.unwrap();

        let undone = store.undo().await.unwrap();
        assert_eq!(undone.id, ActionId::new(2));
        assert_eq!(store.describe_state().cursor, Some(0));

        let redone = store.redo().await.unwrap();
        assert_eq!(redone.id, ActionId::new(2));
        let state = store.describe_state();
        assert_eq!(state.cursor, Some(1));
        assert_eq!(state.ids(), vec![ActionId::new(1), ActionId::new(2)]);

        let directions: Vec<Direction> = executor.calls().iter().map(|c| c.direction).collect();
        assert_eq!(directions, vec![Direction::Inverse, Direction::Forward]);
    }

    #[tokio::test]
    async fn test_undo_failure_keeps_cursor() {
        let executor = Arc::new(RecordingExecutor::new());
        let store = HistoryStore::new(executor.clone());
        store.record(reversible(1)).await.unwrap();
        executor.fail_after(0, "dataset locked");

        let err = store.undo().await.unwrap_err();
        match err {
            HistoryError::ExecutorFailed { reason, reached } => {
                assert_eq!(reason, "dataset locked");
                assert_eq!(reached, Some(0));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.describe_state().cursor, Some(0));
        assert_eq!(store.describe_state().version, 1);
    }

    #[tokio::test]
    async fn test_jump_to_current_is_noop() {
        let executor = Arc::new(RecordingExecutor::new());
        let store = HistoryStore::new(executor.clone());
        store.record(reversible(1)).await.unwrap();

        let action = store.jump_to(ActionId::new(1)).await.unwrap();
        assert_eq!(action.id, ActionId::new(1));
        assert!(executor.calls().is_empty());
        assert_eq!(store.describe_state().version, 1);
    }

    #[tokio::test]
    async fn test_unknown_jump_target() {
        let store = HistoryStore::new(RecordingExecutor::new());
        store.record(reversible(1)).await.unwrap();

        let err = store.jump_to(ActionId::new(99)).await.unwrap_err();
        assert!(matches!(err, HistoryError::UnknownActionId(id) if id == ActionId::new(99)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = HistoryStore::with_config(
            RecordingExecutor::new(),
            HistoryConfig::new().with_event_capacity(0),
        );
        assert!(matches!(result, Err(HistoryError::Config(_))));
    }

    #[tokio::test]
    async fn test_watch_sees_committed_state() {
        let store = HistoryStore::new(RecordingExecutor::new());
        let mut watcher = store.watch();
        assert_eq!(watcher.borrow().version, 0);

        store.record(reversible(1)).await.unwrap();
        watcher.changed().await.unwrap();
        assert_eq!(watcher.borrow().cursor, Some(0));
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert!(!store.is_busy());
    }
}
