//! Example of driving a history store with an application-defined executor
//!
//! The executor here owns a toy dashboard state: forecast settings and a set
//! of rows removed by cleaning. Payloads are plain JSON agreed between the
//! code that records actions and this executor.
//!
//! Run with `cargo run --example custom_executor`. Set
//! `DASHBOARD_HISTORY_LOG_LEVEL=debug` to see every executor step.

use action_history::{
    init_logging, Action, ActionExecutor, ActionType, ExecutorFailure, ExecutorResult, FromEnv,
    HistoryConfig, HistoryStore, Payload,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct DashboardState {
    settings: HashMap<String, Value>,
    removed_rows: BTreeSet<u64>,
}

impl DashboardState {
    fn apply(&mut self, payload: &Payload) -> Result<(), String> {
        if let Some(settings) = payload.get("settings").and_then(Value::as_object) {
            for (key, value) in settings {
                self.settings.insert(key.clone(), value.clone());
            }
        }
        if let Some(rows) = payload.get("remove_rows").and_then(Value::as_array) {
            for row in rows {
                let row = row.as_u64().ok_or_else(|| format!("invalid row index: {}", row))?;
                self.removed_rows.insert(row);
            }
        }
        if let Some(rows) = payload.get("restore_rows").and_then(Value::as_array) {
            for row in rows {
                let row = row.as_u64().ok_or_else(|| format!("invalid row index: {}", row))?;
                self.removed_rows.remove(&row);
            }
        }
        Ok(())
    }
}

struct DashboardExecutor {
    state: Mutex<DashboardState>,
}

#[async_trait]
impl ActionExecutor for DashboardExecutor {
    async fn apply_forward(&self, action: &Action) -> ExecutorResult {
        self.state
            .lock()
            .await
            .apply(&action.forward_payload)
            .map_err(ExecutorFailure::new)
    }

    async fn apply_inverse(&self, action: &Action) -> ExecutorResult {
        let payload = action
            .inverse_payload
            .as_ref()
            .ok_or_else(|| ExecutorFailure::new("no inverse payload"))?;
        self.state
            .lock()
            .await
            .apply(payload)
            .map_err(ExecutorFailure::new)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = HistoryConfig::from_env("DASHBOARD_HISTORY")?;
    init_logging(&config.logging)?;

    let executor = DashboardExecutor {
        state: Mutex::new(DashboardState::default()),
    };
    let store = HistoryStore::with_config(executor, config)?;

    let mut events = store.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("  event: {}", event.description());
        }
    });

    // Each producer applies its effect directly, then records it.
    let horizon = Action::new(ActionType::ConfigChange, "Horizon 30 days", json!({"settings": {"horizon": 30}}))
        .with_inverse(json!({"settings": {"horizon": 14}}));
    store.executor().apply_forward(&horizon).await?;
    let horizon_id = horizon.id;
    store.record(horizon).await?;

    let cleaning = Action::new(ActionType::DataCleaning, "Removed 3 outliers", json!({"remove_rows": [4, 17, 90]}))
        .with_inverse(json!({"restore_rows": [4, 17, 90]}));
    store.executor().apply_forward(&cleaning).await?;
    store.record(cleaning).await?;

    let export = Action::new(ActionType::ExportOperation, "Exported forecast.csv", json!({"format": "csv"}));
    store.record(export).await?;

    println!("undo last export:");
    if let Err(err) = store.undo().await {
        println!("  refused: {}", err);
    }

    println!("jump back to the horizon change:");
    if let Err(err) = store.jump_to(horizon_id).await {
        println!("  refused: {}", err);
    }

    let state = store.describe_state();
    println!(
        "history has {} entries, cursor at {:?}, can undo: {}",
        state.len(),
        state.cursor,
        state.can_undo
    );
    println!("dashboard: {:?}", store.executor().state.lock().await);

    drop(store);
    printer.await?;
    Ok(())
}
