//! Model-based property tests: the store must track a plain vector-and-cursor
//! model through any sequence of intents.

use action_history::testing::RecordingExecutor;
use action_history::{Action, ActionId, ActionType, HistoryError, HistoryStore};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Record,
    Undo,
    Redo,
    Jump(usize),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Record),
        3 => Just(Op::Undo),
        2 => Just(Op::Redo),
        2 => (0usize..16).prop_map(Op::Jump),
        1 => Just(Op::Clear),
    ]
}

#[derive(Debug, Default)]
struct Model {
    entries: Vec<u64>,
    cursor: Option<usize>,
}

impl Model {
    fn record(&mut self, id: u64) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(id);
        self.cursor = Some(self.entries.len() - 1);
    }
}

fn action(id: u64) -> Action {
    Action::new(ActionType::ConfigChange, format!("edit #{}", id), json!({"v": id}))
        .with_id(ActionId::new(id))
        .with_inverse(json!({"v": id}))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_records_append_in_order(count in 1usize..40) {
        runtime().block_on(async {
            let store = HistoryStore::new(RecordingExecutor::new());
            for id in 0..count as u64 {
                let snapshot = store.record(action(id)).await.unwrap();
                prop_assert_eq!(snapshot.cursor, Some(snapshot.len() - 1));
            }
            let expected: Vec<ActionId> = (0..count as u64).map(ActionId::new).collect();
            prop_assert_eq!(store.describe_state().ids(), expected);
            Ok(())
        })?;
    }

    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        runtime().block_on(async {
            let executor = Arc::new(RecordingExecutor::new());
            let store = HistoryStore::new(executor.clone());
            let mut model = Model::default();
            let mut next_id = 0u64;

            for op in ops {
                let calls_before = executor.calls().len();
                let mut expected_calls = 0usize;

                match op {
                    Op::Record => {
                        next_id += 1;
                        store.record(action(next_id)).await.unwrap();
                        model.record(next_id);
                    }
                    Op::Undo => match model.cursor {
                        Some(c) => {
                            store.undo().await.unwrap();
                            model.cursor = c.checked_sub(1);
                            expected_calls = 1;
                        }
                        None => {
                            prop_assert!(matches!(store.undo().await, Err(HistoryError::NothingToUndo)));
                        }
                    },
                    Op::Redo => {
                        let next = model.cursor.map_or(0, |c| c + 1);
                        if next < model.entries.len() {
                            store.redo().await.unwrap();
                            model.cursor = Some(next);
                            expected_calls = 1;
                        } else {
                            prop_assert!(matches!(store.redo().await, Err(HistoryError::NothingToRedo)));
                        }
                    }
                    Op::Jump(seed) => {
                        if model.entries.is_empty() {
                            continue;
                        }
                        let target = seed % model.entries.len();
                        let id = ActionId::new(model.entries[target]);
                        let reached = store.jump_to(id).await.unwrap();
                        prop_assert_eq!(reached.id, id);

                        let start = model.cursor.map_or(-1, |c| c as i64);
                        expected_calls = (target as i64 - start).unsigned_abs() as usize;
                        model.cursor = Some(target);
                    }
                    Op::Clear => {
                        store.clear().await.unwrap();
                        model = Model::default();
                    }
                }

                let state = store.describe_state();
                let expected: Vec<ActionId> = model.entries.iter().copied().map(ActionId::new).collect();
                prop_assert_eq!(state.ids(), expected);
                prop_assert_eq!(state.cursor, model.cursor);
                prop_assert_eq!(executor.calls().len() - calls_before, expected_calls);
            }
            Ok(())
        })?;
    }
}
