//! The history aggregate: an ordered log of actions and a cursor
//!
//! [`History`] holds the timeline itself and enforces its invariants. It is
//! purely synchronous and never talks to an executor; the
//! [`HistoryStore`](crate::store::HistoryStore) decides *when* the cursor may
//! move and calls into this type only after the executor has confirmed a step.
//!
//! # Layout
//!
//! ```text
//!   entries:  [ A ][ B ][ C ][ D ][ E ]
//!                        ▲
//!                      cursor = Some(2)
//!
//!   past   = A, B, C   (applied, undoable)
//!   future = D, E      (undone, redoable)
//! ```
//!
//! A cursor of `None` means no action is applied. The timeline is strictly
//! linear: recording while a future exists discards that future first.

use crate::action::{Action, ActionId};
use crate::error::{HistoryError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a successful [`History::push`] removed from the timeline
#[derive(Debug, Clone, Default)]
pub struct PushOutcome {
    /// Previously undone actions dropped because a new action was recorded
    pub discarded: Vec<Action>,
    /// Oldest actions dropped to stay within the capacity limit
    pub evicted: Vec<Action>,
}

/// Ordered, cursor-addressed log of actions
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Action>,
    cursor: Option<usize>,
    max_entries: Option<usize>,
}

impl History {
    /// Create an empty, unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history that keeps at most `max_entries` actions
    pub fn with_max_entries(max_entries: Option<usize>) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[Action] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applied actions, oldest first
    pub fn past(&self) -> &[Action] {
        match self.cursor {
            Some(c) => &self.entries[..=c],
            None => &[],
        }
    }

    /// Undone actions, in the order they would be redone
    pub fn future(&self) -> &[Action] {
        &self.entries[self.next_index()..]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next_index() < self.entries.len()
    }

    /// The last applied action
    pub fn current(&self) -> Option<&Action> {
        self.cursor.map(|c| &self.entries[c])
    }

    /// The action a redo would apply
    pub fn next(&self) -> Option<&Action> {
        self.entries.get(self.next_index())
    }

    /// Index of the action with the given id
    pub fn position_of(&self, id: ActionId) -> Option<usize> {
        self.entries.iter().position(|a| a.id == id)
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.position_of(id).is_some()
    }

    /// Append an action, discarding the redo future first.
    ///
    /// The cursor moves to the new tail. Fails with
    /// [`HistoryError::DuplicateActionId`] if the id is already present
    /// anywhere in the timeline, including the future that would be discarded.
    pub fn push(&mut self, action: Action) -> Result<PushOutcome> {
        if self.contains(action.id) {
            return Err(HistoryError::DuplicateActionId(action.id));
        }

        let mut outcome = PushOutcome {
            discarded: self.entries.split_off(self.next_index()),
            evicted: Vec::new(),
        };

        self.entries.push(action);

        if let Some(max) = self.max_entries {
            if self.entries.len() > max {
                let excess = self.entries.len() - max;
                outcome.evicted = self.entries.drain(..excess).collect();
            }
        }

        self.cursor = self.entries.len().checked_sub(1);
        Ok(outcome)
    }

    /// Move the cursor one action back. Call only after the executor has
    /// reverted [`History::current`].
    pub fn step_back(&mut self) -> Result<()> {
        match self.cursor {
            Some(c) => {
                self.cursor = c.checked_sub(1);
                Ok(())
            }
            None => Err(HistoryError::NothingToUndo),
        }
    }

    /// Move the cursor one action forward. Call only after the executor has
    /// re-applied [`History::next`].
    pub fn step_forward(&mut self) -> Result<()> {
        if !self.can_redo() {
            return Err(HistoryError::NothingToRedo);
        }
        self.cursor = Some(self.next_index());
        Ok(())
    }

    /// Drop every entry and reset the cursor
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Read-only projection for subscribers
    pub fn snapshot(&self, session_id: Uuid, version: u64) -> HistorySnapshot {
        HistorySnapshot {
            session_id,
            version,
            entries: self.entries.clone(),
            cursor: self.cursor,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            current: self.current().cloned(),
            next: self.next().cloned(),
        }
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }
}

/// Point-in-time view of a history, as published to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Session the history belongs to
    pub session_id: Uuid,

    /// Bumped by every committed mutation
    pub version: u64,

    /// All actions in causal order
    pub entries: Vec<Action>,

    /// Index of the last applied action
    pub cursor: Option<usize>,

    pub can_undo: bool,
    pub can_redo: bool,

    /// The last applied action
    pub current: Option<Action>,

    /// The action a redo would apply
    pub next: Option<Action>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of all entries, in order
    pub fn ids(&self) -> Vec<ActionId> {
        self.entries.iter().map(|a| a.id).collect()
    }
}
