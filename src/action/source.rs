//! Action sources
//!
//! The battle pulls a batch of pending actions from its source at the
//! start of every tick. How actions get queued is up to the source.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Action, ActionId};

/// Supplies the pending actions for a tick
#[async_trait]
pub trait ActionSource: Send + Sync {
    /// Take the batch of actions submitted for `tick` (possibly empty)
    async fn pending_actions(&self, tick: u64) -> anyhow::Result<Vec<Action>>;
}

/// Queue of actions for the next tick
///
/// Submitters push from any thread; the battle drains the queue once per
/// tick. Sequence numbers are assigned on submission.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: Mutex<Vec<Action>>,
    next_sequence: AtomicU64,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action for the next tick, returning its ID
    pub fn submit(&self, action: Action) -> ActionId {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let action = action.with_sequence(sequence);
        let id = action.id;
        self.pending.lock().push(action);
        id
    }

    /// Number of actions waiting for the next tick
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[async_trait]
impl ActionSource for ActionQueue {
    async fn pending_actions(&self, _tick: u64) -> anyhow::Result<Vec<Action>> {
        Ok(std::mem::take(&mut *self.pending.lock()))
    }
}

/// Actions scripted ahead of time, keyed by tick number
#[derive(Debug, Default)]
pub struct ScriptedActions {
    script: Mutex<BTreeMap<u64, Vec<Action>>>,
    next_sequence: AtomicU64,
}

impl ScriptedActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an action for a specific tick
    pub fn at(self, tick: u64, action: Action) -> Self {
        self.push(tick, action);
        self
    }

    pub fn push(&self, tick: u64, action: Action) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .entry(tick)
            .or_default()
            .push(action.with_sequence(sequence));
    }

    /// Last tick with scripted actions, if any remain
    pub fn last_tick(&self) -> Option<u64> {
        self.script.lock().keys().next_back().copied()
    }
}

#[async_trait]
impl ActionSource for ScriptedActions {
    async fn pending_actions(&self, tick: u64) -> anyhow::Result<Vec<Action>> {
        Ok(self.script.lock().remove(&tick).unwrap_or_default())
    }
}
