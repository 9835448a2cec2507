//! Tick pipeline
//!
//! gather → resolve → append → apply → broadcast, run as one unit under
//! the pipeline lock. The registry is updated before any external
//! observer sees the logs, and exactly once per tick number.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use parking_lot::RwLock;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, error, warn};

use super::scope::CancelScope;
use super::{BattleError, BattleId, Lifecycle, TickEvent, TickReport};
use crate::action::{Action, ActionId, ActionSource};
use crate::apply::{HealthPolicy, StateApplier};
use crate::combatant::Registry;
use crate::fanout::Fanout;
use crate::log::Log;
use crate::resolve::{RejectReason, Rejection, ResolutionEngine};
use crate::rules::panic_message;

/// State owned by the tick loop
///
/// `consumed` holds every action ID seen so far and grows for the life of
/// the battle; a redelivered ID is rejected no matter how late it arrives.
pub(crate) struct Pipeline {
    pub(crate) tick: u64,
    pub(crate) engine: ResolutionEngine,
    pub(crate) applier: StateApplier,
    pub(crate) fanout: Fanout,
    pub(crate) source: Option<Arc<dyn ActionSource>>,
    pub(crate) consumed: HashSet<ActionId>,
}

/// Everything a battle shares between its handle and its scheduler
pub(crate) struct Shared {
    pub(crate) id: BattleId,
    pub(crate) pipeline: Mutex<Pipeline>,
    pub(crate) history: RwLock<Vec<Log>>,
    pub(crate) initial: Registry,
    pub(crate) health: HealthPolicy,
    pub(crate) lifecycle: watch::Sender<Lifecycle>,
    pub(crate) events: broadcast::Sender<TickEvent>,
    pub(crate) last_tick: AtomicU64,
}

impl Shared {
    pub(crate) fn scope(&self) -> CancelScope {
        CancelScope::new(self.lifecycle.subscribe())
    }

    /// Move to `to` if the transition is allowed, returning the old state
    pub(crate) fn transition(&self, to: Lifecycle) -> Result<Lifecycle, BattleError> {
        let mut from = to;
        let mut allowed = false;
        self.lifecycle.send_if_modified(|state| {
            from = *state;
            allowed = matches!(
                (from, to),
                (Lifecycle::Running, Lifecycle::Paused)
                    | (Lifecycle::Running, Lifecycle::Cancelled)
                    | (Lifecycle::Paused, Lifecycle::Cancelled)
            );
            if allowed {
                *state = to;
            }
            allowed
        });

        if allowed {
            Ok(from)
        } else {
            Err(BattleError::NotRunning { state: from })
        }
    }

    /// Run one tick
    pub(crate) async fn run_tick(&self) -> Result<TickReport, BattleError> {
        let mut scope = self.scope();
        scope.ensure_running()?;

        let mut guard = tokio::select! {
            biased;
            state = scope.cancelled() => return Err(BattleError::NotRunning { state }),
            guard = self.pipeline.lock() => guard,
        };
        // state may have changed while waiting for the previous tick
        scope.ensure_running()?;

        let tick = guard.tick + 1;
        let result = AssertUnwindSafe(self.run_pipeline(&mut guard, tick, &mut scope))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(battle = %self.id, tick, %message, "Tick panicked");
                Err(BattleError::Panicked { tick, message })
            });
        drop(guard);

        let event = match &result {
            Ok(report) => TickEvent::Completed(report.clone()),
            Err(e) => TickEvent::Failed {
                tick,
                error: e.to_string(),
            },
        };
        // no subscribers is fine
        let _ = self.events.send(event);
        result
    }

    async fn run_pipeline(
        &self,
        pipeline: &mut Pipeline,
        tick: u64,
        scope: &mut CancelScope,
    ) -> Result<TickReport, BattleError> {
        let actions = match pipeline.source.clone() {
            Some(source) => tokio::select! {
                biased;
                _ = scope.cancelled() => return Err(BattleError::Cancelled { tick }),
                batch = source.pending_actions(tick) => batch.map_err(BattleError::ActionSource)?,
            },
            None => Vec::new(),
        };

        let (fresh, stale): (Vec<Action>, Vec<Action>) = actions
            .into_iter()
            .partition(|a| !pipeline.consumed.contains(&a.id));
        let mut rejections: Vec<Rejection> = stale
            .iter()
            .map(|a| Rejection::new(a.id, RejectReason::AlreadyConsumed))
            .collect();
        let fresh_ids: Vec<ActionId> = fresh.iter().map(|a| a.id).collect();

        let resolution = pipeline
            .engine
            .resolve(tick, fresh, pipeline.applier.registry());
        rejections.extend(resolution.rejections);
        let logs = resolution.logs;

        // Commit the tick; no await from here until apply
        pipeline.tick = tick;
        pipeline.consumed.extend(fresh_ids);
        self.last_tick.store(tick, Ordering::SeqCst);
        self.history.write().extend(logs.iter().cloned());
        let applied = pipeline.applier.apply_tick(tick, &logs)?;

        let delivery = pipeline.fanout.broadcast(self.id, &logs);
        tokio::select! {
            biased;
            _ = scope.cancelled() => {
                warn!(
                    battle = %self.id,
                    tick,
                    "Broadcast interrupted by cancellation"
                );
                return Err(BattleError::Cancelled { tick });
            }
            delivered = delivery => delivered?,
        }

        let report = TickReport {
            tick,
            logs: logs.len(),
            rejections,
            faults: applied.faults,
            incapacitated: applied.incapacitated,
        };
        debug!(
            battle = %self.id,
            tick,
            logs = report.logs,
            rejected = report.rejections.len(),
            faults = report.faults.len(),
            "Tick complete"
        );
        Ok(report)
    }
}
