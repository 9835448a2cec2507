//! Tick scheduler
//!
//! A background task that ticks the battle on a fixed period until the
//! battle leaves `Running`. Holds only a weak reference so dropping the
//! battle handle ends the task.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

use super::pipeline::Shared;
use super::BattleError;

pub(crate) fn spawn(runtime: &Handle, shared: Weak<Shared>, period: Duration) -> Option<JoinHandle<()>> {
    let (mut scope, id) = {
        let strong = shared.upgrade()?;
        (strong.scope(), strong.id)
    };

    Some(runtime.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(battle = %id, ?period, "Scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = scope.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(shared) = shared.upgrade() else {
                break;
            };
            match shared.run_tick().await {
                Ok(_) => {}
                Err(BattleError::NotRunning { .. }) | Err(BattleError::Cancelled { .. }) => break,
                Err(e) => {
                    // Failed ticks are reported to subscribers; keep ticking
                    error!(battle = %id, error = %e, "Tick failed");
                }
            }
        }

        debug!(battle = %id, "Scheduler stopped");
    }))
}
