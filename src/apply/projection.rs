//! Registry projection observer
//!
//! Keeps an independent copy of the combatant registry up to date by
//! applying every delivered batch. Useful for spectators that want
//! their own view of the battle.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{HealthPolicy, StateApplier};
use crate::battle::BattleId;
use crate::combatant::{Combatant, CombatantId, Registry};
use crate::fanout::LogsReceiver;
use crate::log::Log;

/// Observer that replays delivered logs into its own registry
#[derive(Debug)]
pub struct RegistryProjection {
    applier: Mutex<StateApplier>,
}

impl RegistryProjection {
    pub fn new(registry: Registry, health: HealthPolicy) -> Self {
        Self {
            applier: Mutex::new(StateApplier::new(registry, health)),
        }
    }

    /// Copy of the projected registry
    pub fn registry(&self) -> Registry {
        self.applier.lock().registry().clone()
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<Combatant> {
        self.applier.lock().registry().get(id).cloned()
    }
}

#[async_trait]
impl LogsReceiver for RegistryProjection {
    fn name(&self) -> &str {
        "registry-projection"
    }

    async fn receive_logs(&self, _battle: BattleId, logs: &[Log]) -> anyhow::Result<()> {
        let Some(tick) = logs.first().map(|l| l.tick) else {
            return Ok(());
        };
        let report = self.applier.lock().apply_tick(tick, logs)?;
        if let Some(fault) = report.faults.into_iter().next() {
            return Err(fault.into());
        }
        Ok(())
    }
}
