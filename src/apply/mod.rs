//! State application engine
//!
//! Applies logs, strictly in order, to a combatant registry. A combatant
//! whose health drops to zero or below becomes incapacitated, and
//! nothing here ever makes it alive again.
//!
//! Application is plain sequential mutation. [`StateApplier::apply_tick`]
//! refuses to apply the same tick twice so callers get at-most-once
//! application for free.

mod projection;

pub use projection::RegistryProjection;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::combatant::{Combatant, CombatantId, CombatantState, Registry};
use crate::log::{EffectKind, Log, LogId};
use crate::value::Value;

/// A log that names a combatant missing from the registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("log {log_id} targets combatant {combatant} which is not in the registry")]
pub struct ConsistencyFault {
    pub log_id: LogId,
    pub combatant: CombatantId,
}

/// Application errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("tick {tick} already applied (last applied tick is {last})")]
    StaleTick { tick: u64, last: u64 },
}

/// Which stats count as health and how they are bounded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPolicy {
    /// Stat whose non-positive value incapacitates
    pub stat: String,
    /// Optional ceiling for healing
    pub max_stat: String,
    /// Clamp health at zero instead of letting it go negative
    pub clamp: bool,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            stat: "health".to_string(),
            max_stat: "max_health".to_string(),
            clamp: true,
        }
    }
}

/// Outcome of applying a batch of logs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Logs applied successfully
    pub applied: usize,
    /// Logs skipped because their target is missing
    pub faults: Vec<ConsistencyFault>,
    /// Combatants that became incapacitated during this batch
    pub incapacitated: Vec<CombatantId>,
}

/// Owns a registry and mutates it from logs
#[derive(Debug, Clone)]
pub struct StateApplier {
    registry: Registry,
    health: HealthPolicy,
    last_tick: Option<u64>,
}

impl StateApplier {
    pub fn new(registry: Registry, health: HealthPolicy) -> Self {
        Self {
            registry,
            health,
            last_tick: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Last tick applied through [`apply_tick`](Self::apply_tick)
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Apply one tick's logs, at most once per tick number
    pub fn apply_tick(&mut self, tick: u64, logs: &[Log]) -> Result<ApplyReport, ApplyError> {
        if let Some(last) = self.last_tick {
            if tick <= last {
                return Err(ApplyError::StaleTick { tick, last });
            }
        }
        self.last_tick = Some(tick);
        Ok(self.apply(logs))
    }

    /// Apply logs in order
    ///
    /// A missing target is a consistency fault for that log only; the
    /// remaining logs still apply.
    pub fn apply(&mut self, logs: &[Log]) -> ApplyReport {
        let mut report = ApplyReport::default();

        for log in logs {
            let target = log.target();
            let Some(combatant) = self.registry.get_mut(&target) else {
                let fault = ConsistencyFault {
                    log_id: log.id,
                    combatant: target,
                };
                error!(tick = log.tick, "{}", fault);
                report.faults.push(fault);
                continue;
            };

            apply_effect(combatant, &log.effect, &self.health);
            report.applied += 1;

            if combatant.is_alive() && is_down(combatant, &self.health) {
                combatant.state = CombatantState::Incapacitated;
                info!(
                    combatant = %target,
                    tick = log.tick,
                    "Combatant incapacitated"
                );
                report.incapacitated.push(target);
            }
        }

        report
    }
}

fn apply_effect(combatant: &mut Combatant, effect: &EffectKind, health: &HealthPolicy) {
    match effect {
        EffectKind::Damage { amount } => {
            let current = combatant.number(&health.stat).unwrap_or(0.0);
            let mut next = current - amount;
            if health.clamp {
                next = next.max(0.0);
            }
            combatant.stats.insert(health.stat.clone(), Value::Number(next));
        }
        EffectKind::Heal { amount } => {
            let current = combatant.number(&health.stat).unwrap_or(0.0);
            let mut next = current + amount;
            if let Some(max) = combatant.number(&health.max_stat) {
                next = next.min(max.max(current));
            }
            combatant.stats.insert(health.stat.clone(), Value::Number(next));
        }
        EffectKind::Adjust { stat, delta } => {
            let current = combatant.number(stat).unwrap_or(0.0);
            combatant.stats.insert(stat.clone(), Value::Number(current + delta));
        }
        EffectKind::Set { stat, value } => {
            combatant.stats.insert(stat.clone(), value.clone());
        }
        EffectKind::Note => {}
    }
}

fn is_down(combatant: &Combatant, health: &HealthPolicy) -> bool {
    combatant.number(&health.stat).is_some_and(|hp| hp <= 0.0)
}
