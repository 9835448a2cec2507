//! Action resolution engine
//!
//! Turns one tick's batch of submitted actions into an ordered sequence
//! of logs:
//! - Validation (source alive, target present, type known)
//! - Deterministic ordering (priority, sequence, action ID)
//! - Resolution through the rule book, one log per effect
//!
//! Resolution never touches combatant state. Invalid actions become
//! [`Rejection`]s and do not stop the rest of the batch.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, error};

use crate::action::{Action, ActionId};
use crate::combatant::{CombatantId, Registry};
use crate::log::{Log, LogId};
use crate::rules::{panic_message, RuleBook, RuleError};

/// Why an action was not resolved
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RejectReason {
    #[error("source combatant {0} is not in this battle")]
    UnknownSource(CombatantId),

    #[error("source combatant {0} is incapacitated")]
    SourceIncapacitated(CombatantId),

    #[error("target combatant {0} is not in this battle")]
    UnknownTarget(CombatantId),

    #[error("unknown action type '{0}'")]
    UnknownActionType(String),

    #[error("duplicate action id in batch")]
    Duplicate,

    #[error("action was already consumed in an earlier tick")]
    AlreadyConsumed,

    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// A per-action validation failure, reported back to the submitter
#[derive(Debug, Clone, Error, PartialEq)]
#[error("action {action_id} rejected: {reason}")]
pub struct Rejection {
    pub action_id: ActionId,
    pub reason: RejectReason,
}

impl Rejection {
    pub fn new(action_id: ActionId, reason: RejectReason) -> Self {
        Self { action_id, reason }
    }
}

/// Output of resolving one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Logs in application order
    pub logs: Vec<Log>,
    /// Rejected actions, in resolution order
    pub rejections: Vec<Rejection>,
}

/// Validates, orders and resolves action batches
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    rules: RuleBook,
}

impl ResolutionEngine {
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Check a single action against the registry and rule book
    pub fn validate(&self, action: &Action, registry: &Registry) -> Result<(), RejectReason> {
        let source = registry
            .get(&action.source)
            .ok_or(RejectReason::UnknownSource(action.source))?;
        if !source.is_alive() {
            return Err(RejectReason::SourceIncapacitated(action.source));
        }
        if !registry.contains(&action.target) {
            return Err(RejectReason::UnknownTarget(action.target));
        }
        if !self.rules.recognizes(&action.kind) {
            return Err(RejectReason::UnknownActionType(action.kind.clone()));
        }
        Ok(())
    }

    /// Sort a batch into resolution order
    ///
    /// Higher rule priority first, then ascending submission sequence,
    /// then ascending action ID. Unknown types sort last.
    pub fn order(&self, actions: &mut [Action]) {
        actions.sort_by_key(|a| {
            let priority = self
                .rules
                .get(&a.kind)
                .map(|r| r.priority())
                .unwrap_or(i32::MIN);
            (Reverse(priority), a.sequence, a.id)
        });
    }

    /// Resolve one tick's batch against the pre-tick registry
    pub fn resolve(&self, tick: u64, mut actions: Vec<Action>, registry: &Registry) -> Resolution {
        self.order(&mut actions);

        let mut resolution = Resolution::default();
        let mut seen = HashSet::with_capacity(actions.len());

        for action in actions {
            if !seen.insert(action.id) {
                resolution.reject(&action, RejectReason::Duplicate);
                continue;
            }
            if let Err(reason) = self.validate(&action, registry) {
                resolution.reject(&action, reason);
                continue;
            }

            // validate() guarantees the rule exists
            let Some(rule) = self.rules.get(&action.kind) else {
                continue;
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.resolve(&action, registry)))
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    error!(action = %action.id, kind = %action.kind, %message, "Rule policy panicked");
                    Err(RuleError::Panicked(message))
                });
            let effects = match outcome {
                Ok(effects) => effects,
                Err(e) => {
                    resolution.reject(&action, e.into());
                    continue;
                }
            };

            for (index, effect) in effects.into_iter().enumerate() {
                let ordinal = resolution.logs.len() as u32;
                resolution.logs.push(Log {
                    id: LogId::for_effect(&action.id, index),
                    tick,
                    ordinal,
                    action: action.clone(),
                    effect: effect.kind,
                    details: effect.details,
                });
            }
        }

        resolution
    }
}

impl Resolution {
    fn reject(&mut self, action: &Action, reason: RejectReason) {
        debug!(
            action = %action.id,
            kind = %action.kind,
            reason = %reason,
            "Action rejected"
        );
        self.rejections.push(Rejection::new(action.id, reason));
    }
}
