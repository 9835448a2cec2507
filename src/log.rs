//! Battle logs
//!
//! A log is the immutable record of one resolved effect. The ordered
//! log history is the authoritative record of a battle; combatant state
//! is a projection of replaying it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::{Action, ActionId};
use crate::combatant::CombatantId;
use crate::value::{Attributes, Value};

/// Unique log identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(Uuid);

impl LogId {
    /// ID for the `index`-th effect of an action
    ///
    /// Derived rather than random so that resolving the same batch twice
    /// yields identical logs. Unique as long as action IDs are.
    pub fn for_effect(action: &ActionId, index: usize) -> Self {
        let name = format!("effect:{}", index);
        Self(Uuid::new_v5(action.as_uuid(), name.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a resolved effect does to its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    /// Lower the target's health stat
    Damage { amount: f64 },
    /// Raise the target's health stat (never revives)
    Heal { amount: f64 },
    /// Add `delta` to a numeric stat
    Adjust { stat: String, delta: f64 },
    /// Overwrite a stat
    Set { stat: String, value: Value },
    /// No state change; informational only
    Note,
}

/// An effect computed by a rule, before it becomes a log
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    /// Policy-specific extras recorded alongside the effect
    pub details: Attributes,
}

impl Effect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            details: Attributes::new(),
        }
    }

    pub fn damage(amount: f64) -> Self {
        Self::new(EffectKind::Damage { amount })
    }

    pub fn heal(amount: f64) -> Self {
        Self::new(EffectKind::Heal { amount })
    }

    pub fn note() -> Self {
        Self::new(EffectKind::Note)
    }

    pub fn with_detail(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(name.into(), value.into());
        self
    }
}

/// Immutable record of one resolved effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub id: LogId,
    /// Tick that produced this log
    pub tick: u64,
    /// Position within the tick's log batch
    pub ordinal: u32,
    /// The action that caused the effect
    pub action: Action,
    pub effect: EffectKind,
    #[serde(default)]
    pub details: Attributes,
}

impl Log {
    /// The combatant this log applies to
    pub fn target(&self) -> CombatantId {
        self.action.target
    }
}
