//! Rule policies
//!
//! The engine knows nothing about damage formulas. Each action type is
//! handled by a [`RulePolicy`] registered in a [`RuleBook`]:
//! - Priority, the primary ordering key when resolving a tick
//! - Resolution of an action into zero or more effects
//!
//! [`RuleBook::standard`] ships sample policies for `attack`, `heal` and
//! `pass`.

mod damage;
mod dice;
mod standard;

pub use damage::DamageModifier;
pub use dice::{parse_dice, DiceError, DiceRoll, MAX_DICE, MAX_MODIFIER, MAX_SIDES};
pub use standard::{AttackRule, HealRule, PassRule};

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::action::Action;
use crate::combatant::Registry;
use crate::log::Effect;

/// Errors a rule can raise for a malformed action
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleError {
    #[error("missing parameter '{0}'")]
    MissingParam(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("invalid source stat '{stat}': {reason}")]
    InvalidStat { stat: String, reason: String },

    #[error("rule panicked: {0}")]
    Panicked(String),
}

/// Policy for one action type
pub trait RulePolicy: Send + Sync {
    /// Ordering priority; higher resolves first within a tick
    fn priority(&self) -> i32;

    /// Compute the effects of a validated action
    ///
    /// `view` is the registry as it stood at the start of the tick.
    fn resolve(&self, action: &Action, view: &Registry) -> Result<Vec<Effect>, RuleError>;
}

/// Rule policies keyed by action type
#[derive(Clone, Default)]
pub struct RuleBook {
    rules: BTreeMap<String, Arc<dyn RulePolicy>>,
}

impl fmt::Debug for RuleBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBook")
            .field("kinds", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleBook {
    /// Empty rule book; every action type is unknown
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule book with the sample `attack`, `heal` and `pass` policies
    pub fn standard() -> Self {
        Self::new()
            .with_rule("attack", AttackRule)
            .with_rule("heal", HealRule)
            .with_rule("pass", PassRule)
    }

    /// Register (or replace) the policy for an action type
    pub fn with_rule(mut self, kind: impl Into<String>, rule: impl RulePolicy + 'static) -> Self {
        self.insert(kind, Arc::new(rule));
        self
    }

    pub fn insert(&mut self, kind: impl Into<String>, rule: Arc<dyn RulePolicy>) {
        self.rules.insert(kind.into(), rule);
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn RulePolicy>> {
        self.rules.get(kind)
    }

    pub fn recognizes(&self, kind: &str) -> bool {
        self.rules.contains_key(kind)
    }

    /// Registered action types, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
