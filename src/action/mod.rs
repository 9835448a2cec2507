//! Submitted actions
//!
//! An action is an intent from one combatant against another. Actions
//! are created by an external submitter and consumed once by the
//! resolution engine.

mod source;

pub use source::{ActionQueue, ActionSource, ScriptedActions};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::combatant::CombatantId;
use crate::value::{Attributes, Value};

/// Unique action identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ActionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A submitted intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    /// Action type tag, matched against the rule book
    #[serde(rename = "type")]
    pub kind: String,
    pub source: CombatantId,
    pub target: CombatantId,
    /// Submission order, second ordering key after rule priority
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub params: Attributes,
}

impl Action {
    /// Create an action with a fresh ID and no params
    pub fn new(kind: impl Into<String>, source: CombatantId, target: CombatantId) -> Self {
        Self {
            id: ActionId::new(),
            kind: kind.into(),
            source,
            target,
            sequence: 0,
            params: Attributes::new(),
        }
    }

    pub fn with_id(mut self, id: ActionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Read a numeric parameter
    pub fn number(&self, name: &str) -> Option<f64> {
        self.params.get(name).and_then(Value::as_number)
    }

    /// Read a text parameter
    pub fn text(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_text)
    }
}
