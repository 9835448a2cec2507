//! Combatants and the combatant registry
//!
//! A combatant is an identity, a liveness tag and a bag of stats.
//! Only the state application engine mutates combatants after a
//! battle starts.

mod registry;

pub use registry::{Registry, RegistryError};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::{Attributes, Value};

/// Opaque combatant identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(Uuid);

impl CombatantId {
    /// Generate a fresh random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Stable ID derived from a human-readable name
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CombatantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Liveness of a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantState {
    #[default]
    Alive,
    /// Terminal for the rest of the battle
    Incapacitated,
}

impl fmt::Display for CombatantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CombatantState::Alive => "alive",
            CombatantState::Incapacitated => "incapacitated",
        };
        write!(f, "{}", s)
    }
}

/// A participant in a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    id: CombatantId,
    pub state: CombatantState,
    pub stats: Attributes,
}

impl Combatant {
    /// Create an alive combatant with the given stats
    pub fn new(id: CombatantId, stats: Attributes) -> Self {
        Self {
            id,
            state: CombatantState::Alive,
            stats,
        }
    }

    /// The combatant's ID (fixed for its lifetime)
    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.state == CombatantState::Alive
    }

    /// Read a stat
    pub fn stat(&self, name: &str) -> Option<&Value> {
        self.stats.get(name)
    }

    /// Read a numeric stat
    pub fn number(&self, name: &str) -> Option<f64> {
        self.stats.get(name).and_then(Value::as_number)
    }

    /// Builder-style stat setter for constructing rosters
    pub fn with_stat(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.stats.insert(name.into(), value.into());
        self
    }
}
