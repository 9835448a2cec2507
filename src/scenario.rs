//! Scripted battle scenarios
//!
//! A scenario names its combatants and lists the actions to submit on
//! each tick. Names map to stable combatant IDs, and action IDs derive
//! from their position in the script, so a scenario always produces the
//! same logs.
//!
//! ```json
//! {
//!   "combatants": [
//!     { "name": "A", "stats": { "health": 10 } },
//!     { "name": "B", "stats": { "health": 10 } }
//!   ],
//!   "ticks": [
//!     { "tick": 1, "actions": [
//!       { "type": "attack", "source": "A", "target": "B", "params": { "damage": 12 } }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::action::{Action, ActionId, ScriptedActions};
use crate::combatant::{Combatant, CombatantId};
use crate::value::{Attributes, Value};

/// Scenario loading errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate combatant name '{0}'")]
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCombatant {
    pub name: String,
    #[serde(default)]
    pub stats: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub params: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTick {
    pub tick: u64,
    #[serde(default)]
    pub actions: Vec<ScenarioAction>,
}

/// A roster plus a per-tick action script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub combatants: Vec<ScenarioCombatant>,
    #[serde(default)]
    pub ticks: Vec<ScenarioTick>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        let mut names = std::collections::HashSet::new();
        for c in &scenario.combatants {
            if !names.insert(c.name.as_str()) {
                return Err(ScenarioError::DuplicateName(c.name.clone()));
            }
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Combatants with IDs derived from their names
    ///
    /// The name is also kept as a `name` stat for display.
    pub fn roster(&self) -> Vec<Combatant> {
        self.combatants
            .iter()
            .map(|c| {
                Combatant::new(CombatantId::from_name(&c.name), c.stats.clone())
                    .with_stat("name", Value::from(c.name.as_str()))
            })
            .collect()
    }

    /// Action script keyed by tick
    ///
    /// Unknown names are not an error here; the engine rejects them.
    pub fn script(&self) -> ScriptedActions {
        let script = ScriptedActions::new();
        for tick in &self.ticks {
            for (index, a) in tick.actions.iter().enumerate() {
                let name = format!("scenario:{}:{}", tick.tick, index);
                let id = ActionId::from(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()));
                let mut action = Action::new(
                    a.kind.as_str(),
                    CombatantId::from_name(&a.source),
                    CombatantId::from_name(&a.target),
                )
                .with_id(id);
                action.params = a.params.clone();
                script.push(tick.tick, action);
            }
        }
        script
    }

    /// Highest tick number with scripted actions
    pub fn last_tick(&self) -> u64 {
        self.ticks.iter().map(|t| t.tick).max().unwrap_or(0)
    }

    /// Name for a combatant ID, if it belongs to this scenario
    pub fn name_of(&self, id: &CombatantId) -> Option<&str> {
        self.combatants
            .iter()
            .find(|c| CombatantId::from_name(&c.name) == *id)
            .map(|c| c.name.as_str())
    }
}
