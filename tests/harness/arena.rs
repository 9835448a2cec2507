//! Arena - a named roster wired to an action queue

#![allow(dead_code)]

use std::sync::Arc;

use skirmish::{Action, ActionId, ActionQueue, Attributes, Battle, BattleBuilder, Combatant, CombatantId};

/// Combatant ID for a roster name
pub fn id(name: &str) -> CombatantId {
    CombatantId::from_name(name)
}

/// Combatants by name, each with a starting health
pub struct Arena {
    pub queue: Arc<ActionQueue>,
    combatants: Vec<Combatant>,
}

impl Arena {
    pub fn new(roster: &[(&str, f64)]) -> Self {
        let combatants = roster
            .iter()
            .map(|(name, health)| Combatant::new(id(name), Attributes::new()).with_stat("health", *health))
            .collect();
        Self {
            queue: Arc::new(ActionQueue::new()),
            combatants,
        }
    }

    /// Set an extra stat on a named combatant
    pub fn with_stat(mut self, name: &str, stat: &str, value: impl Into<skirmish::Value>) -> Self {
        let value = value.into();
        let target = id(name);
        self.combatants = self
            .combatants
            .into_iter()
            .map(|c| if c.id() == target { c.with_stat(stat, value.clone()) } else { c })
            .collect();
        self
    }

    pub fn combatants(&self) -> Vec<Combatant> {
        self.combatants.clone()
    }

    /// Manual-tick battle fed by this arena's queue
    pub fn builder(&self) -> BattleBuilder {
        Battle::builder(self.combatants()).action_source(self.queue.clone())
    }

    pub fn battle(&self) -> Battle {
        self.builder().build().expect("Failed to build battle")
    }

    pub fn submit(&self, action: Action) -> ActionId {
        self.queue.submit(action)
    }

    pub fn attack(&self, source: &str, target: &str, damage: f64) -> ActionId {
        self.submit(Action::new("attack", id(source), id(target)).with_param("damage", damage))
    }

    pub fn heal(&self, source: &str, target: &str, amount: f64) -> ActionId {
        self.submit(Action::new("heal", id(source), id(target)).with_param("amount", amount))
    }
}
