//! Combatant registry
//!
//! Fixed set of combatants for one battle, keyed by ID. Combatants are
//! registered at construction and never added or removed afterwards.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{Combatant, CombatantId};

/// Registry construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate combatant id {0}")]
    DuplicateId(CombatantId),
}

/// The set of combatants in a battle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    combatants: BTreeMap<CombatantId, Combatant>,
}

impl Registry {
    /// Build a registry, rejecting duplicate IDs
    pub fn new(combatants: impl IntoIterator<Item = Combatant>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for combatant in combatants {
            let id = combatant.id();
            if map.insert(id, combatant).is_some() {
                return Err(RegistryError::DuplicateId(id));
            }
        }
        Ok(Self { combatants: map })
    }

    pub fn get(&self, id: &CombatantId) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id)
    }

    pub fn contains(&self, id: &CombatantId) -> bool {
        self.combatants.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Iterate combatants in ID order
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    /// Count of combatants still alive
    pub fn alive_count(&self) -> usize {
        self.combatants.values().filter(|c| c.is_alive()).count()
    }

    /// Copy of every combatant, in ID order
    pub fn snapshot(&self) -> Vec<Combatant> {
        self.combatants.values().cloned().collect()
    }
}
