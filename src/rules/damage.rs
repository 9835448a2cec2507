//! Damage modifiers
//!
//! A combatant may carry a `resistances` stat: a map from damage type
//! name to one of `immune`, `resistant`, `normal` or `vulnerable`.

use std::str::FromStr;

use crate::combatant::Combatant;
use crate::value::Value;

/// Stat holding the per-damage-type modifier map
pub const RESISTANCES_STAT: &str = "resistances";

/// Modifier for damage resistance/immunity/vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DamageModifier {
    /// Takes 0% damage
    Immune,
    /// Takes 50% damage (rounded down)
    Resistant,
    #[default]
    Normal,
    /// Takes 200% damage
    Vulnerable,
}

impl DamageModifier {
    /// Apply this modifier to a damage amount
    pub fn apply(&self, damage: f64) -> f64 {
        match self {
            DamageModifier::Immune => 0.0,
            DamageModifier::Resistant => (damage / 2.0).floor(),
            DamageModifier::Normal => damage,
            DamageModifier::Vulnerable => damage * 2.0,
        }
    }

    pub fn percentage(&self) -> u32 {
        match self {
            DamageModifier::Immune => 0,
            DamageModifier::Resistant => 50,
            DamageModifier::Normal => 100,
            DamageModifier::Vulnerable => 200,
        }
    }

    /// Modifier the target has against `damage_type` (normal if unlisted)
    pub fn for_target(target: &Combatant, damage_type: &str) -> Self {
        target
            .stat(RESISTANCES_STAT)
            .and_then(Value::as_map)
            .and_then(|m| m.get(damage_type))
            .and_then(Value::as_text)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for DamageModifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "immune" | "immunity" => Ok(DamageModifier::Immune),
            "resistant" | "resist" => Ok(DamageModifier::Resistant),
            "normal" => Ok(DamageModifier::Normal),
            "vulnerable" | "weak" => Ok(DamageModifier::Vulnerable),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DamageModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DamageModifier::Immune => "immune",
            DamageModifier::Resistant => "resistant",
            DamageModifier::Normal => "normal",
            DamageModifier::Vulnerable => "vulnerable",
        };
        write!(f, "{}", s)
    }
}
