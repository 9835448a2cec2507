//! Sample rule policies
//!
//! Deliberately simple. Real games register their own policies.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::damage::DamageModifier;
use super::dice::parse_dice;
use super::{RuleError, RulePolicy};
use crate::action::Action;
use crate::combatant::Registry;
use crate::log::Effect;
use crate::value::{attributes, Value};

const DEFAULT_DAMAGE_TYPE: &str = "physical";
const ATTACK_STAT: &str = "attack";
const AMOUNT_REASON: &str = "must be a finite, non-negative number";

fn is_amount(n: f64) -> bool {
    n.is_finite() && n >= 0.0
}

/// Direct attack against the target
///
/// Base damage comes from, in order: the `damage` param, a `dice` param
/// such as "2d6+3", the source's `attack` stat, or 1. The target's
/// `resistances` stat scales it by `damage_type` (default "physical").
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackRule;

impl AttackRule {
    fn base_damage(action: &Action, view: &Registry) -> Result<(f64, Option<Value>), RuleError> {
        if let Some(damage) = action.params.get("damage") {
            let amount = damage
                .as_number()
                .filter(|n| is_amount(*n))
                .ok_or_else(|| RuleError::InvalidParam {
                    name: "damage".to_string(),
                    reason: AMOUNT_REASON.to_string(),
                })?;
            return Ok((amount, None));
        }

        if let Some(notation) = action.text("dice") {
            let roll = parse_dice(notation).map_err(|e| RuleError::InvalidParam {
                name: "dice".to_string(),
                reason: e.to_string(),
            })?;
            // Seeded from the action ID
            let (hi, lo) = action.id.as_uuid().as_u64_pair();
            let mut rng = StdRng::seed_from_u64(hi ^ lo);
            let (dice, total) = roll.roll(&mut rng);
            let rolled = dice.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
            let detail = Value::Map(attributes([
                ("notation", roll.to_string()),
                ("dice", rolled),
            ]));
            return Ok((total.max(0) as f64, Some(detail)));
        }

        match view.get(&action.source).and_then(|c| c.number(ATTACK_STAT)) {
            Some(attack) if !is_amount(attack) => Err(RuleError::InvalidStat {
                stat: ATTACK_STAT.to_string(),
                reason: AMOUNT_REASON.to_string(),
            }),
            Some(attack) => Ok((attack, None)),
            None => Ok((1.0, None)),
        }
    }
}

impl RulePolicy for AttackRule {
    fn priority(&self) -> i32 {
        10
    }

    fn resolve(&self, action: &Action, view: &Registry) -> Result<Vec<Effect>, RuleError> {
        let (base, roll) = Self::base_damage(action, view)?;

        let damage_type = action.text("damage_type").unwrap_or(DEFAULT_DAMAGE_TYPE);
        let modifier = view
            .get(&action.target)
            .map(|target| DamageModifier::for_target(target, damage_type))
            .unwrap_or_default();
        let amount = modifier.apply(base);

        let mut effect = Effect::damage(amount)
            .with_detail("base_damage", base)
            .with_detail("damage_type", damage_type)
            .with_detail("modifier", modifier.to_string());
        if let Some(roll) = roll {
            effect = effect.with_detail("roll", roll);
        }
        Ok(vec![effect])
    }
}

/// Restore health to the target by the `amount` param
#[derive(Debug, Clone, Copy, Default)]
pub struct HealRule;

impl RulePolicy for HealRule {
    fn priority(&self) -> i32 {
        20
    }

    fn resolve(&self, action: &Action, _view: &Registry) -> Result<Vec<Effect>, RuleError> {
        let amount = action
            .number("amount")
            .ok_or_else(|| RuleError::MissingParam("amount".to_string()))?;
        if !is_amount(amount) {
            return Err(RuleError::InvalidParam {
                name: "amount".to_string(),
                reason: AMOUNT_REASON.to_string(),
            });
        }
        Ok(vec![Effect::heal(amount)])
    }
}

/// Do nothing this tick
#[derive(Debug, Clone, Copy, Default)]
pub struct PassRule;

impl RulePolicy for PassRule {
    fn priority(&self) -> i32 {
        0
    }

    fn resolve(&self, _action: &Action, _view: &Registry) -> Result<Vec<Effect>, RuleError> {
        Ok(Vec::new())
    }
}
