//! Determinism: same combatants and same batch give byte-identical logs

use proptest::prelude::*;
use skirmish::{Action, ActionId, Battle, Combatant, Registry, ResolutionEngine, RuleBook, ScriptedActions};
use std::sync::Arc;
use uuid::Uuid;

use crate::harness::{id, Arena};

fn fixed_id(n: u128) -> ActionId {
    ActionId::from(Uuid::from_u128(n))
}

/// A mixed batch with fixed IDs and sequence numbers
fn batch() -> Vec<Action> {
    vec![
        Action::new("attack", id("A"), id("B"))
            .with_id(fixed_id(1))
            .with_sequence(0)
            .with_param("dice", "2d6+1"),
        Action::new("heal", id("C"), id("B"))
            .with_id(fixed_id(2))
            .with_sequence(1)
            .with_param("amount", 3.0),
        Action::new("attack", id("B"), id("C"))
            .with_id(fixed_id(3))
            .with_sequence(2)
            .with_param("damage", 4.0),
        Action::new("pass", id("C"), id("C"))
            .with_id(fixed_id(4))
            .with_sequence(3),
        Action::new("attack", id("C"), id("A"))
            .with_id(fixed_id(5))
            .with_sequence(4),
        Action::new("attack", id("A"), id("nobody"))
            .with_id(fixed_id(6))
            .with_sequence(5),
    ]
}

fn roster() -> Vec<Combatant> {
    Arena::new(&[("A", 20.0), ("B", 20.0), ("C", 20.0)])
        .with_stat("C", "attack", 2.0)
        .combatants()
}

async fn run(actions: Vec<Action>) -> String {
    let script = ScriptedActions::new();
    for action in actions {
        script.push(1, action);
    }
    let battle = Battle::builder(roster())
        .action_source(Arc::new(script))
        .build()
        .unwrap();
    battle.tick().await.unwrap();
    serde_json::to_string(&battle.list_logs()).unwrap()
}

#[tokio::test]
async fn test_identical_batches_identical_logs() {
    let first = run(batch()).await;
    let second = run(batch()).await;
    assert_eq!(first, second);
    assert!(first.contains("\"roll\""));
}

#[tokio::test]
async fn test_dice_roll_recorded_in_details() {
    let json = run(batch()).await;
    let logs: Vec<skirmish::Log> = serde_json::from_str(&json).unwrap();
    let attack = logs
        .iter()
        .find(|l| l.action.id == fixed_id(1))
        .unwrap();
    let roll = attack.details.get("roll").and_then(|v| v.as_map()).unwrap();
    assert_eq!(roll.get("notation").and_then(|v| v.as_text()), Some("2d6+1"));

    let base = attack.details.get("base_damage").and_then(|v| v.as_number()).unwrap();
    assert!((3.0..=13.0).contains(&base));
}

proptest! {
    #[test]
    fn prop_submission_order_does_not_matter(order in Just((0..6).collect::<Vec<usize>>()).prop_shuffle()) {
        let registry = Registry::new(roster()).unwrap();
        let engine = ResolutionEngine::new(RuleBook::standard());

        let reference = engine.resolve(1, batch(), &registry);

        let actions = batch();
        let shuffled: Vec<Action> = order.iter().map(|&i| actions[i].clone()).collect();
        let resolution = engine.resolve(1, shuffled, &registry);

        prop_assert_eq!(
            serde_json::to_string(&resolution.logs).unwrap(),
            serde_json::to_string(&reference.logs).unwrap()
        );
        prop_assert_eq!(resolution.rejections, reference.rejections);
    }
}
