//! Lifecycle scenarios: cancellation, pause, scheduler and observer failure

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use skirmish::{
    Action, ActionSource, Battle, BattleError, BattleId, Effect, Lifecycle, Log, LogsReceiver, Registry,
    RejectReason, RuleBook, RuleError, RulePolicy, TickEvent,
};
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::harness::{id, Arena, BlockingObserver, FailingObserver, RecordingObserver};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_cancel_stops_ticking() {
    let arena = Arena::new(&[("A", 10.0), ("B", 10.0)]);
    let battle = arena.battle();

    arena.attack("A", "B", 2.0);
    battle.tick().await.unwrap();
    let before = battle.log_count();

    battle.cancel().await.unwrap();
    assert_eq!(battle.lifecycle(), Lifecycle::Cancelled);

    arena.attack("A", "B", 2.0);
    assert!(matches!(
        battle.tick().await,
        Err(BattleError::NotRunning {
            state: Lifecycle::Cancelled
        })
    ));
    assert_eq!(battle.log_count(), before);
    assert_eq!(battle.list_logs().len(), before);
    assert_eq!(battle.current_tick(), 1);
}

#[tokio::test]
async fn test_cancel_unwinds_blocked_observer() {
    let arena = Arena::new(&[("A", 10.0), ("B", 10.0)]);
    let blocking = Arc::new(BlockingObserver::new());
    let battle = Arc::new(arena.builder().observer(blocking.clone()).build().unwrap());

    arena.attack("A", "B", 3.0);
    let ticking = {
        let battle = battle.clone();
        tokio::spawn(async move { battle.tick().await })
    };

    timeout(WAIT, blocking.entered()).await.unwrap();
    timeout(WAIT, battle.cancel()).await.unwrap().unwrap();

    let result = timeout(WAIT, ticking).await.unwrap().unwrap();
    assert!(matches!(result, Err(BattleError::Cancelled { tick: 1 })));

    // State was applied before delivery started
    assert_eq!(battle.log_count(), 1);
    assert_eq!(
        battle.combatant(&id("B")).await.unwrap().number("health"),
        Some(7.0)
    );
    assert!(matches!(
        battle.tick().await,
        Err(BattleError::NotRunning { .. })
    ));
}

#[tokio::test]
async fn test_observer_failure_surfaces_without_reapplying() {
    let arena = Arena::new(&[("A", 10.0), ("B", 10.0)]);
    let recorder = Arc::new(RecordingObserver::new());
    let battle = arena
        .builder()
        .observer(recorder.clone())
        .observer(Arc::new(FailingObserver))
        .build()
        .unwrap();
    let mut events = battle.subscribe();

    arena.attack("A", "B", 3.0);
    match battle.tick().await {
        Err(BattleError::Observer(e)) => {
            assert_eq!(e.index, 1);
            assert_eq!(e.name, "failing");
        }
        other => panic!("expected observer failure, got {:?}", other),
    }
    assert!(matches!(
        events.recv().await.unwrap(),
        TickEvent::Failed { tick: 1, .. }
    ));

    // Earlier observers got the batch; the registry was updated once
    assert_eq!(recorder.batches().len(), 1);
    assert_eq!(battle.log_count(), 1);
    assert_eq!(
        battle.combatant(&id("B")).await.unwrap().number("health"),
        Some(7.0)
    );

    // Empty ticks skip delivery and succeed; nothing is applied twice
    let report = battle.tick().await.unwrap();
    assert_eq!(report.tick, 2);
    assert_eq!(
        battle.combatant(&id("B")).await.unwrap().number("health"),
        Some(7.0)
    );
    assert_eq!(battle.replay(), battle.registry().await);
}

#[tokio::test]
async fn test_scheduler_ticks_until_paused() {
    let arena = Arena::new(&[("A", 100.0), ("B", 100.0)]);
    let battle = arena
        .builder()
        .tick_interval(Duration::from_millis(10))
        .build()
        .unwrap();
    let mut events = battle.subscribe();

    arena.attack("A", "B", 1.0);
    timeout(WAIT, async {
        loop {
            if let Ok(TickEvent::Completed(report)) = events.recv().await {
                if report.tick >= 3 {
                    break;
                }
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(battle.log_count(), 1);

    battle.pause().await.unwrap();
    let paused_at = battle.current_tick();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(battle.current_tick(), paused_at);
    assert!(matches!(
        battle.tick().await,
        Err(BattleError::NotRunning {
            state: Lifecycle::Paused
        })
    ));

    // Paused battles can still be cancelled
    battle.cancel().await.unwrap();
}

#[tokio::test]
async fn test_receiver_added_between_ticks() {
    let arena = Arena::new(&[("A", 10.0), ("B", 10.0)]);
    let battle = arena.battle();

    arena.attack("A", "B", 1.0);
    battle.tick().await.unwrap();

    let late = Arc::new(RecordingObserver::new());
    battle.add_logs_receiver(late.clone()).await.unwrap();

    let second = arena.attack("A", "B", 1.0);
    battle.tick().await.unwrap();

    let logs = late.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action.id, second);
    assert_eq!(logs[0].tick, 2);
}

#[tokio::test]
async fn test_receiver_rejected_after_cancel() {
    let arena = Arena::new(&[("A", 10.0)]);
    let battle = arena.battle();
    battle.cancel().await.unwrap();

    assert!(matches!(
        battle.add_logs_receiver(Arc::new(RecordingObserver::new())).await,
        Err(BattleError::NotRunning {
            state: Lifecycle::Cancelled
        })
    ));
}

struct BrokenSource;

#[async_trait]
impl ActionSource for BrokenSource {
    async fn pending_actions(&self, _tick: u64) -> anyhow::Result<Vec<Action>> {
        anyhow::bail!("queue offline")
    }
}

#[tokio::test]
async fn test_action_source_failure() {
    let arena = Arena::new(&[("A", 10.0)]);
    let battle = skirmish::Battle::builder(arena.combatants())
        .action_source(Arc::new(BrokenSource))
        .build()
        .unwrap();

    assert!(matches!(
        battle.tick().await,
        Err(BattleError::ActionSource(_))
    ));
    assert_eq!(battle.log_count(), 0);
    assert_eq!(battle.current_tick(), 0);
    assert!(battle.is_running());
}

/// Rule that always panics
struct Volatile;

impl RulePolicy for Volatile {
    fn priority(&self) -> i32 {
        0
    }

    fn resolve(&self, _action: &Action, _view: &Registry) -> Result<Vec<Effect>, RuleError> {
        panic!("volatile rule exploded")
    }
}

/// Observer that panics on its first delivery only
#[derive(Default)]
struct PanicsOnce {
    fired: AtomicBool,
}

#[async_trait]
impl LogsReceiver for PanicsOnce {
    async fn receive_logs(&self, _battle: BattleId, _logs: &[Log]) -> anyhow::Result<()> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            panic!("observer exploded");
        }
        Ok(())
    }
}

/// Source that panics on its first call, then yields one attack
#[derive(Default)]
struct StumblingSource {
    fired: AtomicBool,
}

#[async_trait]
impl ActionSource for StumblingSource {
    async fn pending_actions(&self, _tick: u64) -> anyhow::Result<Vec<Action>> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            panic!("source exploded");
        }
        Ok(vec![Action::new("attack", id("A"), id("B")).with_param("damage", 1.0)])
    }
}

async fn next_event(
    events: &mut broadcast::Receiver<TickEvent>,
    mut wanted: impl FnMut(&TickEvent) -> bool,
) -> TickEvent {
    timeout(WAIT, async {
        loop {
            if let Ok(event) = events.recv().await {
                if wanted(&event) {
                    return event;
                }
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_scheduler_survives_panics() {
    let arena = Arena::new(&[("A", 10.0), ("B", 10.0)]);
    let battle = arena
        .builder()
        .rules(RuleBook::standard().with_rule("explode", Volatile))
        .observer(Arc::new(PanicsOnce::default()))
        .tick_interval(Duration::from_millis(10))
        .build()
        .unwrap();
    let mut events = battle.subscribe();

    // A panicking rule rejects its action; the tick still completes
    let boom = arena.submit(Action::new("explode", id("A"), id("B")));
    let event = next_event(&mut events, |e| {
        matches!(e, TickEvent::Completed(r) if !r.rejections.is_empty())
    })
    .await;
    let TickEvent::Completed(report) = event else {
        unreachable!()
    };
    assert_eq!(report.rejections[0].action_id, boom);
    assert!(matches!(
        report.rejections[0].reason,
        RejectReason::Rule(RuleError::Panicked(_))
    ));

    // A panicking observer fails its tick and is reported
    arena.attack("A", "B", 1.0);
    let failed = next_event(&mut events, |e| matches!(e, TickEvent::Failed { .. })).await;
    let TickEvent::Failed { error, .. } = failed else {
        unreachable!()
    };
    assert!(error.contains("observer exploded"));

    // The scheduler keeps going
    arena.attack("A", "B", 1.0);
    next_event(&mut events, |e| matches!(e, TickEvent::Completed(r) if r.logs == 1)).await;

    assert_eq!(battle.lifecycle(), Lifecycle::Running);
    assert_eq!(battle.log_count(), 2);
    assert_eq!(
        battle.combatant(&id("B")).await.unwrap().number("health"),
        Some(8.0)
    );
    battle.cancel().await.unwrap();
}

#[tokio::test]
async fn test_panicking_tick_does_not_use_up_tick_number() {
    let arena = Arena::new(&[("A", 10.0), ("B", 10.0)]);
    let battle = Battle::builder(arena.combatants())
        .action_source(Arc::new(StumblingSource::default()))
        .build()
        .unwrap();

    assert!(matches!(
        battle.tick().await,
        Err(BattleError::Panicked { tick: 1, .. })
    ));
    assert_eq!(battle.current_tick(), 0);
    assert_eq!(battle.log_count(), 0);

    let report = battle.tick().await.unwrap();
    assert_eq!(report.tick, 1);
    assert_eq!(report.logs, 1);
    assert_eq!(battle.list_logs()[0].tick, 1);
}
