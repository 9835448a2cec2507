//! Battle controller
//!
//! Owns one battle's timeline:
//! - Tick scheduling (optional periodic scheduler, or manual `tick()`)
//! - Lifecycle: Running → Paused | Cancelled, Paused → Cancelled
//! - The append-only log history
//! - Wiring of resolution, state application and fan-out per tick
//!
//! Pause and cancel both end ticking for good; there is no resume.
//! Cancel additionally releases the observers and the action source.

mod pipeline;
mod scheduler;
mod scope;

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::action::ActionSource;
use crate::apply::{ApplyError, ConsistencyFault, HealthPolicy, StateApplier};
use crate::combatant::{Combatant, CombatantId, Registry, RegistryError};
use crate::config::EngineConfig;
use crate::fanout::{Fanout, FanoutError, LogsReceiver};
use crate::log::Log;
use crate::resolve::{Rejection, ResolutionEngine};
use crate::rules::RuleBook;

use pipeline::{Pipeline, Shared};

/// Default capacity of the tick event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Unique battle identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleId(Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for BattleId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Battle lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Running,
    Paused,
    Cancelled,
}

impl Lifecycle {
    pub fn is_running(&self) -> bool {
        matches!(self, Lifecycle::Running)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifecycle::Running => "running",
            Lifecycle::Paused => "paused",
            Lifecycle::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Battle controller errors
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("battle is {state}")]
    NotRunning { state: Lifecycle },

    #[error("tick {tick} interrupted by cancellation")]
    Cancelled { tick: u64 },

    #[error("action source failed: {0}")]
    ActionSource(#[source] anyhow::Error),

    #[error(transparent)]
    Observer(#[from] FanoutError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("tick {tick} panicked: {message}")]
    Panicked { tick: u64, message: String },

    #[error("a tick interval requires a Tokio runtime")]
    NoRuntime,
}

/// Summary of one completed tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Logs produced (and appended to history)
    pub logs: usize,
    /// Actions that did not resolve
    pub rejections: Vec<Rejection>,
    /// Logs that could not be applied
    pub faults: Vec<ConsistencyFault>,
    /// Combatants incapacitated this tick
    pub incapacitated: Vec<CombatantId>,
}

/// Published after every tick attempt that got past the lifecycle check
#[derive(Debug, Clone)]
pub enum TickEvent {
    Completed(TickReport),
    Failed { tick: u64, error: String },
}

/// Configures and starts a [`Battle`]
pub struct BattleBuilder {
    id: BattleId,
    combatants: Vec<Combatant>,
    rules: RuleBook,
    source: Option<Arc<dyn ActionSource>>,
    observers: Vec<Arc<dyn LogsReceiver>>,
    health: HealthPolicy,
    tick_interval: Option<Duration>,
    event_capacity: usize,
}

impl BattleBuilder {
    fn new(combatants: Vec<Combatant>) -> Self {
        Self {
            id: BattleId::new(),
            combatants,
            rules: RuleBook::standard(),
            source: None,
            observers: Vec::new(),
            health: HealthPolicy::default(),
            tick_interval: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn id(mut self, id: BattleId) -> Self {
        self.id = id;
        self
    }

    /// Rule book to resolve actions with (default: standard rules)
    pub fn rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    pub fn action_source(mut self, source: Arc<dyn ActionSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Register an observer before the first tick
    pub fn observer(mut self, observer: Arc<dyn LogsReceiver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn health(mut self, health: HealthPolicy) -> Self {
        self.health = health;
        self
    }

    /// Tick automatically on this period once built
    pub fn tick_interval(mut self, period: Duration) -> Self {
        self.tick_interval = Some(period);
        self
    }

    /// Apply engine configuration (health policy, interval, channel size)
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.health = config.health_policy();
        self.tick_interval = config.tick_interval();
        self.event_capacity = config.event_capacity.max(1);
        self
    }

    /// Start the battle
    ///
    /// With a tick interval the scheduler is spawned on the current Tokio
    /// runtime.
    pub fn build(self) -> Result<Battle, BattleError> {
        let registry = Registry::new(self.combatants)?;
        let runtime = match self.tick_interval {
            Some(_) => Some(tokio::runtime::Handle::try_current().map_err(|_| BattleError::NoRuntime)?),
            None => None,
        };

        let mut fanout = Fanout::new();
        for observer in self.observers {
            fanout.add(observer);
        }

        let pipeline = Pipeline {
            tick: 0,
            engine: ResolutionEngine::new(self.rules),
            applier: StateApplier::new(registry.clone(), self.health.clone()),
            fanout,
            source: self.source,
            consumed: HashSet::new(),
        };

        let (lifecycle, _) = watch::channel(Lifecycle::Running);
        let (events, _) = broadcast::channel(self.event_capacity);
        let combatants = registry.len();

        let shared = Arc::new(Shared {
            id: self.id,
            pipeline: tokio::sync::Mutex::new(pipeline),
            history: RwLock::new(Vec::new()),
            initial: registry,
            health: self.health,
            lifecycle,
            events,
            last_tick: AtomicU64::new(0),
        });

        let scheduler = match (runtime, self.tick_interval) {
            (Some(runtime), Some(period)) => scheduler::spawn(&runtime, Arc::downgrade(&shared), period),
            _ => None,
        };

        info!(
            battle = %self.id,
            combatants,
            scheduled = scheduler.is_some(),
            "Battle started"
        );

        Ok(Battle {
            shared,
            scheduler: parking_lot::Mutex::new(scheduler),
        })
    }
}

/// Handle to a running (or finished) battle
pub struct Battle {
    shared: Arc<Shared>,
    scheduler: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Battle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battle")
            .field("id", &self.shared.id)
            .field("lifecycle", &self.lifecycle())
            .field("tick", &self.current_tick())
            .finish()
    }
}

impl Battle {
    /// Start configuring a battle over the given combatants
    pub fn builder(combatants: impl IntoIterator<Item = Combatant>) -> BattleBuilder {
        BattleBuilder::new(combatants.into_iter().collect())
    }

    pub fn id(&self) -> BattleId {
        self.shared.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.shared.lifecycle.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle().is_running()
    }

    /// Number of the last tick whose logs were committed to history
    pub fn current_tick(&self) -> u64 {
        self.shared.last_tick.load(Ordering::SeqCst)
    }

    /// Run one tick now
    ///
    /// Serialised with scheduled ticks; fails with `NotRunning` once the
    /// battle is paused or cancelled.
    pub async fn tick(&self) -> Result<TickReport, BattleError> {
        self.shared.run_tick().await
    }

    /// Copy of the full log history, in order
    pub fn list_logs(&self) -> Vec<Log> {
        self.shared.history.read().clone()
    }

    pub fn log_count(&self) -> usize {
        self.shared.history.read().len()
    }

    /// Register an observer for subsequent ticks
    ///
    /// Waits for any in-flight tick to finish first.
    pub async fn add_logs_receiver(&self, observer: Arc<dyn LogsReceiver>) -> Result<(), BattleError> {
        let mut scope = self.shared.scope();
        scope.ensure_running()?;
        let mut pipeline = tokio::select! {
            biased;
            state = scope.cancelled() => return Err(BattleError::NotRunning { state }),
            guard = self.shared.pipeline.lock() => guard,
        };
        scope.ensure_running()?;
        pipeline.fanout.add(observer);
        Ok(())
    }

    /// Subscribe to tick reports and failures
    pub fn subscribe(&self) -> broadcast::Receiver<TickEvent> {
        self.shared.events.subscribe()
    }

    /// Copy of every combatant, taken between ticks
    pub async fn combatants(&self) -> Vec<Combatant> {
        self.shared.pipeline.lock().await.applier.registry().snapshot()
    }

    pub async fn combatant(&self, id: &CombatantId) -> Option<Combatant> {
        self.shared.pipeline.lock().await.applier.registry().get(id).cloned()
    }

    /// Copy of the live registry, taken between ticks
    pub async fn registry(&self) -> Registry {
        self.shared.pipeline.lock().await.applier.registry().clone()
    }

    /// The registry as it was when the battle started
    pub fn initial_registry(&self) -> &Registry {
        &self.shared.initial
    }

    /// Rebuild combatant state from the initial registry and the history
    pub fn replay(&self) -> Registry {
        let mut applier = StateApplier::new(self.shared.initial.clone(), self.shared.health.clone());
        let history = self.list_logs();
        let report = applier.apply(&history);
        if !report.faults.is_empty() {
            warn!(
                battle = %self.shared.id,
                faults = report.faults.len(),
                "Replay hit consistency faults"
            );
        }
        applier.into_registry()
    }

    /// Stop ticking; the battle can no longer advance
    pub async fn pause(&self) -> Result<(), BattleError> {
        self.shared.transition(Lifecycle::Paused)?;
        info!(battle = %self.shared.id, "Battle paused");
        self.stopped().await;
        Ok(())
    }

    /// Stop ticking and release observers and the action source
    ///
    /// History stays readable. Must not be awaited from inside an
    /// observer of this battle.
    pub async fn cancel(&self) -> Result<(), BattleError> {
        let from = self.shared.transition(Lifecycle::Cancelled)?;
        info!(battle = %self.shared.id, from = %from, "Battle cancelled");
        self.stopped().await;

        let mut pipeline = self.shared.pipeline.lock().await;
        pipeline.fanout.clear();
        pipeline.source = None;
        Ok(())
    }

    /// Wait for the scheduler task (if any) to exit
    pub async fn stopped(&self) {
        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(battle = %self.shared.id, error = %e, "Scheduler task failed");
            }
        }
    }
}

impl Drop for Battle {
    fn drop(&mut self) {
        // wakes the scheduler and any in-flight tick
        let _ = self.shared.transition(Lifecycle::Cancelled);
    }
}
