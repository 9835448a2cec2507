//! skirmish - turn-based combat resolution engine
//!
//! Combatants submit actions; on every tick the engine resolves the
//! batch into ordered logs, appends them to the battle history, applies
//! them to combatant state and fans them out to observers.

pub mod action;
pub mod apply;
pub mod battle;
pub mod combatant;
pub mod config;
pub mod fanout;
pub mod log;
pub mod resolve;
pub mod rules;
pub mod scenario;
pub mod value;

pub use action::{Action, ActionId, ActionQueue, ActionSource, ScriptedActions};
pub use apply::{ApplyReport, ConsistencyFault, HealthPolicy, RegistryProjection, StateApplier};
pub use battle::{Battle, BattleBuilder, BattleError, BattleId, Lifecycle, TickEvent, TickReport};
pub use combatant::{Combatant, CombatantId, CombatantState, Registry};
pub use config::EngineConfig;
pub use fanout::{JsonLinesRecorder, LogsReceiver};
pub use log::{Effect, EffectKind, Log, LogId};
pub use resolve::{RejectReason, Rejection, ResolutionEngine};
pub use rules::{RuleBook, RuleError, RulePolicy};
pub use scenario::Scenario;
pub use value::{Attributes, Value};
