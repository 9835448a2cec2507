//! Log fan-out
//!
//! Delivers each tick's new logs to the registered observers, one at a
//! time, in registration order. The first failure stops delivery.

mod jsonl;

pub use jsonl::JsonLinesRecorder;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{trace, warn};

use crate::battle::BattleId;
use crate::log::Log;

/// Anything that reacts to a battle's logs
#[async_trait]
pub trait LogsReceiver: Send + Sync {
    /// Label used in diagnostics
    fn name(&self) -> &str {
        "observer"
    }

    /// Receive one tick's logs, in order
    async fn receive_logs(&self, battle: BattleId, logs: &[Log]) -> anyhow::Result<()>;
}

/// An observer failed to take delivery
#[derive(Debug, Error)]
#[error("observer '{name}' (#{index}) failed: {source}")]
pub struct FanoutError {
    /// Registration index of the failing observer
    pub index: usize,
    pub name: String,
    #[source]
    pub source: anyhow::Error,
}

/// Ordered set of observers
#[derive(Default, Clone)]
pub struct Fanout {
    receivers: Vec<Arc<dyn LogsReceiver>>,
}

impl fmt::Debug for Fanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fanout")
            .field("receivers", &self.names())
            .finish()
    }
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer to the delivery order
    pub fn add(&mut self, receiver: Arc<dyn LogsReceiver>) {
        self.receivers.push(receiver);
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Drop every observer
    pub fn clear(&mut self) {
        self.receivers.clear();
    }

    pub fn names(&self) -> Vec<String> {
        self.receivers.iter().map(|r| r.name().to_string()).collect()
    }

    /// Deliver logs to every observer in order
    ///
    /// Empty batches are not delivered.
    pub async fn broadcast(&self, battle: BattleId, logs: &[Log]) -> Result<(), FanoutError> {
        if logs.is_empty() {
            return Ok(());
        }

        for (index, receiver) in self.receivers.iter().enumerate() {
            trace!(
                observer = receiver.name(),
                logs = logs.len(),
                "Delivering logs"
            );
            if let Err(source) = receiver.receive_logs(battle, logs).await {
                warn!(
                    observer = receiver.name(),
                    index,
                    error = %source,
                    "Observer failed, stopping broadcast"
                );
                return Err(FanoutError {
                    index,
                    name: receiver.name().to_string(),
                    source,
                });
            }
        }
        Ok(())
    }
}
