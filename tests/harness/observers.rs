//! Test observers

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use skirmish::{BattleId, Log, LogsReceiver};
use tokio::sync::Notify;

/// Keeps every batch it receives
#[derive(Default)]
pub struct RecordingObserver {
    batches: Mutex<Vec<Vec<Log>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<Log>> {
        self.batches.lock().clone()
    }

    /// All received logs, flattened
    pub fn logs(&self) -> Vec<Log> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl LogsReceiver for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }

    async fn receive_logs(&self, _battle: BattleId, logs: &[Log]) -> anyhow::Result<()> {
        self.batches.lock().push(logs.to_vec());
        Ok(())
    }
}

/// Refuses every delivery
pub struct FailingObserver;

#[async_trait]
impl LogsReceiver for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    async fn receive_logs(&self, _battle: BattleId, _logs: &[Log]) -> anyhow::Result<()> {
        anyhow::bail!("observer unavailable")
    }
}

/// Hangs on delivery until the caller gives up
#[derive(Default)]
pub struct BlockingObserver {
    entered: Notify,
}

impl BlockingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until a delivery is in progress
    pub async fn entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl LogsReceiver for BlockingObserver {
    fn name(&self) -> &str {
        "blocking"
    }

    async fn receive_logs(&self, _battle: BattleId, _logs: &[Log]) -> anyhow::Result<()> {
        self.entered.notify_one();
        std::future::pending::<()>().await;
        Ok(())
    }
}
