//! JSON-lines log recorder
//!
//! Writes every received log as one JSON object per line to any
//! `Write` sink (file, stdout, pipe). Each line carries the battle ID
//! and the time the record was written.

use std::io::Write;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::LogsReceiver;
use crate::battle::BattleId;
use crate::log::Log;

#[derive(Serialize)]
struct Record<'a> {
    battle: BattleId,
    received_at: DateTime<Utc>,
    log: &'a Log,
}

/// Observer that appends logs to a writer as JSON lines
pub struct JsonLinesRecorder {
    name: String,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesRecorder {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self::named("jsonl", sink)
    }

    pub fn named(name: impl Into<String>, sink: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Recorder writing to stdout
    pub fn stdout() -> Self {
        Self::named("stdout", std::io::stdout())
    }
}

#[async_trait]
impl LogsReceiver for JsonLinesRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn receive_logs(&self, battle: BattleId, logs: &[Log]) -> anyhow::Result<()> {
        let received_at = Utc::now();
        let mut sink = self.sink.lock();
        for log in logs {
            let record = Record {
                battle,
                received_at,
                log,
            };
            serde_json::to_writer(&mut *sink, &record)?;
            sink.write_all(b"\n")?;
        }
        sink.flush()?;
        Ok(())
    }
}
