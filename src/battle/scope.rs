//! Cancellation scope
//!
//! Every suspension point of a tick races against this scope. Pausing or
//! cancelling the battle flips the lifecycle watch channel, which wakes
//! all scopes at once.

use tokio::sync::watch;

use super::{BattleError, Lifecycle};

pub(crate) struct CancelScope {
    rx: watch::Receiver<Lifecycle>,
}

impl CancelScope {
    pub(crate) fn new(rx: watch::Receiver<Lifecycle>) -> Self {
        Self { rx }
    }

    pub(crate) fn state(&self) -> Lifecycle {
        *self.rx.borrow()
    }

    pub(crate) fn ensure_running(&self) -> Result<(), BattleError> {
        match self.state() {
            Lifecycle::Running => Ok(()),
            state => Err(BattleError::NotRunning { state }),
        }
    }

    /// Resolves once the battle leaves `Running`
    pub(crate) async fn cancelled(&mut self) -> Lifecycle {
        self.rx
            .wait_for(|state| !state.is_running())
            .await
            .map(|state| *state)
            // sender gone means the battle itself is gone
            .unwrap_or(Lifecycle::Cancelled)
    }
}
