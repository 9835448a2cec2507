//! Integration test harness
//!
//! - `Arena` - named roster plus an action queue, builds battles
//! - `RecordingObserver` - keeps every delivered batch
//! - `FailingObserver` - always refuses delivery
//! - `BlockingObserver` - never returns until its future is dropped

mod arena;
mod observers;

pub use arena::{id, Arena};
pub use observers::{BlockingObserver, FailingObserver, RecordingObserver};
