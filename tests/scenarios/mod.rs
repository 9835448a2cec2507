//! Battle scenarios
//!
//! - Combat: end-to-end resolution, ordering, partial failure, incapacitation
//! - Determinism: identical batches produce identical logs
//! - Replay: history rebuilds the live registry
//! - Lifecycle: pause, cancel, scheduler, observer failures

pub mod determinism;
pub mod lifecycle;
