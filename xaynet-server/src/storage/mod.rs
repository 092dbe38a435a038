//! The coordinator's state store.
//!
//! `xaynet-server` keeps the authoritative, mutable round state (the `SumDict`, the running
//! `Aggregation`s, the sum2 mask tally) as plain Rust fields on each phase's [`PhaseState`],
//! updated in place by the single task that drives the state machine; that task is the only
//! writer, so those mutations are trivially linearized without needing a distributed lock. Redis
//! is used for the two things an in-process struct can't give you for free: surviving a process
//! restart (the [`CoordinatorState`] snapshot below) and the durable, replayable record of each
//! atomic admission decision. See `DESIGN.md` for the full reasoning behind this split.
//!
//! [`PhaseState`]: crate::state_machine::phases::PhaseState
//! [`CoordinatorState`]: crate::state_machine::coordinator::CoordinatorState

pub mod redis;

use thiserror::Error;

/// Errors a [`redis::RedisStore`] operation can fail with.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("a Redis connection or command error occurred: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("the coordinator state snapshot could not be (de)serialized: {0}")]
    Serialization(#[from] Box<bincode::ErrorKind>),
}
