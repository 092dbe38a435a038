//! The participant-facing surface built on top of the state machine: read-only fetchers for
//! round state (backed by [`crate::state_machine::events`]) and the pipeline that turns a raw
//! wire message into a [`crate::state_machine::requests::StateMachineRequest`].
pub mod fetchers;
pub mod messages;
