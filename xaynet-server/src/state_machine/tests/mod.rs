//! Test-only fixtures shared by every phase's `#[cfg(test)]` module: a [`builder::StateMachineBuilder`]
//! that drops a [`crate::state_machine::StateMachine`] into an arbitrary phase without driving it
//! there, and a grab-bag of [`utils`] helpers for generating eligible participants and picking
//! fields back out of the [`xaynet_core::message::Message`]s they compose.

pub mod builder;
pub mod utils;
