//! A minimal reference implementation of a PET protocol participant.
//!
//! This crate is not a product surface: the coordinator (`xaynet-server`) is the deliverable of
//! this workspace. `xaynet-client` exists because the coordinator's own integration tests drive
//! full rounds end-to-end through a real participant implementation rather than hand-rolled
//! fixtures, and because the in-memory [`api::in_memory::InMemoryApiClient`] wires the two crates
//! together without a network hop.
pub mod api;
pub mod participant;

pub use self::{
    api::ApiClient,
    participant::{Participant, Task},
};
