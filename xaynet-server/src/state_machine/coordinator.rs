//! The coordinator's view of the current round: thresholds, timings and mask configuration.
//!
//! This is the one piece of state that outlives any single phase (every [`PhaseState`] carries
//! it via [`crate::state_machine::phases::Shared`]) and the one piece that gets snapshotted to
//! the state store so a restarted coordinator can resume mid-round rather than silently
//! abandoning it.
//!
//! [`PhaseState`]: crate::state_machine::phases::PhaseState

use serde::{Deserialize, Serialize};

use xaynet_core::{common::RoundSeed, crypto::ByteObject, mask::MaskConfigPair};

use crate::{settings::PetSettings, state_machine::phases::PhaseName};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// The coordinator's round-scoped state.
pub struct CoordinatorState {
    /// Seed for the current round.
    pub seed: RoundSeed,
    /// Fraction of participants selected for the sum task.
    pub sum_ratio: f64,
    /// Fraction of participants selected for the update task.
    pub update_ratio: f64,

    /// Minimum number of sum messages to accept before ending the sum phase early.
    pub min_sum_count: usize,
    /// Maximum number of sum messages accepted before the sum phase closes regardless of time.
    pub max_sum_count: usize,
    /// Minimum number of update messages required before ending the update phase early.
    pub min_update_count: usize,
    /// Maximum number of update messages accepted before the update phase closes.
    pub max_update_count: usize,
    /// Minimum number of sum2 messages required before ending the sum2 phase early.
    pub min_sum2_count: usize,
    /// Maximum number of sum2 messages accepted before the sum2 phase closes.
    pub max_sum2_count: usize,

    /// Minimum duration, in seconds, of the sum phase.
    pub min_sum_time: u64,
    /// Maximum duration, in seconds, of the sum phase.
    pub max_sum_time: u64,
    /// Minimum duration, in seconds, of the update phase.
    pub min_update_time: u64,
    /// Maximum duration, in seconds, of the update phase.
    pub max_update_time: u64,
    /// Minimum duration, in seconds, of the sum2 phase.
    pub min_sum2_time: u64,
    /// Maximum duration, in seconds, of the sum2 phase.
    pub max_sum2_time: u64,

    /// The masking configuration applied to the model vector and the scalar weight.
    pub mask_config: MaskConfigPair,
    /// The length of the model being trained.
    pub model_size: usize,

    /// The current round's id, incremented every time the [`Idle`](super::phases::Idle) phase
    /// starts a new round.
    pub round_id: u64,
    /// The name of the phase the coordinator currently is in.
    pub phase: PhaseName,
}

impl CoordinatorState {
    /// Builds the initial coordinator state from the settings loaded at startup.
    pub fn new(pet_settings: PetSettings, mask_config: MaskConfigPair, model_size: usize) -> Self {
        Self {
            seed: RoundSeed::generate(),
            sum_ratio: pet_settings.sum,
            update_ratio: pet_settings.update,
            min_sum_count: pet_settings.min_sum_count,
            max_sum_count: pet_settings.max_sum_count,
            min_update_count: pet_settings.min_update_count,
            max_update_count: pet_settings.max_update_count,
            min_sum2_count: pet_settings.min_sum2_count,
            max_sum2_count: pet_settings.max_sum2_count,
            min_sum_time: pet_settings.min_sum_time,
            max_sum_time: pet_settings.max_sum_time,
            min_update_time: pet_settings.min_update_time,
            max_update_time: pet_settings.max_update_time,
            min_sum2_time: pet_settings.min_sum2_time,
            max_sum2_time: pet_settings.max_sum2_time,
            mask_config,
            model_size,
            round_id: 0,
            phase: PhaseName::Idle,
        }
    }
}
