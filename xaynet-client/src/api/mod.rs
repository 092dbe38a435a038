//! Transports a [`crate::Participant`] can use to talk to the coordinator.
///
/// Gated behind `cfg(test)` because it pulls in `xaynet-server`, which this crate depends on only
/// as a dev-dependency for its own integration tests.
#[cfg(test)]
pub mod in_memory;

use async_trait::async_trait;

use xaynet_core::{common::RoundParameters, mask::Model, SumDict, SumParticipantPublicKey, UpdateSeedDict};

/// An API a [`crate::Participant`] can drive to fetch round state and submit messages.
///
/// This is the participant-side fetch/submit surface: fetching `(round, phase,
/// seed, model_length, mask_config, thresholds)`, fetching the tables a sum participant needs
/// to reconstruct the mask, and submitting a framed, signed message.
#[async_trait]
pub trait ApiClient {
    /// The error type returned by this client's operations.
    type Error: std::error::Error + 'static;

    /// Fetches the current round parameters from the info endpoint.
    async fn get_round_params(&mut self) -> Result<RoundParameters, Self::Error>;

    /// Fetches the current round's `SumDict`, if the sum phase has published one yet.
    async fn get_sums(&mut self) -> Result<Option<SumDict>, Self::Error>;

    /// Fetches this sum participant's slice of the `SeedDict`.
    async fn get_seeds(
        &mut self,
        pk: SumParticipantPublicKey,
    ) -> Result<Option<UpdateSeedDict>, Self::Error>;

    /// Fetches the aggregated model's length, once the update phase has published it.
    async fn get_mask_length(&mut self) -> Result<Option<u64>, Self::Error>;

    /// Fetches the most recently committed global model, if any.
    async fn get_model(&mut self) -> Result<Option<Model>, Self::Error>;

    /// Submits a signed, framed message to the coordinator.
    async fn send_message(&mut self, message: Vec<u8>) -> Result<(), Self::Error>;
}
