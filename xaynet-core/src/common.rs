//! Shared data-model types for the PET protocol: participant keys, the round tables, the round
//! seed and the round parameters handed out by the info endpoint.
//!
//! See the [crate] documentation since this is a private module anyways.

use std::collections::HashMap;

use derive_more::{AsMut, AsRef, From};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{ByteObject, PublicEncryptKey, PublicSigningKey},
    mask::{EncryptedMaskSeed, MaskConfig},
};

/// A sum participant's long-lived signing public key.
pub type SumParticipantPublicKey = PublicSigningKey;

/// An update participant's long-lived signing public key.
pub type UpdateParticipantPublicKey = PublicSigningKey;

/// A sum participant's per-round ephemeral encryption public key.
pub type SumParticipantEphemeralPublicKey = PublicEncryptKey;

/// The dictionary of sum participants admitted for the current round, mapping each sum
/// participant's signing key to the ephemeral encryption key it published.
///
/// Published to update participants once the sum phase closes.
pub type SumDict = HashMap<SumParticipantPublicKey, SumParticipantEphemeralPublicKey>;

/// One sum participant's view of the seed dictionary: the encrypted mask seeds contributed by
/// every update participant, keyed by the update participant's signing key.
pub type UpdateSeedDict = HashMap<UpdateParticipantPublicKey, EncryptedMaskSeed>;

/// The global seed dictionary, mapping each sum participant to its [`UpdateSeedDict`].
///
/// Published to sum participants once the update phase closes.
pub type SeedDict = HashMap<SumParticipantPublicKey, UpdateSeedDict>;

/// The per-update-participant fragment of the seed dictionary that is submitted alongside an
/// update message: one encrypted mask seed per sum participant captured at the start of the
/// update phase.
pub type LocalSeedDict = HashMap<SumParticipantPublicKey, EncryptedMaskSeed>;

/// Length in bytes of a [`RoundSeed`].
pub const ROUND_SEED_LEN: usize = 32;

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Hash, Eq, PartialEq, Copy, Clone, Debug)]
/// A random, uniformly distributed seed published by the coordinator for a round.
///
/// Combined with the per-phase thresholds, this is what every participant's selection
/// signature is computed over (see [`crate::crypto::ParticipantTaskSignature::is_eligible`]).
pub struct RoundSeed([u8; ROUND_SEED_LEN]);

impl ByteObject for RoundSeed {
    const LENGTH: usize = ROUND_SEED_LEN;

    fn zeroed() -> Self {
        Self([0_u8; ROUND_SEED_LEN])
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ROUND_SEED_LEN {
            return None;
        }
        let mut array = [0_u8; ROUND_SEED_LEN];
        array.copy_from_slice(bytes);
        Some(Self(array))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// The round information a participant needs to decide whether it is eligible for a task and,
/// if so, how to build the corresponding message.
///
/// This is the payload of the round information endpoint participants poll at the start of a
/// round.
pub struct RoundParameters {
    /// The round seed.
    pub seed: RoundSeed,
    /// The sum selection probability, `t_sum`.
    pub sum: f64,
    /// The update selection probability, `t_update`.
    pub update: f64,
    /// The masking configuration, `M`.
    pub mask_config: MaskConfig,
    /// The model length, `L`.
    pub model_length: usize,
}
