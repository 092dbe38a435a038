//! A reference implementation of a PET protocol participant's own local state machine.
//!
//! The wire-visible half of a participant is just: fetch round info, submit a message if
//! eligible, poll again. This module implements the other half so that `xaynet-server`'s own
//! integration tests (and any demo binary) can drive a full round without hand-crafting wire
//! bytes: `Awaiting -> {Sum, Update} -> Sum2 -> Done`.

use std::collections::HashMap;

use xaynet_core::{
    common::{LocalSeedDict, RoundParameters, RoundSeed, SeedDict, SumDict, UpdateSeedDict},
    crypto::{ByteObject, EncryptKeyPair, ParticipantTaskSignature, SigningKeyPair},
    mask::{Aggregation, MaskConfigPair, MaskObject, Masker, Model, Scalar},
    message::{Header, Message, Payload, Sum, Sum2, Tag, Update},
    SumParticipantPublicKey,
};

/// The PET task a participant has been selected for in a given round, decided once per round
/// from its signing key and the round seed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Task {
    /// Not selected for either role this round.
    None,
    /// Selected to publish an ephemeral key and later reconstruct the mask.
    Sum,
    /// Selected to submit a masked model and mask seed shares.
    Update,
}

/// A participant's own local state, mirroring the `Awaiting -> Sum/Update -> Sum2 -> Done`
/// round lifecycle.
pub struct Participant {
    /// The long-lived signing key pair identifying this participant across rounds.
    pub keys: SigningKeyPair,
    /// The per-round ephemeral encryption key pair, generated only if selected as sum.
    ephm_keys: Option<EncryptKeyPair>,
    /// This round's task, once determined.
    task: Task,
    /// The mask seed this participant used to mask its own contribution (update task only),
    /// kept around so it never needs to be regenerated or communicated twice.
    mask_seed: Option<xaynet_core::mask::MaskSeed>,
}

impl Default for Participant {
    fn default() -> Self {
        Self::new()
    }
}

impl Participant {
    /// Creates a new participant with a freshly generated signing key pair.
    pub fn new() -> Self {
        Self {
            keys: SigningKeyPair::generate(),
            ephm_keys: None,
            task: Task::None,
            mask_seed: None,
        }
    }

    /// Determines this round's task from the round parameters: a participant is checked for
    /// sum-eligibility first, and only checked for update-eligibility if it isn't sum-eligible.
    pub fn determine_task(&mut self, params: &RoundParameters) -> Task {
        let sum_signature = self.sum_signature(&params.seed);
        self.task = if sum_signature.is_eligible(params.sum) {
            Task::Sum
        } else if self.update_signature(&params.seed).is_eligible(params.update) {
            Task::Update
        } else {
            Task::None
        };
        self.task
    }

    /// The current task, as last determined by [`Participant::determine_task`].
    pub fn task(&self) -> Task {
        self.task
    }

    fn sum_signature(&self, seed: &RoundSeed) -> ParticipantTaskSignature {
        self.keys
            .secret
            .sign_detached(&[seed.as_slice(), b"sum"].concat())
    }

    fn update_signature(&self, seed: &RoundSeed) -> ParticipantTaskSignature {
        self.keys
            .secret
            .sign_detached(&[seed.as_slice(), b"update"].concat())
    }

    /// Composes this round's sum message: generates a fresh ephemeral encryption key pair and
    /// publishes it so update participants can send this participant mask seed shares.
    pub fn compose_sum_message(&mut self, params: &RoundParameters) -> Message {
        let ephm_keys = EncryptKeyPair::generate();
        let sum_signature = self.sum_signature(&params.seed);
        self.ephm_keys = Some(ephm_keys.clone());
        Message {
            header: Header {
                participant_pk: self.keys.public,
                tag: Tag::Sum,
            },
            payload: Payload::Sum(Sum {
                sum_signature,
                ephm_pk: ephm_keys.public,
            }),
        }
    }

    /// Composes this round's update message: masks `model` and `scalar` under `mask_config`,
    /// and encrypts a share of the mask seed for every sum participant in `sum_dict`.
    pub fn compose_update_message(
        &mut self,
        params: &RoundParameters,
        sum_dict: &SumDict,
        mask_config: MaskConfigPair,
        scalar: f64,
        model: Model,
    ) -> Message {
        let seed = xaynet_core::mask::MaskSeed::generate();
        let (_, masked_model) = Masker::with_seed(mask_config, seed).mask(Scalar::new(scalar), &model);

        let scalar_as_model: Model = std::iter::once(num::rational::Ratio::from_integer(
            num::bigint::BigInt::from(1),
        ))
        .collect();
        let (_, masked_scalar) =
            Masker::with_seed(mask_config, seed).mask(Scalar::new(scalar), &scalar_as_model);

        self.mask_seed = Some(seed);

        let mut local_seed_dict: LocalSeedDict = HashMap::with_capacity(sum_dict.len());
        for (sum_pk, sum_ephm_pk) in sum_dict {
            local_seed_dict.insert(*sum_pk, seed.encrypt(sum_ephm_pk));
        }

        Message {
            header: Header {
                participant_pk: self.keys.public,
                tag: Tag::Update,
            },
            payload: Payload::Update(Update {
                sum_signature: self.sum_signature(&params.seed),
                update_signature: self.update_signature(&params.seed),
                masked_model,
                masked_scalar,
                local_seed_dict,
            }),
        }
    }

    /// Composes this round's sum2 message: decrypts every mask seed share addressed to this
    /// participant, expands and sums them into this participant's share of the unmask mask, and
    /// publishes it.
    pub fn compose_sum2_message(
        &self,
        params: &RoundParameters,
        seeds: &UpdateSeedDict,
        mask_config: MaskConfigPair,
        model_length: usize,
    ) -> Message {
        let ephm_keys = self
            .ephm_keys
            .as_ref()
            .expect("compose_sum2_message called before compose_sum_message");

        let mut aggregation = Aggregation::new(mask_config, model_length);
        for ciphertext in seeds.values() {
            let seed = ciphertext
                .decrypt(&ephm_keys.public, &ephm_keys.secret)
                .expect("failed to decrypt a mask seed share addressed to this participant");
            let zero_model: Model = std::iter::repeat(num::rational::Ratio::from_integer(
                num::bigint::BigInt::from(0),
            ))
            .take(model_length)
            .collect();
            let (_, mask) = Masker::with_seed(mask_config, seed).mask(Scalar::new(0.), &zero_model);
            if aggregation.nb_models() == 0 {
                aggregation = Aggregation::from(mask);
            } else {
                aggregation.aggregate(mask);
            }
        }
        let model_mask: MaskObject = aggregation.into();

        Message {
            header: Header {
                participant_pk: self.keys.public,
                tag: Tag::Sum2,
            },
            payload: Payload::Sum2(Sum2 {
                sum_signature: self.sum_signature(&params.seed),
                model_mask,
            }),
        }
    }
}

/// Re-exported for convenience so callers of [`Participant`] need not also depend on
/// `xaynet_core` directly just to name the long-lived identity type.
pub type ParticipantPublicKey = SumParticipantPublicKey;
