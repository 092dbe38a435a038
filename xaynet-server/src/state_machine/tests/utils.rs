use xaynet_client::participant::{Participant, Task};
use xaynet_core::{
    common::RoundParameters,
    mask::{BoundType, DataType, GroupType, ModelType},
    message::{Message, Payload},
    LocalSeedDict,
    RoundSeed,
    SumParticipantEphemeralPublicKey,
};

use crate::settings::MaskSettings;

pub fn enable_logging() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// A small masking configuration, cheap enough to run the fixed-point bijection on in every
/// test.
pub fn mask_settings() -> MaskSettings {
    MaskSettings {
        group_type: GroupType::Prime,
        data_type: DataType::F32,
        bound_type: BoundType::B0,
        model_type: ModelType::M3,
    }
}

/// Builds the [`RoundParameters`] a test's participants determine their task from.
pub fn round_params(seed: RoundSeed, sum: f64, update: f64, model_length: usize) -> RoundParameters {
    RoundParameters {
        seed,
        sum,
        update,
        mask_config: mask_settings().into(),
        model_length,
    }
}

/// Generates participants until one happens to be sum-eligible for `params`.
pub fn generate_summer(params: &RoundParameters) -> Participant {
    loop {
        let mut participant = Participant::new();
        if let Task::Sum = participant.determine_task(params) {
            return participant;
        }
    }
}

/// Generates participants until one happens to be update-eligible for `params`.
pub fn generate_updater(params: &RoundParameters) -> Participant {
    loop {
        let mut participant = Participant::new();
        if let Task::Update = participant.determine_task(params) {
            return participant;
        }
    }
}

/// Pulls the ephemeral public key out of a composed sum message.
pub fn ephm_pk(msg: &Message) -> SumParticipantEphemeralPublicKey {
    match &msg.payload {
        Payload::Sum(sum) => sum.ephm_pk,
        _ => panic!("not a sum message"),
    }
}

/// Pulls the masked model out of a composed update message.
pub fn masked_model(msg: &Message) -> xaynet_core::mask::MaskObject {
    match &msg.payload {
        Payload::Update(update) => update.masked_model.clone(),
        _ => panic!("not an update message"),
    }
}

/// Pulls the masked scalar out of a composed update message.
pub fn masked_scalar(msg: &Message) -> xaynet_core::mask::MaskObject {
    match &msg.payload {
        Payload::Update(update) => update.masked_scalar.clone(),
        _ => panic!("not an update message"),
    }
}

/// Pulls the local seed dictionary out of a composed update message.
pub fn local_seed_dict(msg: &Message) -> LocalSeedDict {
    match &msg.payload {
        Payload::Update(update) => update.local_seed_dict.clone(),
        _ => panic!("not an update message"),
    }
}
