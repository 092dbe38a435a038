//! Core types, cryptography and wire codec shared by the coordinator (`xaynet-server`) and its
//! participants (`xaynet-client`).
//!
//! This crate has no I/O of its own: it is the part of the PET protocol that both sides of the
//! wire need to agree on bit-for-bit — the [`crypto`] primitives, the [`mask`] arithmetic and
//! model bijection, the [`message`] codec, and the round-table types in [`common`].
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod crypto;
pub mod mask;
pub mod message;

pub use self::{
    common::{
        LocalSeedDict,
        RoundParameters,
        RoundSeed,
        SeedDict,
        SumDict,
        SumParticipantEphemeralPublicKey,
        SumParticipantPublicKey,
        UpdateParticipantPublicKey,
        UpdateSeedDict,
    },
    crypto::ParticipantTaskSignature,
};
