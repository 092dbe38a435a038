//! Masking, aggregation and unmasking of machine learning models.
//!
//! # Overview
//!
//! A [`Model`] (the plaintext representation of a participant's weights) is turned into a
//! [`MaskObject`] by [`Masker::mask`]: the model is clamped and scaled according to a
//! [`MaskConfig`], shifted into the non-negative integers, and one-time-padded with a mask
//! derived from a random [`MaskSeed`]. Masked models from different participants can be summed
//! modulo the configuration's order `q` via [`Aggregation::aggregate`], and the sum can finally
//! be unmasked via [`Aggregation::unmask`] once the corresponding masks have themselves been
//! summed the same way.
pub mod config;
pub mod masking;
pub mod model;
pub mod object;
pub mod scalar;
pub mod seed;

pub use self::{
    config::{BoundType, DataType, GroupType, MaskConfig, ModelType},
    masking::{Aggregation, AggregationError, Masker, MaskConfigPair, UnmaskingError},
    model::{FromPrimitives, Model, ModelCastError, model_from_f32},
    object::{InvalidMaskObjectError, MaskMany, MaskObject, MaskOne},
    scalar::Scalar,
    seed::{EncryptedMaskSeed, MaskSeed},
};
