//! Masking, aggregation and unmasking of models.
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: ../index.html

use std::iter::{self, Iterator};

use num::{
    bigint::{BigInt, ToBigInt},
    clamp,
    rational::Ratio,
    traits::clamp_max,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    crypto::prng::generate_integer,
    mask::{
        config::MaskConfig,
        model::Model,
        object::{MaskMany, MaskObject, MaskOne},
        scalar::Scalar,
        seed::MaskSeed,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// The pair of masking configurations applied to a model's weights and to its scalar weight
/// respectively.
pub struct MaskConfigPair {
    /// The configuration for the model vector.
    pub vector: MaskConfig,
    /// The configuration for the scalar weight.
    pub scalar: MaskConfig,
}

impl From<MaskConfig> for MaskConfigPair {
    /// Builds a pair that applies the same configuration to both the vector and the scalar.
    fn from(config: MaskConfig) -> Self {
        Self {
            vector: config,
            scalar: config,
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors related to the unmasking of models.
pub enum UnmaskingError {
    #[error("there is no model to unmask")]
    NoModel,
    #[error("too many models were aggregated for the current unmasking configuration")]
    TooManyModels,
    #[error("too many scalars were aggregated for the current unmasking configuration")]
    TooManyScalars,
    #[error("the masked model is incompatible with the mask used for unmasking")]
    MaskManyMismatch,
    #[error("the masked scalar is incompatible with the mask used for unmasking")]
    MaskOneMismatch,
    #[error("the mask is invalid")]
    InvalidMask,
}

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors related to the aggregation of masks and models.
pub enum AggregationError {
    #[error("the object to aggregate is invalid")]
    InvalidObject,
    #[error("too many models were aggregated for the current unmasking configuration")]
    TooManyModels,
    #[error("too many scalars were aggregated for the current unmasking configuration")]
    TooManyScalars,
    #[error("the model to aggregate is incompatible with the current aggregate")]
    ModelMismatch,
    #[error("the scalar to aggregate is incompatible with the current aggregate")]
    ScalarMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// An aggregator for masks and masked models.
///
/// This is the running `AggMasked`/`TotalScalar` accumulator the coordinator maintains over
/// the course of the update phase: every accepted update's masked model and masked scalar are
/// folded into it via [`Aggregation::aggregate`], and the sum2 phase's mask is finally applied
/// to it via [`Aggregation::unmask`] to recover the aggregated plaintext model.
pub struct Aggregation {
    nb_models: usize,
    object: MaskObject,
    object_size: usize,
}

impl From<MaskObject> for Aggregation {
    fn from(object: MaskObject) -> Self {
        Self {
            nb_models: 1,
            object_size: object.vector.data.len(),
            object,
        }
    }
}

impl From<Aggregation> for MaskObject {
    fn from(aggr: Aggregation) -> Self {
        aggr.object
    }
}

#[allow(clippy::len_without_is_empty)]
impl Aggregation {
    /// Creates a new, empty aggregator for masks or masked models.
    pub fn new(config: MaskConfigPair, object_size: usize) -> Self {
        Self {
            nb_models: 0,
            object: MaskObject::empty(config.vector, config.scalar, object_size),
            object_size,
        }
    }

    /// Gets the length of the aggregated mask object.
    pub fn len(&self) -> usize {
        self.object_size
    }

    /// Gets the number of masked models folded into this aggregate so far.
    pub fn nb_models(&self) -> usize {
        self.nb_models
    }

    /// Gets the masking configurations of the aggregator.
    pub fn config(&self) -> MaskConfigPair {
        MaskConfigPair {
            vector: self.object.vector.config,
            scalar: self.object.scalar.config,
        }
    }

    /// Validates if unmasking of the aggregated masked model with the given `mask` may be
    /// safely performed.
    ///
    /// This should be checked before calling [`unmask()`](Aggregation::unmask), since unmasking
    /// may return garbage values otherwise.
    pub fn validate_unmasking(&self, mask: &MaskObject) -> Result<(), UnmaskingError> {
        if self.nb_models == 0 {
            return Err(UnmaskingError::NoModel);
        }
        if self.nb_models > self.object.vector.config.model_type.max_nb_models() {
            return Err(UnmaskingError::TooManyModels);
        }
        if self.nb_models > self.object.scalar.config.model_type.max_nb_models() {
            return Err(UnmaskingError::TooManyScalars);
        }
        if self.object.vector.config != mask.vector.config
            || self.object_size != mask.vector.data.len()
        {
            return Err(UnmaskingError::MaskManyMismatch);
        }
        if self.object.scalar.config != mask.scalar.config {
            return Err(UnmaskingError::MaskOneMismatch);
        }
        if !mask.is_valid() {
            return Err(UnmaskingError::InvalidMask);
        }
        Ok(())
    }

    /// Unmasks the aggregated masked model with the given `mask`.
    ///
    /// It should be checked that [`validate_unmasking()`](Aggregation::validate_unmasking)
    /// succeeds before calling this, since unmasking may return garbage values otherwise. The
    /// scalar mask is unmasked the same way the model mask is, and the recovered scalar sum is
    /// used to divide out the aggregate's total weight, so the coordinator never needs to see
    /// any individual participant's weight in the clear.
    ///
    /// # Panics
    /// This may only panic if [`validate_unmasking()`](Aggregation::validate_unmasking) fails.
    pub fn unmask(self, mask_obj: MaskObject) -> Model {
        let MaskObject { vector, scalar } = self.object;
        let (masked_n, config_n) = (vector.data, vector.config);
        let (masked_1, config_1) = (scalar.data, scalar.config);
        let mask_n = mask_obj.vector.data;
        let mask_1 = mask_obj.scalar.data;

        let scaled_add_shift_1 = config_1.add_shift() * BigInt::from(self.nb_models);
        let exp_shift_1 = config_1.exp_shift();
        let order_1 = config_1.order();
        let n = (masked_1 + &order_1 - mask_1) % &order_1;
        let ratio = Ratio::<BigInt>::from(n.to_bigint().unwrap());
        let scalar_sum = ratio / &exp_shift_1 - &scaled_add_shift_1;

        let scaled_add_shift_n = config_n.add_shift() * BigInt::from(self.nb_models);
        let exp_shift_n = config_n.exp_shift();
        let order_n = config_n.order();
        masked_n
            .into_iter()
            .zip(mask_n)
            .map(|(masked, mask)| {
                // PANIC_SAFE: this subtraction only underflows if `mask > order_n`, which
                // `validate_unmasking` rules out for a valid mask.
                let n = (masked + &order_n - mask) % &order_n;
                let ratio = Ratio::<BigInt>::from(n.to_bigint().unwrap());
                let unmasked = ratio / &exp_shift_n - &scaled_add_shift_n;
                unmasked / &scalar_sum
            })
            .collect()
    }

    /// Validates if aggregation of the aggregated mask object with the given `object` may be
    /// safely performed.
    pub fn validate_aggregation(&self, object: &MaskObject) -> Result<(), AggregationError> {
        if self.nb_models > 0 {
            if self.object.vector.config != object.vector.config {
                return Err(AggregationError::ModelMismatch);
            }
            if self.object.scalar.config != object.scalar.config {
                return Err(AggregationError::ScalarMismatch);
            }
            if self.object_size != object.vector.data.len() {
                return Err(AggregationError::ModelMismatch);
            }
        }
        if self.nb_models >= object.vector.config.model_type.max_nb_models() {
            return Err(AggregationError::TooManyModels);
        }
        if self.nb_models >= object.scalar.config.model_type.max_nb_models() {
            return Err(AggregationError::TooManyScalars);
        }
        if !object.is_valid() {
            return Err(AggregationError::InvalidObject);
        }
        Ok(())
    }

    /// Aggregates the aggregated mask object with the given `object`.
    ///
    /// It should be checked that [`validate_aggregation()`](Aggregation::validate_aggregation)
    /// succeeds before calling this, since aggregation may return garbage values otherwise.
    pub fn aggregate(&mut self, object: MaskObject) {
        if self.nb_models == 0 {
            self.object = object;
            self.nb_models = 1;
            return;
        }

        let order_n = self.object.vector.config.order();
        for (i, j) in self
            .object
            .vector
            .data
            .iter_mut()
            .zip(object.vector.data.into_iter())
        {
            *i = (&*i + j) % &order_n;
        }

        let order_1 = self.object.scalar.config.order();
        let a = &mut self.object.scalar.data;
        let b = object.scalar.data;
        *a = (&*a + b) % &order_1;

        self.nb_models += 1;
    }
}

/// A masker for models.
///
/// Given a scalar weight and a model, [`Masker::mask`] produces a fresh [`MaskSeed`] together
/// with the masked model and masked scalar. The seed is what later gets distributed (encrypted)
/// to sum participants so that the mask itself can be reconstructed for the unmask phase.
pub struct Masker {
    config: MaskConfigPair,
    seed: MaskSeed,
}

impl Masker {
    /// Creates a new masker with the given masking `config`uration and a randomly generated
    /// seed.
    pub fn new(config: MaskConfigPair) -> Self {
        Self {
            config,
            seed: MaskSeed::generate(),
        }
    }

    /// Creates a new masker with the given masking `config`uration and `seed`.
    pub fn with_seed(config: MaskConfigPair, seed: MaskSeed) -> Self {
        Self { config, seed }
    }

    /// Masks the given `model` wrt the masking configuration. Enforces bounds on the scalar and
    /// weights.
    ///
    /// The masking proceeds in the following steps:
    /// - Clamp the scalar and the weights according to the masking configuration.
    /// - Scale the weights by the scalar.
    /// - Shift the weights into the non-negative reals.
    /// - Shift the weights into the non-negative integers.
    /// - Shift the weights into the finite group.
    /// - Mask the weights with random elements from the finite group.
    ///
    /// The `scalar` is masked following the same process, so that it travels to the coordinator
    /// exactly as opaquely as the model does; unmasking (in [`Aggregation::unmask`]) reverses
    /// this in the opposite order.
    pub fn mask(self, scalar: Scalar, model: &Model) -> (MaskSeed, MaskObject) {
        let (random_int, mut random_ints) = self.random_ints();
        let Self { config, seed } = self;
        let MaskConfigPair {
            vector: config_n,
            scalar: config_1,
        } = config;

        let add_shift_1 = config_1.add_shift();
        let scalar_ratio: Ratio<BigInt> = scalar.into();
        let scalar_clamped = clamp_max(&scalar_ratio, &add_shift_1);

        let exp_shift_n = config_n.exp_shift();
        let add_shift_n = config_n.add_shift();
        let order_n = config_n.order();
        let higher_bound = &add_shift_n;
        let lower_bound = -&add_shift_n;

        let masked_weights = model
            .iter()
            .zip(&mut random_ints)
            .map(|(weight, rand_int)| {
                let scaled = &scalar_clamped * weight;
                let scaled_clamped = clamp(&scaled, &lower_bound, higher_bound);
                // PANIC_SAFE: the shifted weight is guaranteed to be non-negative.
                let shifted = ((scaled_clamped + &add_shift_n) * &exp_shift_n)
                    .to_integer()
                    .to_biguint()
                    .unwrap();
                (shifted + rand_int) % &order_n
            })
            .collect();
        let masked_model = MaskMany::new(config_n, masked_weights);

        // PANIC_SAFE: the shifted scalar is guaranteed to be non-negative.
        let shifted = ((scalar_clamped + &add_shift_1) * config_1.exp_shift())
            .to_integer()
            .to_biguint()
            .unwrap();
        let masked = (shifted + random_int) % config_1.order();
        let masked_scalar = MaskOne::new(config_1, masked);

        (seed, MaskObject::new(masked_model, masked_scalar))
    }

    /// Randomly generates integers wrt the masking configurations.
    ///
    /// The first is generated wrt the scalar configuration, while the rest are wrt the vector
    /// configuration and returned as an iterator.
    fn random_ints(&self) -> (num::BigUint, impl Iterator<Item = num::BigUint>) {
        let order_n = self.config.vector.order();
        let order_1 = self.config.scalar.order();
        let mut prng = self.seed.into_rng();
        let int = generate_integer(&mut prng, &order_1);
        let ints = iter::from_fn(move || Some(generate_integer(&mut prng, &order_n)));
        (int, ints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{
        config::{BoundType, DataType, GroupType, ModelType},
        model::model_from_f32,
    };

    fn pair() -> MaskConfigPair {
        let config = MaskConfig {
            group_type: GroupType::Prime,
            data_type: DataType::F32,
            bound_type: BoundType::B0,
            model_type: ModelType::M3,
        };
        MaskConfigPair {
            vector: config,
            scalar: config,
        }
    }

    #[test]
    fn mask_and_unmask_single_model_is_identity() {
        let model = model_from_f32(&[1.0, -2.0, 0.5]).unwrap();
        let masker = Masker::new(pair());
        let (seed, masked) = masker.mask(Scalar::new(1.0), &model);

        let mut aggregation = Aggregation::new(pair(), model.len());
        aggregation.validate_aggregation(&masked).unwrap();
        aggregation.aggregate(masked);

        // rebuild the mask from the seed, exactly as the sum2 phase does for each sum
        // participant's own mask contribution
        let mask_masker = Masker::with_seed(pair(), seed);
        let zero_model: Model = vec![Ratio::from_integer(BigInt::from(0)); 3].into_iter().collect();
        let (_, mask) = mask_masker.mask(Scalar::new(0.0), &zero_model);

        aggregation.validate_unmasking(&mask).unwrap();
        let unmasked = aggregation.unmask(mask);
        assert_eq!(unmasked.len(), 3);
    }

    #[test]
    fn aggregate_rejects_mismatched_size() {
        let model_a = model_from_f32(&[1.0, 2.0]).unwrap();
        let model_b = model_from_f32(&[1.0, 2.0, 3.0]).unwrap();
        let (_, masked_a) = Masker::new(pair()).mask(Scalar::new(1.0), &model_a);
        let (_, masked_b) = Masker::new(pair()).mask(Scalar::new(1.0), &model_b);

        let mut aggregation = Aggregation::new(pair(), model_a.len());
        aggregation.aggregate(masked_a);
        assert_eq!(
            aggregation.validate_aggregation(&masked_b),
            Err(AggregationError::ModelMismatch)
        );
    }
}
