//! The plaintext model representation masking operates on.
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: ../index.html

use std::iter::FromIterator;

use num::{bigint::BigInt, rational::Ratio};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors related to invalid model conversions.
pub enum ModelCastError {
    #[error("casting primitive model weights to ratios of big integers failed")]
    ToRatio,
    #[error("casting ratios of big integers to primitive model weights failed")]
    FromRatio,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// A numerical representation of a model's weights, as ratios of big integers.
///
/// Masking operates on this fixed-precision representation instead of directly on `f32`/`f64`
/// weights so that the shift-then-reduce-modulo-q construction in [`super::masking::Masker`] is
/// exact and reversible.
pub struct Model(Vec<Ratio<BigInt>>);

impl Model {
    /// Creates a model from its ratio-of-bigint weights.
    pub fn new(weights: Vec<Ratio<BigInt>>) -> Self {
        Self(weights)
    }

    /// Returns the number of weights in the model.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the model has no weights.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the model's weights.
    pub fn iter(&self) -> impl Iterator<Item = &Ratio<BigInt>> {
        self.0.iter()
    }
}

impl FromIterator<Ratio<BigInt>> for Model {
    fn from_iter<I: IntoIterator<Item = Ratio<BigInt>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Model {
    type Item = Ratio<BigInt>;
    type IntoIter = std::vec::IntoIter<Ratio<BigInt>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Converts a slice of `f32` primitive weights into a [`Model`].
///
/// # Errors
/// Fails if any of the weights is not finite.
pub fn model_from_f32(weights: &[f32]) -> Result<Model, ModelCastError> {
    weights
        .iter()
        .map(|w| Ratio::from_float(*w).ok_or(ModelCastError::ToRatio))
        .collect::<Result<Vec<_>, _>>()
        .map(Model)
}

/// A primitive numerical type that a [`Model`] can be built from or converted back into.
///
/// `MaskConfig`'s [`DataType`](super::config::DataType) enumerates exactly the four primitive
/// types implementing this trait; which one an application picks only matters for the
/// cast-back-to-primitives step, since [`Model`] itself always stores exact `Ratio<BigInt>`
/// weights internally.
pub trait FromPrimitives: Sized + Copy {
    /// Converts this primitive value into a ratio of big integers.
    fn to_ratio(self) -> Result<Ratio<BigInt>, ModelCastError>;

    /// Converts a ratio of big integers back into this primitive type.
    fn from_ratio(ratio: &Ratio<BigInt>) -> Result<Self, ModelCastError>;
}

impl FromPrimitives for f32 {
    fn to_ratio(self) -> Result<Ratio<BigInt>, ModelCastError> {
        Ratio::from_float(self).ok_or(ModelCastError::ToRatio)
    }

    fn from_ratio(ratio: &Ratio<BigInt>) -> Result<Self, ModelCastError> {
        use num::traits::ToPrimitive;
        ratio.to_f32().ok_or(ModelCastError::FromRatio)
    }
}

impl FromPrimitives for f64 {
    fn to_ratio(self) -> Result<Ratio<BigInt>, ModelCastError> {
        Ratio::from_float(self).ok_or(ModelCastError::ToRatio)
    }

    fn from_ratio(ratio: &Ratio<BigInt>) -> Result<Self, ModelCastError> {
        use num::traits::ToPrimitive;
        ratio.to_f64().ok_or(ModelCastError::FromRatio)
    }
}

impl FromPrimitives for i32 {
    fn to_ratio(self) -> Result<Ratio<BigInt>, ModelCastError> {
        Ok(Ratio::from_integer(BigInt::from(self)))
    }

    fn from_ratio(ratio: &Ratio<BigInt>) -> Result<Self, ModelCastError> {
        use num::traits::ToPrimitive;
        ratio.to_integer().to_i32().ok_or(ModelCastError::FromRatio)
    }
}

impl FromPrimitives for i64 {
    fn to_ratio(self) -> Result<Ratio<BigInt>, ModelCastError> {
        Ok(Ratio::from_integer(BigInt::from(self)))
    }

    fn from_ratio(ratio: &Ratio<BigInt>) -> Result<Self, ModelCastError> {
        use num::traits::ToPrimitive;
        ratio.to_integer().to_i64().ok_or(ModelCastError::FromRatio)
    }
}

impl Model {
    /// Builds a model from an iterator of primitive weights (`f32`, `f64`, `i32` or `i64`).
    ///
    /// # Errors
    /// Fails if any of the weights cannot be cast to a ratio of big integers (e.g. a non-finite
    /// float).
    pub fn from_primitives<T, I>(iter: I) -> Result<Self, ModelCastError>
    where
        T: FromPrimitives,
        I: Iterator<Item = T>,
    {
        iter.map(FromPrimitives::to_ratio)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Casts this model's weights back into a vector of primitives.
    ///
    /// # Errors
    /// Fails if any weight doesn't fit into the target primitive type.
    pub fn into_primitives<T>(self) -> Result<Vec<T>, ModelCastError>
    where
        T: FromPrimitives,
    {
        self.0.iter().map(T::from_ratio).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f32_rejects_non_finite() {
        assert!(model_from_f32(&[1.0, f32::NAN]).is_err());
        assert!(model_from_f32(&[1.0, 2.5, -3.25]).is_ok());
    }

    #[test]
    fn len_and_is_empty() {
        let model = model_from_f32(&[1.0, 2.0]).unwrap();
        assert_eq!(model.len(), 2);
        assert!(!model.is_empty());
        assert!(Model::default().is_empty());
    }

    #[test]
    fn from_primitives_roundtrips_integers() {
        let model = Model::from_primitives(vec![1_i32, -2, 3].into_iter()).unwrap();
        let back: Vec<i32> = model.into_primitives().unwrap();
        assert_eq!(back, vec![1, -2, 3]);
    }
}
