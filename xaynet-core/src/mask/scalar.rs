//! The per-update aggregation weight.
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: ../index.html

use num::{bigint::BigInt, rational::Ratio};

#[derive(Debug, Clone, Copy, PartialEq)]
/// A scalar weight contributed by an update participant alongside its masked model.
///
/// The coordinator never sees this value in the clear: it is masked the same way the model is
/// (see [`super::masking::Masker::mask`]) and summed into the aggregate's own mask, so that the
/// final unmasked aggregate can be divided by the true sum of weights without the coordinator
/// ever learning any individual participant's weight.
pub struct Scalar(f64);

impl Scalar {
    /// Creates a new scalar weight.
    ///
    /// # Panics
    /// Panics if `value` is not finite or negative.
    pub fn new(value: f64) -> Self {
        assert!(value.is_finite() && value >= 0., "invalid scalar weight");
        Self(value)
    }

    /// Gets the scalar's primitive value.
    pub fn into_inner(self) -> f64 {
        self.0
    }
}

impl From<Scalar> for Ratio<BigInt> {
    fn from(scalar: Scalar) -> Self {
        // safe unwrap: `Scalar::new` guarantees finiteness
        Ratio::from_float(scalar.0).unwrap()
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self(1.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn rejects_negative() {
        Scalar::new(-1.);
    }

    #[test]
    fn converts_to_ratio() {
        let s = Scalar::new(2.5);
        let r: Ratio<BigInt> = s.into();
        assert_eq!(r, Ratio::new(BigInt::from(5), BigInt::from(2)));
    }
}
