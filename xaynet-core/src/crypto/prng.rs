//! PRNG utilities for the crypto primitives.
//!
//! See the [crypto module] documentation since this is a private module anyways.
//!
//! [crypto module]: crate::crypto

use num::{bigint::BigUint, traits::identities::Zero};
use rand::RngCore;
use rand_chacha::ChaCha20Rng;

/// Generates a secure pseudo-random integer.
///
/// Draws from a uniform distribution over the integers between zero (included) and
/// `max_int` (excluded). Employs the `ChaCha20` stream cipher as a PRNG, seeded from a mask
/// seed, so that the same seed always expands into the same stream of integers.
pub fn generate_integer(prng: &mut ChaCha20Rng, max_int: &BigUint) -> BigUint {
    if max_int.is_zero() {
        return BigUint::zero();
    }
    let mut bytes = max_int.to_bytes_le();
    let mut rand_int = max_int.clone();
    while &rand_int >= max_int {
        prng.fill_bytes(&mut bytes);
        rand_int = BigUint::from_bytes_le(&bytes);
    }
    rand_int
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn generated_integer_is_below_bound() {
        let mut prng = ChaCha20Rng::from_seed([0_u8; 32]);
        let max = BigUint::from(1_000_000_u64);
        for _ in 0..100 {
            assert!(generate_integer(&mut prng, &max) < max);
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let max = BigUint::from(1_000_000_000_u64);
        let mut a = ChaCha20Rng::from_seed([7_u8; 32]);
        let mut b = ChaCha20Rng::from_seed([7_u8; 32]);
        for _ in 0..10 {
            assert_eq!(generate_integer(&mut a, &max), generate_integer(&mut b, &max));
        }
    }

    #[test]
    fn zero_bound_yields_zero() {
        let mut prng = ChaCha20Rng::from_seed([3_u8; 32]);
        assert_eq!(generate_integer(&mut prng, &BigUint::zero()), BigUint::zero());
    }
}
