//! Mask seeds and their derived encrypted representation.
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: ../index.html

use derive_more::{AsMut, AsRef, From};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::crypto::{encrypt::SEALBYTES, ByteObject, PublicEncryptKey, SecretEncryptKey};

/// Length in bytes of a [`MaskSeed`].
pub const MASK_SEED_LEN: usize = 32;

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Hash, Eq, PartialEq, Copy, Clone, Debug)]
/// A seed for a pseudo-random mask, expanded into a stream of mask integers via `ChaCha20`.
pub struct MaskSeed([u8; MASK_SEED_LEN]);

impl ByteObject for MaskSeed {
    const LENGTH: usize = MASK_SEED_LEN;

    fn zeroed() -> Self {
        Self([0_u8; MASK_SEED_LEN])
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != MASK_SEED_LEN {
            return None;
        }
        let mut array = [0_u8; MASK_SEED_LEN];
        array.copy_from_slice(bytes);
        Some(Self(array))
    }
}

impl MaskSeed {
    /// Gets this seed as an array, for consumption by [`rand::SeedableRng::from_seed`].
    pub fn as_array(&self) -> [u8; MASK_SEED_LEN] {
        self.0
    }

    /// Creates a `ChaCha20` PRNG seeded with this mask seed.
    pub fn into_rng(self) -> ChaCha20Rng {
        use rand::SeedableRng;
        ChaCha20Rng::from_seed(self.0)
    }

    /// Encrypts this seed for the given sum participant's public encryption key.
    ///
    /// This is how an update participant hands its mask seed to a sum participant without
    /// revealing it to the coordinator: the ciphertext is only meaningful to whoever holds the
    /// matching secret key.
    pub fn encrypt(&self, pk: &PublicEncryptKey) -> EncryptedMaskSeed {
        EncryptedMaskSeed(pk.encrypt(self.as_slice()))
    }
}

/// Length in bytes of an [`EncryptedMaskSeed`].
pub const ENCRYPTED_MASK_SEED_LEN: usize = MASK_SEED_LEN + SEALBYTES;

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Hash, Eq, PartialEq, Clone, Debug)]
/// A [`MaskSeed`] sealed with a sum participant's public encryption key.
pub struct EncryptedMaskSeed(Vec<u8>);

impl EncryptedMaskSeed {
    /// Decrypts this ciphertext into the original [`MaskSeed`], given the matching key pair.
    pub fn decrypt(&self, pk: &PublicEncryptKey, sk: &SecretEncryptKey) -> Option<MaskSeed> {
        sk.decrypt(&self.0, pk).ok().and_then(|bytes| MaskSeed::from_slice(&bytes))
    }

    /// Gets this encrypted seed as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for MaskSeed {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_slice_unchecked(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptKeyPair;

    #[test]
    fn seed_roundtrips_through_encryption() {
        let keys = EncryptKeyPair::generate();
        let seed = MaskSeed::generate();
        let encrypted = seed.encrypt(&keys.public);
        let decrypted = encrypted.decrypt(&keys.public, &keys.secret).unwrap();
        assert_eq!(seed, decrypted);
    }

    #[test]
    fn same_seed_yields_same_rng_stream() {
        use rand::RngCore;
        let seed = MaskSeed::generate();
        let mut a = seed.into_rng();
        let mut b = seed.into_rng();
        let (mut x, mut y) = ([0u8; 16], [0u8; 16]);
        a.fill_bytes(&mut x);
        b.fill_bytes(&mut y);
        assert_eq!(x, y);
    }
}
