//! Wrappers around some of the [sodiumoxide] sealed box encryption primitives.
//!
//! See the [crypto module] documentation since this is a private module anyways.
//!
//! [sodiumoxide]: https://docs.rs/sodiumoxide/
//! [crypto module]: crate::crypto

use derive_more::{AsMut, AsRef, From};
use serde::{Deserialize, Serialize};
use sodiumoxide::crypto::{box_, sealedbox};

use super::ByteObject;

/// Number of bytes added to a message by [`PublicEncryptKey::encrypt`].
pub const SEALBYTES: usize = sealedbox::SEALBYTES;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A `C25519` key pair for encryption.
pub struct EncryptKeyPair {
    /// The `C25519` public key.
    pub public: PublicEncryptKey,
    /// The `C25519` secret key.
    pub secret: SecretEncryptKey,
}

impl EncryptKeyPair {
    /// Generates a new random `C25519` key pair for encryption.
    pub fn generate() -> Self {
        let (pk, sk) = box_::gen_keypair();
        Self {
            public: PublicEncryptKey(pk),
            secret: SecretEncryptKey(sk),
        }
    }

    /// Deterministically derives a `C25519` key pair from a seed.
    pub fn derive_from_seed(seed: &EncryptKeySeed) -> Self {
        let (pk, sk) = box_::keypair_from_seed(&seed.0);
        Self {
            public: PublicEncryptKey(pk),
            secret: SecretEncryptKey(sk),
        }
    }
}

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Hash, Eq, PartialEq, Copy, Clone, Debug)]
/// A seed for deriving a `C25519` encryption key pair deterministically.
pub struct EncryptKeySeed(box_::Seed);

impl ByteObject for EncryptKeySeed {
    const LENGTH: usize = box_::SEEDBYTES;

    fn zeroed() -> Self {
        Self(box_::Seed([0_u8; Self::LENGTH]))
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        box_::Seed::from_slice(bytes).map(Self)
    }
}

#[derive(
    AsRef,
    AsMut,
    From,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    Ord,
    PartialEq,
    Copy,
    Clone,
    PartialOrd,
    Debug,
)]
/// A `C25519` public key for encryption.
pub struct PublicEncryptKey(box_::PublicKey);

impl PublicEncryptKey {
    /// Encrypts a message `m` with this public key using an anonymous sealed box.
    ///
    /// The resulting ciphertext carries an ephemeral public key and does not reveal the
    /// identity of the sender, so an update participant never learns which sum participant
    /// will ultimately decrypt the seed it encrypted.
    pub fn encrypt(&self, m: &[u8]) -> Vec<u8> {
        sealedbox::seal(m, self.as_ref())
    }
}

impl ByteObject for PublicEncryptKey {
    const LENGTH: usize = box_::PUBLICKEYBYTES;

    fn zeroed() -> Self {
        Self(box_::PublicKey([0_u8; Self::LENGTH]))
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        box_::PublicKey::from_slice(bytes).map(Self)
    }
}

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
/// A `C25519` secret key for encryption.
///
/// When this goes out of scope, its contents will be zeroed out.
pub struct SecretEncryptKey(box_::SecretKey);

impl SecretEncryptKey {
    /// Decrypts a sealed box ciphertext `c` using this secret key and the matching public key.
    pub fn decrypt(&self, c: &[u8], pk: &PublicEncryptKey) -> Result<Vec<u8>, ()> {
        sealedbox::open(c, pk.as_ref(), self.as_ref())
    }
}

impl ByteObject for SecretEncryptKey {
    const LENGTH: usize = box_::SECRETKEYBYTES;

    fn zeroed() -> Self {
        Self(box_::SecretKey([0_u8; Self::LENGTH]))
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        box_::SecretKey::from_slice(bytes).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let keys = EncryptKeyPair::generate();
        let message = b"Hello world!".to_vec();
        let cipher = keys.public.encrypt(&message);
        assert_eq!(message, keys.secret.decrypt(&cipher, &keys.public).unwrap());
    }

    #[test]
    fn decrypt_fails_with_wrong_key() {
        let keys = EncryptKeyPair::generate();
        let other = EncryptKeyPair::generate();
        let cipher = keys.public.encrypt(b"secret");
        assert!(other.secret.decrypt(&cipher, &other.public).is_err());
    }
}
