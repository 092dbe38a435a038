//! Wrappers around some of the [sodiumoxide] signing primitives.
//!
//! See the [crypto module] documentation since this is a private module anyways.
//!
//! [sodiumoxide]: https://docs.rs/sodiumoxide/
//! [crypto module]: crate::crypto

use std::convert::TryInto;

use derive_more::{AsMut, AsRef, From};
use serde::{Deserialize, Serialize};
use sodiumoxide::crypto::sign;

use super::ByteObject;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// An `Ed25519` key pair for signatures.
pub struct SigningKeyPair {
    /// The `Ed25519` public key.
    pub public: PublicSigningKey,
    /// The `Ed25519` secret key.
    pub secret: SecretSigningKey,
}

impl SigningKeyPair {
    /// Generates a new random `Ed25519` key pair for signing.
    pub fn generate() -> Self {
        let (pk, sk) = sign::gen_keypair();
        Self {
            public: PublicSigningKey(pk),
            secret: SecretSigningKey(sk),
        }
    }
}

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Hash, Eq, PartialEq, Copy, Clone, Debug)]
/// A seed for deriving an `Ed25519` signing key pair deterministically.
pub struct SigningKeySeed(sign::Seed);

impl SigningKeySeed {
    /// Derives a signing key pair deterministically from this seed.
    pub fn derive_signing_key_pair(&self) -> (PublicSigningKey, SecretSigningKey) {
        let (pk, sk) = sign::keypair_from_seed(&self.0);
        (PublicSigningKey(pk), SecretSigningKey(sk))
    }
}

impl ByteObject for SigningKeySeed {
    const LENGTH: usize = sign::SEEDBYTES;

    fn zeroed() -> Self {
        Self(sign::Seed([0_u8; Self::LENGTH]))
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        sign::Seed::from_slice(bytes).map(Self)
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
/// An `Ed25519` public key for signatures.
pub struct PublicSigningKey(sign::PublicKey);

impl PublicSigningKey {
    /// Verifies the signature `s` against the message `m` and this public key.
    ///
    /// Returns `true` if the signature is valid and `false` otherwise.
    pub fn verify_detached(&self, s: &Signature, m: &[u8]) -> bool {
        sign::verify_detached(s.as_ref(), m, self.as_ref())
    }
}

impl ByteObject for PublicSigningKey {
    const LENGTH: usize = sign::PUBLICKEYBYTES;

    fn zeroed() -> Self {
        Self(sign::PublicKey([0_u8; Self::LENGTH]))
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        sign::PublicKey::from_slice(bytes).map(Self)
    }
}

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
/// An `Ed25519` secret key for signatures.
///
/// When this goes out of scope, its contents will be zeroed out.
pub struct SecretSigningKey(sign::SecretKey);

impl SecretSigningKey {
    /// Signs a message `m` with this secret key.
    pub fn sign_detached(&self, m: &[u8]) -> Signature {
        sign::sign_detached(m, self.as_ref()).into()
    }

    /// Computes the corresponding public key for this secret key.
    pub fn public_key(&self) -> PublicSigningKey {
        PublicSigningKey(self.0.public_key())
    }
}

impl ByteObject for SecretSigningKey {
    const LENGTH: usize = sign::SECRETKEYBYTES;

    fn zeroed() -> Self {
        Self(sign::SecretKey([0_u8; Self::LENGTH]))
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        sign::SecretKey::from_slice(bytes).map(Self)
    }
}

#[derive(AsRef, AsMut, From, Eq, PartialEq, Copy, Clone, Debug)]
/// An `Ed25519` signature detached from its message.
pub struct Signature(sign::Signature);

mod manually_derive_serde_for_signature {
    //! sodiumoxide doesn't derive (De)Serialize for detached signatures, see
    //! <https://github.com/sodiumoxide/sodiumoxide/pull/434>.

    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    use crate::crypto::{sign::Signature, ByteObject};

    impl Serialize for Signature {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.as_slice().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Signature {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let bytes = <&[u8] as Deserialize>::deserialize(deserializer)?;
            Self::from_slice(bytes).ok_or_else(|| {
                D::Error::custom(format!(
                    "invalid length {}, expected {}",
                    bytes.len(),
                    Self::LENGTH,
                ))
            })
        }
    }
}

impl ByteObject for Signature {
    const LENGTH: usize = sign::SIGNATUREBYTES;

    fn zeroed() -> Self {
        Self(sign::Signature([0_u8; Self::LENGTH]))
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(sign::Signature::new).map(Self)
    }
}

impl Signature {
    /// Interprets the leading bytes of this signature as a uniformly distributed draw from
    /// `[0, 1)` and checks whether it falls below `threshold`.
    ///
    /// This is the selection predicate shared by the sum and update eligibility checks: a
    /// participant is eligible for a task iff the signature obtained by signing the round
    /// seed (and the task name) falls below the configured threshold for that task.
    pub fn is_eligible(&self, threshold: f64) -> bool {
        if threshold < 0. {
            return false;
        }
        if threshold > 1. {
            return true;
        }
        let mut rand_int = [0_u8; 8];
        rand_int.copy_from_slice(&self.as_slice()[0..8]);
        let rand_int = u64::from_le_bytes(rand_int);
        let rand_frac = rand_int as f64 / u64::MAX as f64;
        rand_frac < threshold
    }
}

/// A signature used to determine whether a participant is eligible for the sum or update
/// task in a given round.
pub type ParticipantTaskSignature = Signature;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let SigningKeyPair { public, secret } = SigningKeyPair::generate();
        let msg = b"some message";
        let sig = secret.sign_detached(msg);
        assert!(public.verify_detached(&sig, msg));
        assert!(!public.verify_detached(&sig, b"another message"));
    }

    #[test]
    fn derive_from_seed_is_deterministic() {
        let seed = SigningKeySeed::generate();
        let (pk1, sk1) = seed.derive_signing_key_pair();
        let (pk2, sk2) = seed.derive_signing_key_pair();
        assert_eq!(pk1, pk2);
        assert_eq!(sk1, sk2);
    }

    #[test]
    fn is_eligible_extremes() {
        let sig = Signature::zeroed();
        assert!(!sig.is_eligible(-1.0));
        assert!(sig.is_eligible(2.0));
        assert!(sig.is_eligible(1.0));
    }
}
