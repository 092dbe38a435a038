//! Sum message payloads.
//!
//! See the [message module] documentation since this is a private module anyways.
//!
//! [message module]: ../index.html

use std::ops::Range;

use anyhow::{anyhow, Context};

use crate::{
    crypto::{ByteObject, PublicEncryptKey},
    message::{
        traits::{FromBytes, ToBytes},
        utils::range,
        DecodeError,
    },
    ParticipantTaskSignature,
};

const SUM_SIGNATURE_RANGE: Range<usize> = range(0, ParticipantTaskSignature::LENGTH);
const EPHM_PK_RANGE: Range<usize> =
    range(SUM_SIGNATURE_RANGE.end, PublicEncryptKey::LENGTH);

/// Length in bytes of a serialized [`Sum`] payload.
pub const SUM_LENGTH: usize = EPHM_PK_RANGE.end;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// A wrapper around a buffer that contains a [`Sum`] message.
pub struct SumBuffer<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> SumBuffer<T> {
    /// Performs bound checks for the various message fields on `bytes` and returns a new
    /// [`SumBuffer`].
    ///
    /// # Errors
    /// Fails if `bytes` is smaller than [`SUM_LENGTH`].
    pub fn new(bytes: T) -> Result<Self, DecodeError> {
        let buffer = Self { inner: bytes };
        buffer.check_buffer_length().context("not a valid SumBuffer")?;
        Ok(buffer)
    }

    /// Returns a `SumBuffer` with the given `bytes` without performing bound checks.
    pub fn new_unchecked(bytes: T) -> Self {
        Self { inner: bytes }
    }

    /// Performs bound checks for the various message fields on this buffer.
    pub fn check_buffer_length(&self) -> Result<(), DecodeError> {
        let len = self.inner.as_ref().len();
        if len < SUM_LENGTH {
            return Err(anyhow!("invalid buffer length: {} < {}", len, SUM_LENGTH));
        }
        Ok(())
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> SumBuffer<&'a T> {
    /// Gets a reference to the sum signature field.
    pub fn sum_signature(&self) -> &'a [u8] {
        &self.inner.as_ref()[SUM_SIGNATURE_RANGE]
    }

    /// Gets a reference to the ephemeral public key field.
    pub fn ephm_pk(&self) -> &'a [u8] {
        &self.inner.as_ref()[EPHM_PK_RANGE]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> SumBuffer<T> {
    /// Gets a mutable reference to the sum signature field.
    pub fn sum_signature_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[SUM_SIGNATURE_RANGE]
    }

    /// Gets a mutable reference to the ephemeral public key field.
    pub fn ephm_pk_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[EPHM_PK_RANGE]
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
/// A high level representation of a sum message.
///
/// Sent by participants selected for the sum task, to register their ephemeral encryption key
/// in the round's `SumDict`.
pub struct Sum {
    /// Proof of eligibility for the sum task: `sign(sk_s, "sum" || r || s_r)`.
    pub sum_signature: ParticipantTaskSignature,
    /// The ephemeral public encryption key this participant will use to receive the update
    /// participants' mask seeds.
    pub ephm_pk: PublicEncryptKey,
}

impl ToBytes for Sum {
    fn buffer_length(&self) -> usize {
        SUM_LENGTH
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = SumBuffer::new_unchecked(buffer.as_mut());
        self.sum_signature.to_bytes(&mut writer.sum_signature_mut());
        self.ephm_pk.to_bytes(&mut writer.ephm_pk_mut());
    }
}

impl FromBytes for Sum {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = SumBuffer::new(buffer.as_ref())?;
        Ok(Self {
            sum_signature: ParticipantTaskSignature::from_bytes(&reader.sum_signature())
                .context("invalid sum signature")?,
            ephm_pk: PublicEncryptKey::from_bytes(&reader.ephm_pk())
                .context("invalid ephemeral public key")?,
        })
    }
}

impl ToBytes for ParticipantTaskSignature {
    fn buffer_length(&self) -> usize {
        Self::LENGTH
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        buffer.as_mut().copy_from_slice(self.as_slice());
    }
}

impl FromBytes for ParticipantTaskSignature {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        Self::from_slice(buffer.as_ref()).ok_or_else(|| anyhow!("invalid signature length"))
    }
}

impl ToBytes for PublicEncryptKey {
    fn buffer_length(&self) -> usize {
        Self::LENGTH
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        buffer.as_mut().copy_from_slice(self.as_slice());
    }
}

impl FromBytes for PublicEncryptKey {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        Self::from_slice(buffer.as_ref()).ok_or_else(|| anyhow!("invalid public key length"))
    }
}

#[cfg(test)]
pub(in crate::message) mod tests_helpers {
    use super::*;
    use crate::crypto::ByteObject;

    pub fn sum_signature() -> (ParticipantTaskSignature, Vec<u8>) {
        let bytes = vec![0x11; ParticipantTaskSignature::LENGTH];
        (ParticipantTaskSignature::from_slice(&bytes).unwrap(), bytes)
    }

    pub fn ephm_pk() -> (PublicEncryptKey, Vec<u8>) {
        let bytes = vec![0x22; PublicEncryptKey::LENGTH];
        (PublicEncryptKey::from_slice(&bytes).unwrap(), bytes)
    }

    pub fn sum() -> (Sum, Vec<u8>) {
        let mut bytes = sum_signature().1;
        bytes.extend(ephm_pk().1);
        let sum = Sum {
            sum_signature: sum_signature().0,
            ephm_pk: ephm_pk().0,
        };
        (sum, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tests_helpers as helpers;

    #[test]
    fn encode() {
        let (sum, bytes) = helpers::sum();
        assert_eq!(sum.buffer_length(), bytes.len());
        let mut buf = vec![0xff; sum.buffer_length()];
        sum.to_bytes(&mut buf);
        assert_eq!(buf, bytes);
    }

    #[test]
    fn decode() {
        let (sum, bytes) = helpers::sum();
        let parsed = Sum::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, sum);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let bytes = vec![0_u8; SUM_LENGTH - 1];
        assert!(Sum::from_bytes(&bytes).is_err());
    }
}
