//! Update message payloads.
//!
//! See the [message module] documentation since this is a private module anyways.
//!
//! [message module]: ../index.html

use std::{collections::HashMap, ops::Range};

use anyhow::{anyhow, Context};

use crate::{
    crypto::{ByteObject, PublicSigningKey},
    mask::{
        object::{serialization::MaskObjectBuffer, MaskMany, MaskObject, MaskOne},
        seed::{EncryptedMaskSeed, ENCRYPTED_MASK_SEED_LEN},
    },
    message::{
        traits::{FromBytes, ToBytes},
        utils::range,
        DecodeError,
    },
    LocalSeedDict,
    ParticipantTaskSignature,
};

const SUM_SIGNATURE_RANGE: Range<usize> = range(0, ParticipantTaskSignature::LENGTH);
const UPDATE_SIGNATURE_RANGE: Range<usize> =
    range(SUM_SIGNATURE_RANGE.end, ParticipantTaskSignature::LENGTH);

/// One fixed-size entry of a serialized [`LocalSeedDict`]: a sum participant's public key
/// followed by the mask seed encrypted for it.
const LOCAL_SEED_DICT_ENTRY_LEN: usize = PublicSigningKey::LENGTH + ENCRYPTED_MASK_SEED_LEN;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// A wrapper around a buffer that contains a serialized [`LocalSeedDict`].
///
/// The encoding is a 4-byte little-endian entry count followed by that many fixed-size
/// `(PublicSigningKey, EncryptedMaskSeed)` entries; both fields have a fixed length, so unlike
/// [`super::super::super::mask::object::serialization::MaskObjectBuffer`] no further
/// self-description is required per entry.
pub struct LocalSeedDictBuffer<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> LocalSeedDictBuffer<T> {
    /// Performs bound checks for the entry count and the entries themselves on `bytes` and
    /// returns a new [`LocalSeedDictBuffer`].
    ///
    /// # Errors
    /// Fails if `bytes` is too short to contain the encoded number of entries.
    pub fn new(bytes: T) -> Result<Self, DecodeError> {
        let buffer = Self { inner: bytes };
        buffer
            .check_buffer_length()
            .context("not a valid LocalSeedDictBuffer")?;
        Ok(buffer)
    }

    /// Returns a `LocalSeedDictBuffer` with the given `bytes` without performing bound checks.
    pub fn new_unchecked(bytes: T) -> Self {
        Self { inner: bytes }
    }

    /// Performs bound checks for the entry count and the entries themselves on this buffer.
    pub fn check_buffer_length(&self) -> Result<(), DecodeError> {
        let len = self.inner.as_ref().len();
        if len < 4 {
            return Err(anyhow!("invalid buffer length: {} < 4", len));
        }
        let needed = self.len();
        if len < needed {
            return Err(anyhow!("invalid buffer length: {} < {}", len, needed));
        }
        Ok(())
    }

    /// Gets the number of entries encoded in this buffer.
    pub fn count(&self) -> u32 {
        let mut buf = [0_u8; 4];
        buf.copy_from_slice(&self.inner.as_ref()[0..4]);
        u32::from_le_bytes(buf)
    }

    /// Gets the total length in bytes of the dictionary encoded in this buffer.
    pub fn len(&self) -> usize {
        4 + self.count() as usize * LOCAL_SEED_DICT_ENTRY_LEN
    }

    /// Gets a reference to the raw entry bytes.
    pub fn entries(&self) -> &[u8] {
        &self.inner.as_ref()[4..self.len()]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> LocalSeedDictBuffer<T> {
    /// Sets the number of entries encoded in this buffer.
    pub fn set_count(&mut self, value: u32) {
        self.inner.as_mut()[0..4].copy_from_slice(&value.to_le_bytes());
    }

    /// Gets a mutable reference to `len` bytes of entries.
    pub fn entries_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.inner.as_mut()[4..4 + len]
    }
}

impl ToBytes for LocalSeedDict {
    fn buffer_length(&self) -> usize {
        4 + self.len() * LOCAL_SEED_DICT_ENTRY_LEN
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = LocalSeedDictBuffer::new_unchecked(buffer.as_mut());
        writer.set_count(self.len() as u32);
        let entries = writer.entries_mut(self.len() * LOCAL_SEED_DICT_ENTRY_LEN);
        for (chunk, (pk, seed)) in entries
            .chunks_exact_mut(LOCAL_SEED_DICT_ENTRY_LEN)
            .zip(self.iter())
        {
            chunk[..PublicSigningKey::LENGTH].copy_from_slice(pk.as_slice());
            chunk[PublicSigningKey::LENGTH..].copy_from_slice(seed.as_slice());
        }
    }
}

impl FromBytes for LocalSeedDict {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = LocalSeedDictBuffer::new(buffer.as_ref())?;
        let mut dict = HashMap::with_capacity(reader.count() as usize);
        for chunk in reader.entries().chunks_exact(LOCAL_SEED_DICT_ENTRY_LEN) {
            let pk = PublicSigningKey::from_slice(&chunk[..PublicSigningKey::LENGTH])
                .ok_or_else(|| anyhow!("invalid public key in local seed dict"))?;
            let seed = EncryptedMaskSeed::from(chunk[PublicSigningKey::LENGTH..].to_vec());
            dict.insert(pk, seed);
        }
        Ok(dict)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// A wrapper around a buffer that contains an [`Update`] message.
pub struct UpdateBuffer<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> UpdateBuffer<T> {
    /// Performs bound checks for the various message fields on `bytes` and returns a new
    /// [`UpdateBuffer`].
    pub fn new(bytes: T) -> Result<Self, DecodeError> {
        let buffer = Self { inner: bytes };
        buffer
            .check_buffer_length()
            .context("not a valid UpdateBuffer")?;
        Ok(buffer)
    }

    /// Returns an `UpdateBuffer` with the given `bytes` without performing bound checks.
    pub fn new_unchecked(bytes: T) -> Self {
        Self { inner: bytes }
    }

    /// Performs bound checks for the various message fields on this buffer.
    pub fn check_buffer_length(&self) -> Result<(), DecodeError> {
        let len = self.inner.as_ref().len();
        if len < UPDATE_SIGNATURE_RANGE.end {
            return Err(anyhow!(
                "invalid buffer length: {} < {}",
                len,
                UPDATE_SIGNATURE_RANGE.end
            ));
        }
        let _ = MaskObjectBuffer::new(&self.inner.as_ref()[self.masked_model_offset()..])
            .context("invalid masked model field")?;
        let _ = MaskObjectBuffer::new(&self.inner.as_ref()[self.masked_model_scalar_offset()..])
            .context("invalid masked model scalar field")?;
        let _ = MaskObjectBuffer::new(&self.inner.as_ref()[self.masked_scalar_vector_offset()..])
            .context("invalid masked scalar vector field")?;
        let _ = MaskObjectBuffer::new(&self.inner.as_ref()[self.masked_scalar_scalar_offset()..])
            .context("invalid masked scalar scalar field")?;
        let _ = LocalSeedDictBuffer::new(&self.inner.as_ref()[self.local_seed_dict_offset()..])
            .context("invalid local seed dict field")?;
        Ok(())
    }

    fn masked_model_offset(&self) -> usize {
        UPDATE_SIGNATURE_RANGE.end
    }

    fn masked_model_scalar_offset(&self) -> usize {
        let buf = MaskObjectBuffer::new_unchecked(&self.inner.as_ref()[self.masked_model_offset()..]);
        self.masked_model_offset() + buf.len()
    }

    fn masked_scalar_vector_offset(&self) -> usize {
        let buf = MaskObjectBuffer::new_unchecked(
            &self.inner.as_ref()[self.masked_model_scalar_offset()..],
        );
        self.masked_model_scalar_offset() + buf.len()
    }

    fn masked_scalar_scalar_offset(&self) -> usize {
        let buf = MaskObjectBuffer::new_unchecked(
            &self.inner.as_ref()[self.masked_scalar_vector_offset()..],
        );
        self.masked_scalar_vector_offset() + buf.len()
    }

    fn local_seed_dict_offset(&self) -> usize {
        let buf = MaskObjectBuffer::new_unchecked(
            &self.inner.as_ref()[self.masked_scalar_scalar_offset()..],
        );
        self.masked_scalar_scalar_offset() + buf.len()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> UpdateBuffer<T> {
    /// Gets a mutable reference to the sum signature field.
    pub fn sum_signature_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[SUM_SIGNATURE_RANGE]
    }

    /// Gets a mutable reference to the update signature field.
    pub fn update_signature_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[UPDATE_SIGNATURE_RANGE]
    }

    /// Gets a mutable reference to the masked model vector field.
    pub fn masked_model_mut(&mut self) -> &mut [u8] {
        let offset = self.masked_model_offset();
        &mut self.inner.as_mut()[offset..]
    }

    /// Gets a mutable reference to the masked model's companion scalar field.
    pub fn masked_model_scalar_mut(&mut self) -> &mut [u8] {
        let offset = self.masked_model_scalar_offset();
        &mut self.inner.as_mut()[offset..]
    }

    /// Gets a mutable reference to the masked scalar's vector field.
    pub fn masked_scalar_vector_mut(&mut self) -> &mut [u8] {
        let offset = self.masked_scalar_vector_offset();
        &mut self.inner.as_mut()[offset..]
    }

    /// Gets a mutable reference to the masked scalar's own scalar field.
    pub fn masked_scalar_scalar_mut(&mut self) -> &mut [u8] {
        let offset = self.masked_scalar_scalar_offset();
        &mut self.inner.as_mut()[offset..]
    }

    /// Gets a mutable reference to the local seed dict field.
    pub fn local_seed_dict_mut(&mut self) -> &mut [u8] {
        let offset = self.local_seed_dict_offset();
        &mut self.inner.as_mut()[offset..]
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> UpdateBuffer<&'a T> {
    /// Gets a reference to the sum signature field.
    pub fn sum_signature(&self) -> &'a [u8] {
        &self.inner.as_ref()[SUM_SIGNATURE_RANGE]
    }

    /// Gets a reference to the update signature field.
    pub fn update_signature(&self) -> &'a [u8] {
        &self.inner.as_ref()[UPDATE_SIGNATURE_RANGE]
    }

    /// Gets a reference to the masked model vector field.
    pub fn masked_model(&self) -> &'a [u8] {
        let offset = self.masked_model_offset();
        &self.inner.as_ref()[offset..]
    }

    /// Gets a reference to the masked model's companion scalar field.
    pub fn masked_model_scalar(&self) -> &'a [u8] {
        let offset = self.masked_model_scalar_offset();
        &self.inner.as_ref()[offset..]
    }

    /// Gets a reference to the masked scalar's vector field.
    pub fn masked_scalar_vector(&self) -> &'a [u8] {
        let offset = self.masked_scalar_vector_offset();
        &self.inner.as_ref()[offset..]
    }

    /// Gets a reference to the masked scalar's own scalar field.
    pub fn masked_scalar_scalar(&self) -> &'a [u8] {
        let offset = self.masked_scalar_scalar_offset();
        &self.inner.as_ref()[offset..]
    }

    /// Gets a reference to the local seed dict field.
    pub fn local_seed_dict(&self) -> &'a [u8] {
        let offset = self.local_seed_dict_offset();
        &self.inner.as_ref()[offset..]
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
/// A high level representation of an update message.
///
/// Sent by participants selected for the update task: a masked local model, a masked scalar
/// weight, and the mask seed shares encrypted for every sum participant.
pub struct Update {
    /// Proof of eligibility for the sum task, carried so a participant who later turns out to be
    /// sum-eligible is never misrouted through the update path.
    pub sum_signature: ParticipantTaskSignature,
    /// Proof of eligibility for the update task: `sign(sk_s, "update" || r || s_r)`.
    pub update_signature: ParticipantTaskSignature,
    /// The scalar-weighted, masked local model.
    pub masked_model: MaskObject,
    /// The masked scalar weight, masked exactly as the model is so the coordinator never learns
    /// any participant's weight in the clear.
    pub masked_scalar: MaskObject,
    /// The mask seed shares, one per sum participant captured at the start of the update phase,
    /// each encrypted for that sum participant's ephemeral public key.
    pub local_seed_dict: LocalSeedDict,
}

impl ToBytes for Update {
    fn buffer_length(&self) -> usize {
        UPDATE_SIGNATURE_RANGE.end
            + self.masked_model.vector.buffer_length()
            + self.masked_model.scalar.buffer_length()
            + self.masked_scalar.vector.buffer_length()
            + self.masked_scalar.scalar.buffer_length()
            + self.local_seed_dict.buffer_length()
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = UpdateBuffer::new_unchecked(buffer.as_mut());
        self.sum_signature.to_bytes(&mut writer.sum_signature_mut());
        self.update_signature
            .to_bytes(&mut writer.update_signature_mut());
        self.masked_model
            .vector
            .to_bytes(&mut writer.masked_model_mut());
        self.masked_model
            .scalar
            .to_bytes(&mut writer.masked_model_scalar_mut());
        self.masked_scalar
            .vector
            .to_bytes(&mut writer.masked_scalar_vector_mut());
        self.masked_scalar
            .scalar
            .to_bytes(&mut writer.masked_scalar_scalar_mut());
        self.local_seed_dict
            .to_bytes(&mut writer.local_seed_dict_mut());
    }
}

impl FromBytes for Update {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = UpdateBuffer::new(buffer.as_ref())?;
        Ok(Self {
            sum_signature: ParticipantTaskSignature::from_bytes(&reader.sum_signature())
                .context("invalid sum signature")?,
            update_signature: ParticipantTaskSignature::from_bytes(&reader.update_signature())
                .context("invalid update signature")?,
            masked_model: MaskObject::new(
                MaskMany::from_bytes(&reader.masked_model()).context("invalid masked model")?,
                MaskOne::from_bytes(&reader.masked_model_scalar())
                    .context("invalid masked model scalar")?,
            ),
            masked_scalar: MaskObject::new(
                MaskMany::from_bytes(&reader.masked_scalar_vector())
                    .context("invalid masked scalar vector")?,
                MaskOne::from_bytes(&reader.masked_scalar_scalar())
                    .context("invalid masked scalar scalar")?,
            ),
            local_seed_dict: LocalSeedDict::from_bytes(&reader.local_seed_dict())
                .context("invalid local seed dict")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::EncryptKeyPair,
        mask::{config::{BoundType, DataType, GroupType, ModelType}, MaskConfig},
    };
    use num::bigint::BigUint;

    fn config() -> MaskConfig {
        MaskConfig {
            group_type: GroupType::Prime,
            data_type: DataType::F32,
            bound_type: BoundType::B0,
            model_type: ModelType::M3,
        }
    }

    fn mask_object() -> MaskObject {
        MaskObject::new(
            MaskMany::new(config(), vec![BigUint::from(1_u8), BigUint::from(2_u8)]),
            MaskOne::new(config(), BigUint::from(3_u8)),
        )
    }

    #[test]
    fn local_seed_dict_roundtrip() {
        let keys = EncryptKeyPair::generate();
        let mut dict: LocalSeedDict = HashMap::new();
        dict.insert(
            PublicSigningKey::from_slice(&[0x42; PublicSigningKey::LENGTH]).unwrap(),
            crate::mask::MaskSeed::generate().encrypt(&keys.public),
        );
        let bytes = dict.clone().into_bytes();
        let parsed = LocalSeedDict::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, dict);
    }

    #[test]
    fn update_roundtrip() {
        let update = Update {
            sum_signature: ParticipantTaskSignature::from_slice(
                &[0x11; ParticipantTaskSignature::LENGTH],
            )
            .unwrap(),
            update_signature: ParticipantTaskSignature::from_slice(
                &[0x22; ParticipantTaskSignature::LENGTH],
            )
            .unwrap(),
            masked_model: mask_object(),
            masked_scalar: mask_object(),
            local_seed_dict: HashMap::new(),
        };
        let bytes = update.clone().into_bytes();
        let parsed = Update::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, update);
    }
}
