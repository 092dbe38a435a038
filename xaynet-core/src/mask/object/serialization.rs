//! (De)serialization of [`MaskMany`] and [`MaskOne`].
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: ../../index.html

use std::ops::Range;

use anyhow::{anyhow, Context};
use num::bigint::BigUint;

use crate::{
    mask::{
        config::{serialization::MaskConfigBuffer, MaskConfig},
        object::{MaskMany, MaskOne},
    },
    message::{
        traits::{FromBytes, ToBytes},
        utils::range,
        DecodeError,
    },
};

use crate::mask::config::serialization::MASK_CONFIG_BUFFER_LEN;

const CONFIG_RANGE: Range<usize> = range(0, MASK_CONFIG_BUFFER_LEN);
const NUMBERS_LEN_RANGE: Range<usize> = range(CONFIG_RANGE.end, 4);
const NUMBERS_RANGE: Range<usize> = range(NUMBERS_LEN_RANGE.end, 0);

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// A wrapper around a buffer that contains a serialized mask object (either a [`MaskMany`] or a
/// [`MaskOne`]).
///
/// The buffer is self-delimiting: it carries its own [`MaskConfig`] and element count, so that a
/// reader can compute [`MaskObjectBuffer::len`] and know where the next field in a containing
/// message starts without out-of-band knowledge of how many elements this object has.
pub struct MaskObjectBuffer<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> MaskObjectBuffer<T> {
    /// Performs bound checks for the various message fields on `bytes` and returns a new
    /// [`MaskObjectBuffer`].
    ///
    /// # Errors
    /// Fails if the `bytes` are smaller than a minimal-sized mask object buffer, or if the
    /// encoded element count doesn't fit in the remaining bytes.
    pub fn new(bytes: T) -> Result<Self, DecodeError> {
        let buffer = Self { inner: bytes };
        buffer
            .check_buffer_length()
            .context("not a valid MaskObjectBuffer")?;
        Ok(buffer)
    }

    /// Returns a `MaskObjectBuffer` with the given `bytes` without performing bound checks.
    pub fn new_unchecked(bytes: T) -> Self {
        Self { inner: bytes }
    }

    /// Performs bound checks for the various message fields on this buffer.
    pub fn check_buffer_length(&self) -> Result<(), DecodeError> {
        let len = self.inner.as_ref().len();
        if len < NUMBERS_LEN_RANGE.end {
            return Err(anyhow!(
                "invalid buffer length: {} < {}",
                len,
                NUMBERS_LEN_RANGE.end
            ));
        }
        let _ = MaskConfigBuffer::new(&self.inner.as_ref()[CONFIG_RANGE]).context("invalid config field")?;
        let bytes_needed = self.numbers_offset() + self.numbers_length();
        if len < bytes_needed {
            return Err(anyhow!(
                "invalid buffer length: {} < {}",
                len,
                bytes_needed
            ));
        }
        Ok(())
    }

    /// Gets the config encoded in this buffer.
    pub fn config(&self) -> Result<MaskConfig, DecodeError> {
        MaskConfig::from_bytes(&&self.inner.as_ref()[CONFIG_RANGE])
    }

    /// Gets the number of elements encoded in this buffer.
    pub fn numbers_count(&self) -> u32 {
        let mut buf = [0_u8; 4];
        buf.copy_from_slice(&self.inner.as_ref()[NUMBERS_LEN_RANGE]);
        u32::from_le_bytes(buf)
    }

    fn numbers_offset(&self) -> usize {
        NUMBERS_RANGE.start
    }

    fn numbers_length(&self) -> usize {
        // safe unwrap: the config field has already been validated by `check_buffer_length`
        let bytes_per_number = self.config().unwrap().bytes_per_number();
        self.numbers_count() as usize * bytes_per_number
    }

    /// Gets a reference to the encoded numbers.
    pub fn numbers(&self) -> &[u8] {
        let start = self.numbers_offset();
        let end = start + self.numbers_length();
        &self.inner.as_ref()[start..end]
    }

    /// Gets the total length in bytes of the mask object encoded in this buffer.
    pub fn len(&self) -> usize {
        self.numbers_offset() + self.numbers_length()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> MaskObjectBuffer<T> {
    /// Gets a mutable reference to the config field.
    pub fn config_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[CONFIG_RANGE]
    }

    /// Sets the number of elements encoded in this buffer.
    pub fn set_numbers_count(&mut self, value: u32) {
        self.inner.as_mut()[NUMBERS_LEN_RANGE].copy_from_slice(&value.to_le_bytes());
    }

    /// Gets a mutable reference to the encoded numbers, sized for `len` bytes.
    pub fn numbers_mut(&mut self, len: usize) -> &mut [u8] {
        let start = NUMBERS_RANGE.start;
        &mut self.inner.as_mut()[start..start + len]
    }
}

fn write_numbers(data: &[BigUint], config: &MaskConfig, out: &mut [u8]) {
    let bytes_per_number = config.bytes_per_number();
    for (chunk, number) in out.chunks_exact_mut(bytes_per_number).zip(data.iter()) {
        let bytes = number.to_bytes_le();
        chunk[..bytes.len()].copy_from_slice(&bytes);
        for byte in chunk[bytes.len()..].iter_mut() {
            *byte = 0;
        }
    }
}

fn read_numbers(bytes: &[u8], config: &MaskConfig, count: usize) -> Vec<BigUint> {
    let bytes_per_number = config.bytes_per_number();
    bytes
        .chunks_exact(bytes_per_number)
        .take(count)
        .map(BigUint::from_bytes_le)
        .collect()
}

impl ToBytes for MaskMany {
    fn buffer_length(&self) -> usize {
        NUMBERS_RANGE.start + self.data.len() * self.config.bytes_per_number()
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = MaskObjectBuffer::new_unchecked(buffer.as_mut());
        self.config.to_bytes(&mut writer.config_mut());
        writer.set_numbers_count(self.data.len() as u32);
        let len = self.data.len() * self.config.bytes_per_number();
        write_numbers(&self.data, &self.config, writer.numbers_mut(len));
    }
}

impl FromBytes for MaskMany {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = MaskObjectBuffer::new(buffer.as_ref())?;
        let config = reader.config().context("invalid mask config")?;
        let count = reader.numbers_count() as usize;
        let data = read_numbers(reader.numbers(), &config, count);
        Ok(MaskMany::new(config, data))
    }
}

impl ToBytes for MaskOne {
    fn buffer_length(&self) -> usize {
        NUMBERS_RANGE.start + self.config.bytes_per_number()
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = MaskObjectBuffer::new_unchecked(buffer.as_mut());
        self.config.to_bytes(&mut writer.config_mut());
        writer.set_numbers_count(1);
        let len = self.config.bytes_per_number();
        write_numbers(&[self.data.clone()], &self.config, writer.numbers_mut(len));
    }
}

impl FromBytes for MaskOne {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = MaskObjectBuffer::new(buffer.as_ref())?;
        let config = reader.config().context("invalid mask config")?;
        let data = read_numbers(reader.numbers(), &config, 1)
            .pop()
            .ok_or_else(|| anyhow!("missing mask number"))?;
        Ok(MaskOne::new(config, data))
    }
}

#[cfg(test)]
pub(in crate::mask) mod tests {
    use super::*;
    use crate::mask::config::{BoundType, DataType, GroupType, ModelType};

    fn test_config() -> MaskConfig {
        MaskConfig {
            group_type: GroupType::Prime,
            data_type: DataType::F32,
            bound_type: BoundType::B0,
            model_type: ModelType::M3,
        }
    }

    pub fn object() -> MaskMany {
        MaskMany::new(test_config(), vec![BigUint::from(1_u8), BigUint::from(2_u8)])
    }

    pub fn object_1() -> MaskMany {
        MaskMany::new(test_config(), vec![BigUint::from(3_u8)])
    }

    pub fn bytes() -> Vec<u8> {
        let obj = object();
        let mut buf = vec![0xff; obj.buffer_length()];
        obj.to_bytes(&mut buf);
        buf
    }

    pub fn bytes_1() -> Vec<u8> {
        let obj = object_1();
        let mut buf = vec![0xff; obj.buffer_length()];
        obj.to_bytes(&mut buf);
        buf
    }

    #[test]
    fn roundtrip_many() {
        let obj = object();
        let mut buf = vec![0xff; obj.buffer_length()];
        obj.to_bytes(&mut buf);
        let parsed = MaskMany::from_bytes(&buf).unwrap();
        assert_eq!(parsed, obj);
    }

    #[test]
    fn roundtrip_one() {
        let obj = MaskOne::new(test_config(), BigUint::from(42_u32));
        let mut buf = vec![0xff; obj.buffer_length()];
        obj.to_bytes(&mut buf);
        let parsed = MaskOne::from_bytes(&buf).unwrap();
        assert_eq!(parsed, obj);
    }
}
