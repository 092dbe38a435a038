//! (De)serialization of [`MaskConfig`].
//!
//! See the [mask module] documentation since this is a private module anyways.
//!
//! [mask module]: ../../index.html

use std::{convert::TryFrom, ops::Range};

use anyhow::{anyhow, Context};

use crate::{
    mask::config::{BoundType, DataType, GroupType, MaskConfig, ModelType},
    message::{
        traits::{FromBytes, ToBytes},
        utils::range,
        DecodeError,
    },
};

const GROUP_TYPE_RANGE: Range<usize> = range(0, 1);
const DATA_TYPE_RANGE: Range<usize> = range(GROUP_TYPE_RANGE.end, 1);
const BOUND_TYPE_RANGE: Range<usize> = range(DATA_TYPE_RANGE.end, 1);
const MODEL_TYPE_RANGE: Range<usize> = range(BOUND_TYPE_RANGE.end, 1);

/// Number of bytes a [`MaskConfig`] occupies once serialized.
pub const MASK_CONFIG_BUFFER_LEN: usize = MODEL_TYPE_RANGE.end;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// A wrapper around a buffer that contains a [`MaskConfig`].
pub struct MaskConfigBuffer<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> MaskConfigBuffer<T> {
    /// Performs bound checks for the various message fields on `bytes` and returns a new
    /// [`MaskConfigBuffer`].
    ///
    /// # Errors
    /// Fails if the `bytes` are smaller than the length of a mask config buffer.
    pub fn new(bytes: T) -> Result<Self, DecodeError> {
        let buffer = Self { inner: bytes };
        buffer
            .check_buffer_length()
            .context("not a valid MaskConfigBuffer")?;
        Ok(buffer)
    }

    /// Returns a `MaskConfigBuffer` with the given `bytes` without performing bound checks.
    pub fn new_unchecked(bytes: T) -> Self {
        Self { inner: bytes }
    }

    /// Performs bound checks for the various message fields on this buffer.
    pub fn check_buffer_length(&self) -> Result<(), DecodeError> {
        let len = self.inner.as_ref().len();
        if len < MASK_CONFIG_BUFFER_LEN {
            return Err(anyhow!(
                "invalid buffer length: {} < {}",
                len,
                MASK_CONFIG_BUFFER_LEN
            ));
        }
        Ok(())
    }

    /// Gets the group type field.
    pub fn group_type(&self) -> u8 {
        self.inner.as_ref()[GROUP_TYPE_RANGE][0]
    }

    /// Gets the data type field.
    pub fn data_type(&self) -> u8 {
        self.inner.as_ref()[DATA_TYPE_RANGE][0]
    }

    /// Gets the bound type field.
    pub fn bound_type(&self) -> u8 {
        self.inner.as_ref()[BOUND_TYPE_RANGE][0]
    }

    /// Gets the model type field.
    pub fn model_type(&self) -> u8 {
        self.inner.as_ref()[MODEL_TYPE_RANGE][0]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> MaskConfigBuffer<T> {
    /// Sets the group type field.
    pub fn set_group_type(&mut self, value: u8) {
        self.inner.as_mut()[GROUP_TYPE_RANGE][0] = value;
    }

    /// Sets the data type field.
    pub fn set_data_type(&mut self, value: u8) {
        self.inner.as_mut()[DATA_TYPE_RANGE][0] = value;
    }

    /// Sets the bound type field.
    pub fn set_bound_type(&mut self, value: u8) {
        self.inner.as_mut()[BOUND_TYPE_RANGE][0] = value;
    }

    /// Sets the model type field.
    pub fn set_model_type(&mut self, value: u8) {
        self.inner.as_mut()[MODEL_TYPE_RANGE][0] = value;
    }
}

impl ToBytes for MaskConfig {
    fn buffer_length(&self) -> usize {
        MASK_CONFIG_BUFFER_LEN
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = MaskConfigBuffer::new_unchecked(buffer.as_mut());
        writer.set_group_type(self.group_type as u8);
        writer.set_data_type(self.data_type as u8);
        writer.set_bound_type(self.bound_type as u8);
        writer.set_model_type(self.model_type as u8);
    }
}

impl FromBytes for MaskConfig {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = MaskConfigBuffer::new(buffer.as_ref())?;
        Ok(MaskConfig {
            group_type: GroupType::try_from(reader.group_type()).context("invalid group type")?,
            data_type: DataType::try_from(reader.data_type()).context("invalid data type")?,
            bound_type: BoundType::try_from(reader.bound_type())
                .context("invalid bound type")?,
            model_type: ModelType::try_from(reader.model_type())
                .context("invalid model type")?,
        })
    }
}

#[cfg(test)]
pub(in crate::mask) mod tests {
    use super::*;

    pub fn config() -> (MaskConfig, Vec<u8>) {
        let config = MaskConfig {
            group_type: GroupType::Prime,
            data_type: DataType::F32,
            bound_type: BoundType::B0,
            model_type: ModelType::M3,
        };
        let bytes = vec![1, 0, 0, 3];
        (config, bytes)
    }

    #[test]
    fn encode() {
        let (config, bytes) = config();
        let mut buf = vec![0xff; config.buffer_length()];
        config.to_bytes(&mut buf);
        assert_eq!(buf, bytes);
    }

    #[test]
    fn decode() {
        let (config, bytes) = config();
        let parsed = MaskConfig::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, config);
    }
}
