//! Multi-part message framing.
//!
//! See the [message module] documentation since this is a private module anyways.
//!
//! When a message's serialized payload would exceed the transport's configured size limit, the
//! sender splits it into numbered [`Chunk`]s that each carry the same `message_id` plus a
//! `(part_index, part_count)` pair. The coordinator reassembles chunks sharing a `message_id` in
//! memory, keyed by that id, and only re-parses the reassembled bytes as one of the "real"
//! payload kinds once every part has arrived; see `xaynet-server`'s `multipart` module.
//!
//! [message module]: ../index.html

use std::ops::Range;

use anyhow::{anyhow, Context};

use crate::message::{
    traits::{FromBytes, ToBytes},
    utils::range,
    DecodeError,
};

/// Length in bytes of a [`Chunk`]'s message id.
pub const MESSAGE_ID_LEN: usize = 16;

const MESSAGE_ID_RANGE: Range<usize> = range(0, MESSAGE_ID_LEN);
const PART_INDEX_RANGE: Range<usize> = range(MESSAGE_ID_RANGE.end, 2);
const PART_COUNT_RANGE: Range<usize> = range(PART_INDEX_RANGE.end, 2);
const DATA_RANGE_START: usize = PART_COUNT_RANGE.end;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// A wrapper around a buffer that contains a [`Chunk`].
pub struct ChunkBuffer<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> ChunkBuffer<T> {
    /// Performs bound checks for the various message fields on `bytes` and returns a new
    /// [`ChunkBuffer`].
    pub fn new(bytes: T) -> Result<Self, DecodeError> {
        let buffer = Self { inner: bytes };
        buffer
            .check_buffer_length()
            .context("not a valid ChunkBuffer")?;
        Ok(buffer)
    }

    /// Returns a `ChunkBuffer` with the given `bytes` without performing bound checks.
    pub fn new_unchecked(bytes: T) -> Self {
        Self { inner: bytes }
    }

    /// Performs bound checks for the various message fields on this buffer.
    pub fn check_buffer_length(&self) -> Result<(), DecodeError> {
        let len = self.inner.as_ref().len();
        if len < DATA_RANGE_START {
            return Err(anyhow!(
                "invalid buffer length: {} < {}",
                len,
                DATA_RANGE_START
            ));
        }
        Ok(())
    }

    /// Gets the message id field.
    pub fn message_id(&self) -> &[u8] {
        &self.inner.as_ref()[MESSAGE_ID_RANGE]
    }

    /// Gets the part index field.
    pub fn part_index(&self) -> u16 {
        let mut buf = [0_u8; 2];
        buf.copy_from_slice(&self.inner.as_ref()[PART_INDEX_RANGE]);
        u16::from_le_bytes(buf)
    }

    /// Gets the part count field.
    pub fn part_count(&self) -> u16 {
        let mut buf = [0_u8; 2];
        buf.copy_from_slice(&self.inner.as_ref()[PART_COUNT_RANGE]);
        u16::from_le_bytes(buf)
    }

    /// Gets the raw bytes of this chunk's slice of the reassembled payload.
    pub fn data(&self) -> &[u8] {
        &self.inner.as_ref()[DATA_RANGE_START..]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> ChunkBuffer<T> {
    /// Gets a mutable reference to the message id field.
    pub fn message_id_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[MESSAGE_ID_RANGE]
    }

    /// Sets the part index field.
    pub fn set_part_index(&mut self, value: u16) {
        self.inner.as_mut()[PART_INDEX_RANGE].copy_from_slice(&value.to_le_bytes());
    }

    /// Sets the part count field.
    pub fn set_part_count(&mut self, value: u16) {
        self.inner.as_mut()[PART_COUNT_RANGE].copy_from_slice(&value.to_le_bytes());
    }

    /// Gets a mutable reference to the data field.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[DATA_RANGE_START..]
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
/// One numbered part of a message too large to fit in a single request.
pub struct Chunk {
    /// Identifies all the parts of the same original message; opaque to the coordinator beyond
    /// being used as a reassembly-buffer key.
    pub message_id: [u8; MESSAGE_ID_LEN],
    /// Zero-based index of this part among `part_count` parts.
    pub part_index: u16,
    /// The total number of parts this message was split into.
    pub part_count: u16,
    /// This part's raw bytes.
    pub data: Vec<u8>,
}

impl ToBytes for Chunk {
    fn buffer_length(&self) -> usize {
        DATA_RANGE_START + self.data.len()
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = ChunkBuffer::new_unchecked(buffer.as_mut());
        writer.message_id_mut().copy_from_slice(&self.message_id);
        writer.set_part_index(self.part_index);
        writer.set_part_count(self.part_count);
        writer.data_mut().copy_from_slice(&self.data);
    }
}

impl FromBytes for Chunk {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = ChunkBuffer::new(buffer.as_ref())?;
        let mut message_id = [0_u8; MESSAGE_ID_LEN];
        message_id.copy_from_slice(reader.message_id());
        let (part_index, part_count) = (reader.part_index(), reader.part_count());
        if part_index >= part_count {
            return Err(anyhow!(
                "invalid chunk: part index {} >= part count {}",
                part_index,
                part_count
            ));
        }
        Ok(Self {
            message_id,
            part_index,
            part_count,
            data: reader.data().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let chunk = Chunk {
            message_id: [0x7; MESSAGE_ID_LEN],
            part_index: 1,
            part_count: 3,
            data: vec![1, 2, 3, 4],
        };
        let bytes = chunk.clone().into_bytes();
        let parsed = Chunk::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, chunk);
    }

    #[test]
    fn rejects_index_past_count() {
        let chunk = Chunk {
            message_id: [0x7; MESSAGE_ID_LEN],
            part_index: 3,
            part_count: 3,
            data: vec![1],
        };
        let bytes = chunk.into_bytes();
        assert!(Chunk::from_bytes(&bytes).is_err());
    }
}
