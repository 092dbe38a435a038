//! The message header shared by every message kind.
//!
//! See the [message module] documentation since this is a private module anyways.
//!
//! [message module]: ../index.html

use std::{convert::TryFrom, ops::Range};

use anyhow::{anyhow, Context};

use crate::{
    crypto::{ByteObject, PublicSigningKey},
    message::{
        traits::{FromBytes, ToBytes},
        utils::range,
        DecodeError,
    },
};

const TAG_RANGE: Range<usize> = range(0, 1);
const PK_RANGE: Range<usize> = range(TAG_RANGE.end, PublicSigningKey::LENGTH);

/// Length in bytes of a serialized [`Header`].
pub const HEADER_LENGTH: usize = PK_RANGE.end;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
/// The kind of payload that follows a [`Header`] in a message buffer.
pub enum Tag {
    /// A sum message.
    Sum = 101,
    /// An update message.
    Update = 102,
    /// A sum2 message.
    Sum2 = 103,
    /// A part of a multi-part message, reassembled before being interpreted as one of the above.
    Chunk = 104,
}

impl TryFrom<u8> for Tag {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            101 => Ok(Tag::Sum),
            102 => Ok(Tag::Update),
            103 => Ok(Tag::Sum2),
            104 => Ok(Tag::Chunk),
            other => Err(anyhow!("invalid message tag: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// A wrapper around a buffer that contains a [`Header`].
pub struct HeaderBuffer<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> HeaderBuffer<T> {
    /// Performs bound checks for the various header fields on `bytes` and returns a new
    /// [`HeaderBuffer`].
    ///
    /// # Errors
    /// Fails if `bytes` is smaller than [`HEADER_LENGTH`].
    pub fn new(bytes: T) -> Result<Self, DecodeError> {
        let buffer = Self { inner: bytes };
        buffer
            .check_buffer_length()
            .context("not a valid HeaderBuffer")?;
        Ok(buffer)
    }

    /// Returns a `HeaderBuffer` with the given `bytes` without performing bound checks.
    pub fn new_unchecked(bytes: T) -> Self {
        Self { inner: bytes }
    }

    /// Performs bound checks for the various header fields on this buffer.
    pub fn check_buffer_length(&self) -> Result<(), DecodeError> {
        let len = self.inner.as_ref().len();
        if len < HEADER_LENGTH {
            return Err(anyhow!("invalid buffer length: {} < {}", len, HEADER_LENGTH));
        }
        Ok(())
    }

    /// Gets the tag field.
    pub fn tag(&self) -> u8 {
        self.inner.as_ref()[TAG_RANGE][0]
    }

    /// Gets the participant public key field.
    pub fn participant_pk(&self) -> &[u8] {
        &self.inner.as_ref()[PK_RANGE]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> HeaderBuffer<T> {
    /// Sets the tag field.
    pub fn set_tag(&mut self, value: u8) {
        self.inner.as_mut()[TAG_RANGE][0] = value;
    }

    /// Gets a mutable reference to the participant public key field.
    pub fn participant_pk_mut(&mut self) -> &mut [u8] {
        &mut self.inner.as_mut()[PK_RANGE]
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// The fixed-size prefix carried by every message, authenticating the sender and dispatching to
/// the right payload parser.
pub struct Header {
    /// The public key of the participant sending this message.
    pub participant_pk: PublicSigningKey,
    /// The payload kind that follows.
    pub tag: Tag,
}

impl ToBytes for Header {
    fn buffer_length(&self) -> usize {
        HEADER_LENGTH
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        let mut writer = HeaderBuffer::new_unchecked(buffer.as_mut());
        writer.set_tag(self.tag as u8);
        writer
            .participant_pk_mut()
            .copy_from_slice(self.participant_pk.as_slice());
    }
}

impl FromBytes for Header {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        let reader = HeaderBuffer::new(buffer.as_ref())?;
        let tag = Tag::try_from(reader.tag())?;
        let participant_pk = PublicSigningKey::from_slice(reader.participant_pk())
            .ok_or_else(|| anyhow!("invalid participant public key"))?;
        Ok(Self { participant_pk, tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let header = Header {
            participant_pk: PublicSigningKey::zeroed(),
            tag: Tag::Sum,
        };
        let mut buf = vec![0xff; header.buffer_length()];
        header.to_bytes(&mut buf);
        let parsed = Header::from_bytes(&buf).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_unknown_tag() {
        let mut buf = vec![0_u8; HEADER_LENGTH];
        buf[0] = 250;
        assert!(Header::from_bytes(&buf).is_err());
    }
}
