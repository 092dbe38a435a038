//! The four message payload kinds carried after a [`super::Header`].
//!
//! See the [message module] documentation since this is a private module anyways.
//!
//! [message module]: ../index.html

pub mod chunk;
pub mod sum;
pub mod sum2;
pub mod update;

pub use self::{chunk::Chunk, sum::Sum, sum2::Sum2, update::Update};

use crate::message::{
    header::Tag,
    traits::{FromBytes, ToBytes},
    DecodeError,
};

#[derive(Eq, PartialEq, Clone, Debug)]
/// A tagged union of the payload kinds a [`super::Message`] may carry.
///
/// Phase handlers only ever accept the one variant that matches the current phase; the others
/// are rejected with a phase-mismatch error before reaching the state machine.
pub enum Payload {
    /// A sum message, valid only during the sum phase.
    Sum(Sum),
    /// An update message, valid only during the update phase.
    Update(Update),
    /// A sum2 message, valid only during the sum2 phase.
    Sum2(Sum2),
    /// A chunk of a larger message, reassembled before being reinterpreted as one of the above.
    Chunk(Chunk),
}

impl Payload {
    /// Gets the tag identifying this payload's kind.
    pub fn tag(&self) -> Tag {
        match self {
            Payload::Sum(_) => Tag::Sum,
            Payload::Update(_) => Tag::Update,
            Payload::Sum2(_) => Tag::Sum2,
            Payload::Chunk(_) => Tag::Chunk,
        }
    }
}

impl ToBytes for Payload {
    fn buffer_length(&self) -> usize {
        match self {
            Payload::Sum(m) => m.buffer_length(),
            Payload::Update(m) => m.buffer_length(),
            Payload::Sum2(m) => m.buffer_length(),
            Payload::Chunk(m) => m.buffer_length(),
        }
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        match self {
            Payload::Sum(m) => m.to_bytes(buffer),
            Payload::Update(m) => m.to_bytes(buffer),
            Payload::Sum2(m) => m.to_bytes(buffer),
            Payload::Chunk(m) => m.to_bytes(buffer),
        }
    }
}

impl Payload {
    /// Parses a payload of the given `tag` from `buffer`.
    pub fn from_bytes_with_tag<T: AsRef<[u8]>>(tag: Tag, buffer: &T) -> Result<Self, DecodeError> {
        Ok(match tag {
            Tag::Sum => Payload::Sum(Sum::from_bytes(buffer)?),
            Tag::Update => Payload::Update(Update::from_bytes(buffer)?),
            Tag::Sum2 => Payload::Sum2(Sum2::from_bytes(buffer)?),
            Tag::Chunk => Payload::Chunk(Chunk::from_bytes(buffer)?),
        })
    }
}
