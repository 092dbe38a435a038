//! The wire codec for PET protocol messages.
//!
//! A [`Message`] is a [`Header`] (participant public key + payload tag) followed by the tagged
//! [`Payload`]. Every message is signed as a whole by the participant's long-lived signing key
//! before being sent (the signature itself travels out of band, at the transport layer); this
//! module only concerns itself with framing and parsing the four payload kinds, plus the
//! [`Chunk`](payload::Chunk) kind used to reassemble oversized payloads.
pub mod header;
pub mod payload;
pub mod traits;
pub mod utils;

pub use self::{
    header::{Header, Tag},
    payload::{Chunk, Payload, Sum, Sum2, Update},
    traits::{FromBytes, ToBytes},
};

/// The error type returned when a message fails to parse.
///
/// Malformed framing, an out-of-range enumerant, or a buffer that is too short for its declared
/// fields all surface as a `DecodeError`, which maps to a `400`-class response at the transport
/// layer.
pub type DecodeError = anyhow::Error;

#[derive(Eq, PartialEq, Clone, Debug)]
/// A complete, parsed PET protocol message: a [`Header`] plus its [`Payload`].
pub struct Message {
    /// The message header.
    pub header: Header,
    /// The message payload.
    pub payload: Payload,
}

impl ToBytes for Message {
    fn buffer_length(&self) -> usize {
        self.header.buffer_length() + self.payload.buffer_length()
    }

    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T) {
        self.header.to_bytes(buffer);
        let header_len = self.header.buffer_length();
        let mut tail = &mut buffer.as_mut()[header_len..];
        self.payload.to_bytes(&mut tail);
    }
}

impl FromBytes for Message {
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError> {
        use anyhow::Context;
        let bytes = buffer.as_ref();
        let header = Header::from_bytes(&bytes).context("invalid message header")?;
        let header_len = header.buffer_length();
        let payload = Payload::from_bytes_with_tag(header.tag, &&bytes[header_len..])
            .context("invalid message payload")?;
        Ok(Self { header, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{ByteObject, PublicSigningKey};

    #[test]
    fn roundtrip_sum_message() {
        let (sum, _) = payload::sum::tests_helpers::sum();
        let message = Message {
            header: Header {
                participant_pk: PublicSigningKey::zeroed(),
                tag: Tag::Sum,
            },
            payload: Payload::Sum(sum),
        };
        let bytes = message.clone().into_bytes();
        let parsed = Message::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn rejects_tag_payload_mismatch_gracefully() {
        // a Sum2 payload parsed under the Update tag should fail, not panic
        let (sum2, _) = payload::sum2::tests::helpers::sum2();
        let bytes = sum2.into_bytes();
        assert!(Payload::from_bytes_with_tag(Tag::Update, &bytes).is_err());
    }
}
