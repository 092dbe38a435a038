//! Reassembly buffer for multi-part messages, grounded on the mask/mosaic lineage's
//! `multipart` service: a message whose serialized form exceeds the transport's size limit
//! arrives as a sequence of [`Chunk`]s sharing a `message_id`; this buffer collects them, keyed
//! by that id, until every part has arrived, then hands back the reassembled bytes so they can be
//! re-parsed as a [`Message`](xaynet_core::message::Message) of whatever kind the sender
//! originally framed.
//!
//! A part never carries the original message's tag: the reassembled bytes are the complete,
//! self-describing [`Message`] wire encoding (header included), so re-parsing them with
//! [`Message::from_bytes`](xaynet_core::message::traits::FromBytes::from_bytes) recovers it.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use xaynet_core::message::{payload::chunk::MESSAGE_ID_LEN, Chunk};

use crate::state_machine::phases::PhaseName;

/// The parts collected so far for one multipart message, tagged with the phase that was active
/// when its first chunk arrived.
#[derive(Debug)]
struct PartialMessage {
    phase: PhaseName,
    part_count: u16,
    parts: BTreeMap<u16, Vec<u8>>,
}

impl PartialMessage {
    fn new(phase: PhaseName, part_count: u16) -> Self {
        Self {
            phase,
            part_count,
            parts: BTreeMap::new(),
        }
    }

    fn has_all_parts(&self) -> bool {
        self.parts.len() >= self.part_count as usize
    }

    fn assemble(self) -> Vec<u8> {
        self.parts.into_iter().flat_map(|(_, data)| data).collect()
    }
}

/// Buffers chunks of in-flight multipart messages, keyed by `message_id`.
///
/// Entries are evicted as soon as a message completes. A message still missing parts is bounded
/// by the phase it was started in: every call to [`MultipartBuffer::add_chunk`] first drops any
/// partial message that was started during an earlier phase, since once the round has moved on
/// such a message can never receive its remaining parts. This keeps the buffer from growing
/// without bound across an abandoned submission, without needing a timer of its own.
#[derive(Debug, Default)]
pub struct MultipartBuffer {
    in_flight: HashMap<[u8; MESSAGE_ID_LEN], PartialMessage>,
}

impl MultipartBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every partial message that was not started during `phase`.
    pub fn evict_stale(&mut self, phase: PhaseName) {
        self.in_flight.retain(|_, partial| partial.phase == phase);
    }

    /// Adds `chunk` to its message's buffer. Returns the reassembled message bytes once every
    /// part has arrived, or `None` if more parts are still outstanding.
    pub fn add_chunk(&mut self, chunk: Chunk, phase: PhaseName) -> Option<Vec<u8>> {
        self.evict_stale(phase);

        let Chunk {
            message_id,
            part_index,
            part_count,
            data,
        } = chunk;

        let partial = self
            .in_flight
            .entry(message_id)
            .or_insert_with(|| PartialMessage::new(phase, part_count));
        partial.parts.insert(part_index, data);

        if partial.has_all_parts() {
            debug!("multipart message complete, reassembling");
            let partial = self.in_flight.remove(&message_id).unwrap();
            Some(partial.assemble())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xaynet_core::crypto::{ByteObject, PublicEncryptKey, PublicSigningKey};
    use xaynet_core::message::{
        traits::{FromBytes, ToBytes},
        Header,
        Message,
        Payload,
        Sum,
        Tag,
    };
    use xaynet_core::ParticipantTaskSignature;

    fn chunk(message_id: [u8; MESSAGE_ID_LEN], part_index: u16, part_count: u16, data: Vec<u8>) -> Chunk {
        Chunk {
            message_id,
            part_index,
            part_count,
            data,
        }
    }

    #[test]
    fn reassembles_out_of_order_parts_into_the_original_message() {
        let original = Message {
            header: Header {
                participant_pk: PublicSigningKey::zeroed(),
                tag: Tag::Sum,
            },
            payload: Payload::Sum(Sum {
                sum_signature: ParticipantTaskSignature::zeroed(),
                ephm_pk: PublicEncryptKey::zeroed(),
            }),
        };
        let bytes = original.clone().into_bytes();
        let mid = [0x42; MESSAGE_ID_LEN];
        let half = bytes.len() / 2;
        let part_0 = chunk(mid, 0, 2, bytes[..half].to_vec());
        let part_1 = chunk(mid, 1, 2, bytes[half..].to_vec());

        let mut buffer = MultipartBuffer::new();
        assert!(buffer.add_chunk(part_1, PhaseName::Sum).is_none());
        let reassembled = buffer
            .add_chunk(part_0, PhaseName::Sum)
            .expect("message should be complete");

        assert_eq!(reassembled, bytes);
        let parsed = Message::from_bytes(&reassembled).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn distinct_message_ids_do_not_interfere() {
        let mut buffer = MultipartBuffer::new();
        assert!(buffer
            .add_chunk(chunk([1; MESSAGE_ID_LEN], 0, 2, vec![1]), PhaseName::Sum)
            .is_none());
        assert!(buffer
            .add_chunk(chunk([2; MESSAGE_ID_LEN], 0, 2, vec![2]), PhaseName::Sum)
            .is_none());
        assert!(buffer
            .add_chunk(chunk([1; MESSAGE_ID_LEN], 1, 2, vec![3]), PhaseName::Sum)
            .is_some());
    }

    #[test]
    fn a_partial_message_left_over_from_an_earlier_phase_is_dropped() {
        let mut buffer = MultipartBuffer::new();
        assert!(buffer
            .add_chunk(chunk([1; MESSAGE_ID_LEN], 0, 2, vec![1]), PhaseName::Sum)
            .is_none());

        // the round has moved on; the leftover half-message from the sum phase must not survive
        // into the update phase, even once its other half turns up.
        assert!(buffer
            .add_chunk(chunk([2; MESSAGE_ID_LEN], 0, 1, vec![2]), PhaseName::Update)
            .is_some());
        assert!(buffer
            .add_chunk(chunk([1; MESSAGE_ID_LEN], 1, 2, vec![3]), PhaseName::Update)
            .is_none());
    }
}
