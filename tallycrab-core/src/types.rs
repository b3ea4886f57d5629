use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Event time in milliseconds since epoch.
pub type EventTime = i64;

/// Index of a partition inside a topic.
pub type PartitionId = u32;

/// Position of a message inside its partition log.
pub type Offset = u64;

/// A message as delivered to a subscriber.
///
/// `timestamp`, `partition` and `offset` are stamped by the topic at send time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    pub timestamp: EventTime,
    pub partition: PartitionId,
    pub offset: Offset,
}

impl Message {
    /// Whether the message was routed by key rather than round-robin.
    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }
}

/// Where a sent message landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: PartitionId,
    pub offset: Offset,
    pub timestamp: EventTime,
}

/// Text payload carried between the producer and the consumer.
///
/// The wire encoding is the raw UTF-8 bytes of `text`: no framing, no tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextRecord {
    pub text: String,
}

impl TextRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.text.as_bytes().to_vec()
    }

    /// Decode the value of `message`, rejecting payloads that are not UTF-8.
    pub fn decode(message: &Message) -> Result<Self> {
        std::str::from_utf8(&message.value)
            .map(Self::new)
            .map_err(|e| Error::Decode {
                partition: message.partition,
                offset: message.offset,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(value: Vec<u8>) -> Message {
        Message {
            key: None,
            value,
            timestamp: 1_000,
            partition: 0,
            offset: 3,
        }
    }

    #[test]
    fn test_text_record_encodes_raw_utf8() {
        let record = TextRecord::new("hello world");
        assert_eq!(record.encode(), b"hello world".to_vec());
    }

    #[test]
    fn test_text_record_decode() {
        let decoded = TextRecord::decode(&message("héllo".as_bytes().to_vec())).unwrap();
        assert_eq!(decoded.text, "héllo");
    }

    #[test]
    fn test_text_record_decode_rejects_invalid_utf8() {
        let err = TextRecord::decode(&message(vec![0xff, 0xfe, 0x00])).unwrap_err();
        match err {
            Error::Decode {
                partition, offset, ..
            } => {
                assert_eq!(partition, 0);
                assert_eq!(offset, 3);
            }
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_message_is_keyed() {
        let mut msg = message(b"x".to_vec());
        assert!(!msg.is_keyed());
        msg.key = Some(b"k".to_vec());
        assert!(msg.is_keyed());
    }
}
