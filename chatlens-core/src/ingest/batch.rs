//! Message batch document decoding
//!
//! A batch is one `message_<n>.json` file. Only the fields the analysis reads
//! are modelled; everything else in the document (photos, reactions, share
//! links, thread paths) is ignored by serde.

use crate::error::{Error, Result};
use crate::types::{Message, MessageBatch};
use serde::Deserialize;
use std::path::Path;

// ============================================
// Raw JSON record types (serde deserialization)
// ============================================

#[derive(Debug, Deserialize)]
struct RawBatch {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    participants: Vec<RawParticipant>,
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawParticipant {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    sender_name: String,
    timestamp_ms: i64,
    #[serde(default)]
    content: Option<String>,
}

/// Decode a batch document.
///
/// `path` is only used for error reporting. Any structural problem is fatal:
/// the export is static, so a malformed batch cannot be recovered by retrying.
pub fn decode_batch(path: &Path, bytes: &[u8]) -> Result<MessageBatch> {
    let raw: RawBatch = serde_json::from_slice(bytes).map_err(|source| Error::Batch {
        path: path.to_path_buf(),
        source,
    })?;

    let mut messages = Vec::with_capacity(raw.messages.len());
    for record in raw.messages {
        let message = Message::from_millis(
            record.sender_name,
            record.timestamp_ms,
            record.content.as_deref(),
        )
        .ok_or_else(|| Error::Batch {
            path: path.to_path_buf(),
            source: <serde_json::Error as serde::de::Error>::custom(format!(
                "timestamp_ms out of range: {}",
                record.timestamp_ms
            )),
        })?;
        messages.push(message);
    }

    Ok(MessageBatch {
        title: raw.title,
        participants: raw.participants.into_iter().map(|p| p.name).collect(),
        messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal_batch() {
        let json = br#"{
            "participants": [{"name": "Alice"}, {"name": "Me"}],
            "messages": [
                {"sender_name": "Alice", "timestamp_ms": 1579478400000, "content": "hi there", "type": "Generic"},
                {"sender_name": "Me", "timestamp_ms": 1579478460000, "photos": [{"uri": "x.jpg"}]}
            ],
            "title": "Alice",
            "is_still_participant": true
        }"#;

        let batch = decode_batch(Path::new("message_1.json"), json).unwrap();
        assert_eq!(batch.title.as_deref(), Some("Alice"));
        assert_eq!(batch.participants, vec!["Alice", "Me"]);
        assert_eq!(batch.messages.len(), 2);
        assert_eq!(batch.messages[0].content.as_deref(), Some("hi there"));
        assert_eq!(batch.messages[1].content, None);
        assert_eq!(batch.messages[1].sent_at.timestamp_millis(), 1_579_478_460_000);
    }

    #[test]
    fn test_missing_messages_is_fatal() {
        let json = br#"{"participants": [{"name": "Alice"}]}"#;
        let err = decode_batch(Path::new("message_3.json"), json).unwrap_err();
        match err {
            Error::Batch { path, .. } => assert!(path.ends_with("message_3.json")),
            other => panic!("expected batch error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_timestamp_is_fatal() {
        let json = br#"{"messages": [{"sender_name": "A", "timestamp_ms": 9223372036854775807}]}"#;
        assert!(matches!(
            decode_batch(Path::new("message_1.json"), json),
            Err(Error::Batch { .. })
        ));
    }
}
