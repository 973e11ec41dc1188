//! Ingestion layer for reading a chat export
//!
//! Turns the numbered batch documents of a conversation folder into a single
//! [`Conversation`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌────────────────────┐     ┌──────────────┐
//! │ messages/inbox/<f>/  │ ──► │  read_conversation │ ──► │ Conversation │
//! │  message_1.json ...  │     │  (1, 2, ... until  │     │ (merged)     │
//! └──────────────────────┘     │   first missing)   │     └──────────────┘
//!                              └────────────────────┘
//!                                        │
//!                                        ▼
//!                              ┌────────────────────┐
//!                              │  ArchiveSource     │
//!                              │  └─ ExportDirectory│
//!                              └────────────────────┘
//! ```

mod batch;
mod export_dir;
mod source;

pub use batch::decode_batch;
pub use export_dir::ExportDirectory;
pub use source::ArchiveSource;

use crate::error::{Error, Result};
use crate::types::Conversation;
use std::path::PathBuf;

/// Read every batch of one conversation folder.
///
/// Batches are read in index order starting at 1 and stop at the first
/// missing index. A folder without even `message_1.json` is an error.
pub fn read_conversation<S: ArchiveSource + ?Sized>(
    source: &S,
    folder: &str,
) -> Result<Conversation> {
    let mut conversation = Conversation::new(folder);
    let mut index = 1;

    while let Some(batch) = source.read_batch(folder, index)? {
        conversation.absorb(batch);
        index += 1;
    }

    if index == 1 {
        return Err(Error::EmptyConversation(PathBuf::from(folder)));
    }

    tracing::info!(
        folder,
        batches = index - 1,
        messages = conversation.messages.len(),
        participants = conversation.participants.len(),
        "Loaded conversation"
    );

    Ok(conversation)
}

/// Read several conversation folders for a combined analysis.
pub fn load_conversations<S: ArchiveSource + ?Sized>(
    source: &S,
    folders: &[String],
) -> Result<Vec<Conversation>> {
    folders
        .iter()
        .map(|folder| read_conversation(source, folder))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationSummary, Message, MessageBatch};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemorySource {
        batches: HashMap<(String, usize), MessageBatch>,
    }

    impl MemorySource {
        fn insert(&mut self, folder: &str, index: usize, batch: MessageBatch) {
            self.batches.insert((folder.to_string(), index), batch);
        }
    }

    impl ArchiveSource for MemorySource {
        fn read_batch(&self, folder: &str, index: usize) -> Result<Option<MessageBatch>> {
            Ok(self.batches.get(&(folder.to_string(), index)).cloned())
        }

        fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
            Ok(vec![])
        }
    }

    fn batch(participants: &[&str], senders: &[&str]) -> MessageBatch {
        MessageBatch {
            title: None,
            participants: participants.iter().map(|p| p.to_string()).collect(),
            messages: senders
                .iter()
                .map(|s| Message::from_millis(*s, 0, Some("hi")).unwrap())
                .collect(),
        }
    }

    #[test]
    fn test_reads_until_first_gap() {
        let mut source = MemorySource::default();
        source.insert("chat", 1, batch(&["A", "B"], &["A", "B"]));
        source.insert("chat", 2, batch(&["A", "B", "C"], &["C"]));
        // Index 3 is missing, so index 4 is never reached.
        source.insert("chat", 4, batch(&["D"], &["D"]));

        let conv = read_conversation(&source, "chat").unwrap();
        assert_eq!(conv.messages.len(), 3);
        assert_eq!(conv.participants, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_folder_is_error() {
        let source = MemorySource::default();
        assert!(matches!(
            read_conversation(&source, "missing"),
            Err(Error::EmptyConversation(_))
        ));
    }

    #[test]
    fn test_load_multiple_folders() {
        let mut source = MemorySource::default();
        source.insert("one", 1, batch(&["A", "Me"], &["A"]));
        source.insert("two", 1, batch(&["B", "Me"], &["Me", "B"]));

        let convs =
            load_conversations(&source, &["one".to_string(), "two".to_string()]).unwrap();
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[1].folder, "two");
        assert_eq!(convs[1].messages.len(), 2);
    }
}
