//! Archive source trait abstraction
//!
//! The pipeline reads batches through [`ArchiveSource`] so it never touches
//! the filesystem layout directly. [`ExportDirectory`](super::ExportDirectory)
//! is the on-disk implementation; tests use in-memory sources.

use crate::error::Result;
use crate::types::{ConversationSummary, MessageBatch};

/// A readable chat export.
pub trait ArchiveSource {
    /// Read batch `index` (1-based) of a conversation folder.
    ///
    /// Returns `Ok(None)` when the batch does not exist, which marks the end
    /// of the conversation. A batch that exists but cannot be decoded is an
    /// error.
    fn read_batch(&self, folder: &str, index: usize) -> Result<Option<MessageBatch>>;

    /// Enumerate the conversation folders in the export.
    fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;
}
