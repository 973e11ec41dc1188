//! Extracted export directory reader
//!
//! Reads `<root>/<inbox_prefix>/<folder>/message_<n>.json`.

use super::batch::decode_batch;
use super::source::ArchiveSource;
use crate::error::{Error, Result};
use crate::types::{ConversationSummary, MessageBatch};
use std::path::{Path, PathBuf};

/// An export that has already been unpacked onto disk.
pub struct ExportDirectory {
    inbox: PathBuf,
}

impl ExportDirectory {
    /// Create a reader rooted at `root`, with folders under `inbox_prefix`.
    pub fn new(root: &Path, inbox_prefix: &Path) -> Self {
        Self {
            inbox: root.join(inbox_prefix),
        }
    }

    /// Directory holding the conversation folders.
    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    fn batch_path(&self, folder: &str, index: usize) -> PathBuf {
        self.inbox
            .join(folder)
            .join(format!("message_{}.json", index))
    }
}

impl ArchiveSource for ExportDirectory {
    fn read_batch(&self, folder: &str, index: usize) -> Result<Option<MessageBatch>> {
        let path = self.batch_path(folder, index);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read message batch");
        decode_batch(&path, &bytes).map(Some)
    }

    fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let pattern = self.inbox.join("*").join("message_1.json");
        let pattern_str = pattern.to_string_lossy();

        let entries = glob::glob(&pattern_str)
            .map_err(|e| Error::Config(format!("invalid inbox path {:?}: {}", pattern, e)))?;

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let Some(folder) = entry
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
            else {
                continue;
            };

            let bytes = std::fs::read(&entry)?;
            let batch = decode_batch(&entry, &bytes)?;
            summaries.push(ConversationSummary {
                folder,
                title: batch.title,
                participants: batch.participants,
            });
        }

        summaries.sort_by(|a, b| a.folder.cmp(&b.folder));
        Ok(summaries)
    }
}
