//! Core domain types for chatlens
//!
//! These types represent a chat export after it has been decoded from the
//! archive, plus the small enums that select what gets computed and how it is
//! laid out.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Message** | One sent item: sender, timestamp, optional text |
//! | **Batch** | One `message_<n>.json` document inside a conversation folder |
//! | **Conversation** | All batches of one folder merged: messages plus participant set |
//! | **Self** | The participant the analysis is written from; always charted last |
//! | **Metric** | One statistic rendered as one chart |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Messages and conversations
// ============================================

/// A single message from the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Display name of the sender
    pub sender: String,
    /// When the message was sent (absolute UTC, no timezone correction)
    pub sent_at: DateTime<Utc>,
    /// Text content; absent for stickers, photos, calls and similar
    pub content: Option<String>,
}

impl Message {
    /// Build a message from a millisecond epoch timestamp.
    ///
    /// Returns `None` if the timestamp is outside chrono's representable range.
    pub fn from_millis(
        sender: impl Into<String>,
        timestamp_ms: i64,
        content: Option<&str>,
    ) -> Option<Self> {
        Some(Self {
            sender: sender.into(),
            sent_at: DateTime::<Utc>::from_timestamp_millis(timestamp_ms)?,
            content: content.map(str::to_string),
        })
    }

    /// Calendar day the message was sent on (UTC).
    pub fn date(&self) -> NaiveDate {
        self.sent_at.date_naive()
    }

    /// Whitespace-separated word count, or `None` when there is no text.
    pub fn word_count(&self) -> Option<usize> {
        self.content
            .as_deref()
            .map(|text| text.split_whitespace().count())
    }
}

/// One decoded `message_<n>.json` document.
#[derive(Debug, Clone, Default)]
pub struct MessageBatch {
    /// Conversation title as stored in the export
    pub title: Option<String>,
    /// Participant names listed in this batch
    pub participants: Vec<String>,
    /// Messages in document order
    pub messages: Vec<Message>,
}

/// A conversation: every batch of one archive folder merged together.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Archive folder the conversation was read from
    pub folder: String,
    /// Conversation title (from the first batch that has one)
    pub title: Option<String>,
    /// Participant names, deduplicated, in first-seen order
    pub participants: Vec<String>,
    /// Messages in archive order
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation for a folder.
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            ..Default::default()
        }
    }

    /// Merge a batch into this conversation.
    pub fn absorb(&mut self, batch: MessageBatch) {
        if self.title.is_none() {
            self.title = batch.title;
        }
        for name in batch.participants {
            self.add_participant(name);
        }
        self.messages.extend(batch.messages);
    }

    /// Add a participant if not already present.
    pub fn add_participant(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.participants.contains(&name) {
            self.participants.push(name);
        }
    }

    /// Whether `name` is listed as a participant.
    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }

    /// Human-readable name for logs and errors.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.folder)
    }
}

/// Summary of a conversation folder, used for listing an export.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    /// Archive folder name
    pub folder: String,
    /// Title from the first batch
    pub title: Option<String>,
    /// Participants from the first batch
    pub participants: Vec<String>,
}

// ============================================
// Analysis selectors
// ============================================

/// Layout family for a conversation's charts.
///
/// The mode never changes what is computed, only how it is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
    /// One other participant: reflected dual-series charts
    #[default]
    Individual,
    /// Several participants: overlapping multi-series charts
    Group,
}

impl ConversationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Individual => "individual",
            ConversationMode::Group => "group",
        }
    }
}

impl std::fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "individual" => Ok(ConversationMode::Individual),
            "group" => Ok(ConversationMode::Group),
            _ => Err(format!("unknown conversation mode: {}", s)),
        }
    }
}

/// How several same-day values are combined for per-message metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameDayPolicy {
    /// Every message of the day contributes
    #[default]
    Sum,
    /// The last message scanned for a day replaces earlier ones
    Overwrite,
}

/// A statistic that the pipeline can compute and chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MessagesPerDay,
    WordsPerDay,
    MessageDifference,
    WordDifference,
    WordsPerMessage,
    MessagesSentToOthers,
    ReplyGap,
    CommonWords,
    WordsOfInterest,
    Pronouns,
}

impl Metric {
    /// Every metric, in rendering order.
    pub const ALL: [Metric; 10] = [
        Metric::MessagesPerDay,
        Metric::WordsPerDay,
        Metric::MessageDifference,
        Metric::WordDifference,
        Metric::WordsPerMessage,
        Metric::MessagesSentToOthers,
        Metric::ReplyGap,
        Metric::CommonWords,
        Metric::WordsOfInterest,
        Metric::Pronouns,
    ];

    /// Chart label; also the output file stem.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MessagesPerDay => "Number of Messages",
            Metric::WordsPerDay => "Number of Words",
            Metric::MessageDifference => "Cumulative Message Difference",
            Metric::WordDifference => "Cumulative Word Difference",
            Metric::WordsPerMessage => "Average Words per Message",
            Metric::MessagesSentToOthers => "Messages Sent to Others",
            Metric::ReplyGap => "Average Reply Gap (minutes)",
            Metric::CommonWords => "Most Common Words",
            Metric::WordsOfInterest => "Words of Interest",
            Metric::Pronouns => "Pronoun Usage",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_splits_on_whitespace() {
        let msg = Message::from_millis("Alice", 0, Some("hello world foo")).unwrap();
        assert_eq!(msg.word_count(), Some(3));

        let msg = Message::from_millis("Alice", 0, Some("  spaced   out\ttext ")).unwrap();
        assert_eq!(msg.word_count(), Some(3));

        let msg = Message::from_millis("Alice", 0, None).unwrap();
        assert_eq!(msg.word_count(), None);
    }

    #[test]
    fn test_date_truncates_in_utc() {
        // 2020-01-20T23:59:59.999Z
        let msg = Message::from_millis("Alice", 1_579_564_799_999, None).unwrap();
        assert_eq!(msg.date(), NaiveDate::from_ymd_opt(2020, 1, 20).unwrap());

        let msg = Message::from_millis("Alice", 1_579_564_800_000, None).unwrap();
        assert_eq!(msg.date(), NaiveDate::from_ymd_opt(2020, 1, 21).unwrap());
    }

    #[test]
    fn test_absorb_dedups_participants() {
        let mut conv = Conversation::new("alice_1");
        conv.absorb(MessageBatch {
            title: Some("Alice".to_string()),
            participants: vec!["Alice".to_string(), "Me".to_string()],
            messages: vec![],
        });
        conv.absorb(MessageBatch {
            title: Some("Ignored".to_string()),
            participants: vec!["Me".to_string(), "Bob".to_string()],
            messages: vec![],
        });

        assert_eq!(conv.participants, vec!["Alice", "Me", "Bob"]);
        assert_eq!(conv.display_name(), "Alice");
        assert!(conv.has_participant("Bob"));
    }

    #[test]
    fn test_conversation_mode_parse() {
        assert_eq!(
            "Group".parse::<ConversationMode>().unwrap(),
            ConversationMode::Group
        );
        assert!("channel".parse::<ConversationMode>().is_err());
    }
}
