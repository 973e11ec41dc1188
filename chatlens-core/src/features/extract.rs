//! Metric extractors
//!
//! Each extractor scans every message of every conversation exactly once and
//! produces an accumulation keyed by participant and UTC day. Extractors never
//! align or zero-fill; that is the table layer's job.

use super::accumulation::{Accumulation, MeanBucket};
use super::tokenize::{tokenize, TokenCounts, WatchList};
use crate::error::{Error, Result};
use crate::types::{Conversation, SameDayPolicy};
use std::collections::BTreeMap;

/// Which quantity a difference metric tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceUnit {
    Messages,
    Words,
}

/// Fail unless `self_name` is a participant of every conversation.
pub fn ensure_self_participant(conversations: &[Conversation], self_name: &str) -> Result<()> {
    for conversation in conversations {
        if !conversation.has_participant(self_name) {
            return Err(Error::SelfNotParticipant {
                name: self_name.to_string(),
                context: format!("conversation '{}'", conversation.display_name()),
            });
        }
    }
    Ok(())
}

/// Every participant listed in any conversation, with no dates yet.
fn seeded<A>(conversations: &[Conversation]) -> Accumulation<A> {
    Accumulation::with_participants(
        conversations
            .iter()
            .flat_map(|c| c.participants.iter().map(String::as_str)),
    )
}

/// Messages sent per participant per day.
pub fn messages_per_day(conversations: &[Conversation]) -> Accumulation<f64> {
    let mut acc: Accumulation<f64> = seeded(conversations);
    for message in conversations.iter().flat_map(|c| &c.messages) {
        acc.add(&message.sender, message.date(), 1.0);
    }
    acc
}

/// Words sent per participant per day. Messages without text are skipped.
pub fn words_per_day(conversations: &[Conversation]) -> Accumulation<f64> {
    let mut acc: Accumulation<f64> = seeded(conversations);
    for message in conversations.iter().flat_map(|c| &c.messages) {
        if let Some(words) = message.word_count() {
            acc.add(&message.sender, message.date(), words as f64);
        }
    }
    acc
}

/// Raw per-day inputs for a cumulative difference metric.
///
/// Values are not pre-accumulated; the derived layer sums them over time.
/// With [`SameDayPolicy::Overwrite`] only the last scanned message of a day
/// is kept.
pub fn difference_inputs(
    conversations: &[Conversation],
    self_name: &str,
    unit: DifferenceUnit,
    policy: SameDayPolicy,
) -> Result<Accumulation<f64>> {
    ensure_self_participant(conversations, self_name)?;

    let mut acc: Accumulation<f64> = seeded(conversations);
    for message in conversations.iter().flat_map(|c| &c.messages) {
        let value = match unit {
            DifferenceUnit::Messages => 1.0,
            DifferenceUnit::Words => match message.word_count() {
                Some(words) => words as f64,
                None => continue,
            },
        };
        match policy {
            SameDayPolicy::Sum => acc.add(&message.sender, message.date(), value),
            SameDayPolicy::Overwrite => acc.set(&message.sender, message.date(), value),
        }
    }
    Ok(acc)
}

/// Per-day words-per-message value, input to the running average.
///
/// [`SameDayPolicy::Sum`] gives the day's mean words per message.
/// [`SameDayPolicy::Overwrite`] keeps the word count of the last scanned
/// message of the day.
pub fn words_per_message(
    conversations: &[Conversation],
    policy: SameDayPolicy,
) -> Accumulation<f64> {
    let mut acc: Accumulation<MeanBucket> = seeded(conversations);
    for message in conversations.iter().flat_map(|c| &c.messages) {
        let Some(words) = message.word_count() else {
            continue;
        };
        match policy {
            SameDayPolicy::Sum => acc
                .bucket_mut(&message.sender, message.date())
                .push(words as f64),
            SameDayPolicy::Overwrite => acc.set(
                &message.sender,
                message.date(),
                MeanBucket {
                    sum: words as f64,
                    count: 1,
                },
            ),
        }
    }
    acc.map(|bucket| bucket.mean())
}

/// Messages self sent, credited to each recipient.
///
/// A message from self in a conversation with N other participants adds one
/// to each of those N participants for that day. Self is never credited.
pub fn messages_sent_to_others(
    conversations: &[Conversation],
    self_name: &str,
) -> Result<Accumulation<f64>> {
    ensure_self_participant(conversations, self_name)?;

    let mut acc: Accumulation<f64> = seeded(conversations);
    for conversation in conversations {
        let recipients: Vec<&str> = conversation
            .participants
            .iter()
            .map(String::as_str)
            .filter(|p| *p != self_name)
            .collect();

        for message in conversation.messages.iter().filter(|m| m.sender == self_name) {
            let date = message.date();
            for recipient in &recipients {
                acc.add(recipient, date, 1.0);
            }
        }
    }
    Ok(acc)
}

/// Mean minutes a participant took to answer someone else, per day.
///
/// Messages are ordered by timestamp within each conversation. A message
/// counts as a reply when its sender differs from the previous message's
/// sender; the gap is credited to the replier on the reply's date.
pub fn reply_gaps(conversations: &[Conversation]) -> Accumulation<f64> {
    let mut acc: Accumulation<MeanBucket> = seeded(conversations);
    for conversation in conversations {
        let mut ordered: Vec<_> = conversation.messages.iter().collect();
        ordered.sort_by_key(|m| m.sent_at);

        for pair in ordered.windows(2) {
            let (previous, reply) = (pair[0], pair[1]);
            if previous.sender == reply.sender {
                continue;
            }
            let minutes = (reply.sent_at - previous.sent_at).num_milliseconds() as f64 / 60_000.0;
            acc.bucket_mut(&reply.sender, reply.date()).push(minutes);
        }
    }
    acc.map(|bucket| bucket.mean())
}

/// Open-vocabulary word frequencies per participant.
///
/// Every listed participant gets an entry, possibly empty.
pub fn token_frequencies(conversations: &[Conversation]) -> BTreeMap<String, TokenCounts> {
    let mut freqs: BTreeMap<String, TokenCounts> = conversations
        .iter()
        .flat_map(|c| c.participants.iter())
        .map(|p| (p.clone(), TokenCounts::new()))
        .collect();

    for message in conversations.iter().flat_map(|c| &c.messages) {
        let Some(text) = message.content.as_deref() else {
            continue;
        };
        let counts = freqs.entry(message.sender.clone()).or_default();
        for token in tokenize(text) {
            counts.add(&token);
        }
    }
    freqs
}

/// Per-day usage counts of each watched word.
///
/// Returns one accumulation per watched word, in watch-list order.
pub fn watched_word_counts(
    conversations: &[Conversation],
    watch: &WatchList,
) -> Vec<(String, Accumulation<f64>)> {
    let mut per_word: Vec<Accumulation<f64>> =
        watch.words().iter().map(|_| seeded(conversations)).collect();

    for message in conversations.iter().flat_map(|c| &c.messages) {
        let Some(text) = message.content.as_deref() else {
            continue;
        };
        for token in tokenize(text) {
            if let Some(i) = watch.position(&token) {
                per_word[i].add(&message.sender, message.date(), 1.0);
            }
        }
    }

    watch.words().iter().cloned().zip(per_word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use chrono::NaiveDate;

    const DAY_MS: i64 = 86_400_000;
    // 2020-01-01T00:00:00Z
    const D1: i64 = 1_577_836_800_000;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn msg(sender: &str, ms: i64, content: Option<&str>) -> Message {
        Message::from_millis(sender, ms, content).unwrap()
    }

    fn conversation(participants: &[&str], messages: Vec<Message>) -> Conversation {
        let mut conv = Conversation::new("test");
        for p in participants {
            conv.add_participant(*p);
        }
        conv.messages = messages;
        conv
    }

    #[test]
    fn test_messages_per_day_counts_textless_messages() {
        let conv = conversation(
            &["Alice", "Me"],
            vec![
                msg("Alice", D1, Some("hi")),
                msg("Alice", D1 + 1000, None),
                msg("Me", D1 + 2 * DAY_MS, Some("hey")),
            ],
        );

        let acc = messages_per_day(&[conv]);
        assert_eq!(acc.get("Alice", day(0)), Some(&2.0));
        assert_eq!(acc.get("Me", day(2)), Some(&1.0));
        assert_eq!(acc.get("Me", day(1)), None);
    }

    #[test]
    fn test_words_per_day() {
        let conv = conversation(
            &["Alice", "Me"],
            vec![
                msg("Alice", D1, Some("hello world foo")),
                msg("Alice", D1 + 1000, None),
                msg("Alice", D1 + 2000, Some("again")),
            ],
        );

        let acc = words_per_day(&[conv]);
        assert_eq!(acc.get("Alice", day(0)), Some(&4.0));
        assert!(acc.contains("Me"));
        assert_eq!(acc.get("Me", day(0)), None);
    }

    #[test]
    fn test_single_message_word_count() {
        let conv = conversation(&["Alice"], vec![msg("Alice", D1, Some("hello world foo"))]);
        let acc = words_per_day(&[conv]);
        assert_eq!(acc.get("Alice", day(0)), Some(&3.0));
    }

    #[test]
    fn test_difference_inputs_policies() {
        let conv = conversation(
            &["Alice", "Me"],
            vec![
                msg("Me", D1, Some("one two")),
                msg("Me", D1 + 1000, Some("three")),
            ],
        );
        let convs = [conv];

        let summed =
            difference_inputs(&convs, "Me", DifferenceUnit::Words, SameDayPolicy::Sum).unwrap();
        assert_eq!(summed.get("Me", day(0)), Some(&3.0));

        let last =
            difference_inputs(&convs, "Me", DifferenceUnit::Words, SameDayPolicy::Overwrite)
                .unwrap();
        assert_eq!(last.get("Me", day(0)), Some(&1.0));

        let messages =
            difference_inputs(&convs, "Me", DifferenceUnit::Messages, SameDayPolicy::Sum)
                .unwrap();
        assert_eq!(messages.get("Me", day(0)), Some(&2.0));
    }

    #[test]
    fn test_self_absent_fails_before_accumulating() {
        let conv = conversation(&["Alice", "Bob"], vec![msg("Alice", D1, Some("hi"))]);
        let convs = [conv];

        let err = messages_sent_to_others(&convs, "Me").unwrap_err();
        assert!(matches!(err, Error::SelfNotParticipant { .. }));

        let err = difference_inputs(&convs, "Me", DifferenceUnit::Messages, SameDayPolicy::Sum)
            .unwrap_err();
        assert!(matches!(err, Error::SelfNotParticipant { .. }));
    }

    #[test]
    fn test_words_per_message_policies() {
        let conv = conversation(
            &["Alice"],
            vec![
                msg("Alice", D1, Some("a b c d")),
                msg("Alice", D1 + 1000, Some("e e")),
                msg("Alice", D1 + 2000, None),
            ],
        );
        let convs = [conv];

        let mean = words_per_message(&convs, SameDayPolicy::Sum);
        assert_eq!(mean.get("Alice", day(0)), Some(&3.0));

        let last = words_per_message(&convs, SameDayPolicy::Overwrite);
        assert_eq!(last.get("Alice", day(0)), Some(&2.0));
    }

    #[test]
    fn test_sent_to_others_fans_out() {
        let conv = conversation(
            &["Me", "Alice", "Bob", "Carol"],
            vec![
                msg("Me", D1, Some("hello all")),
                msg("Alice", D1 + 1000, Some("hi")),
            ],
        );

        let acc = messages_sent_to_others(&[conv], "Me").unwrap();
        for other in ["Alice", "Bob", "Carol"] {
            assert_eq!(acc.get(other, day(0)), Some(&1.0), "{other}");
        }
        assert_eq!(acc.get("Me", day(0)), None);
        assert!(acc.contains("Me"));
    }

    #[test]
    fn test_reply_gaps() {
        let conv = conversation(
            &["Alice", "Me"],
            // Archive order is newest first.
            vec![
                msg("Me", D1 + 30 * 60_000, Some("late reply")),
                msg("Alice", D1 + 10 * 60_000, Some("follow up")),
                msg("Alice", D1, Some("question")),
            ],
        );

        let acc = reply_gaps(&[conv]);
        assert_eq!(acc.get("Me", day(0)), Some(&20.0));
        assert_eq!(acc.get("Alice", day(0)), None);
    }

    #[test]
    fn test_token_frequencies() {
        let conv = conversation(
            &["Alice", "Me"],
            vec![
                msg("Alice", D1, Some("Hi hi, there!")),
                msg("Alice", D1 + 1000, Some("?")),
            ],
        );

        let freqs = token_frequencies(&[conv]);
        let alice = &freqs["Alice"];
        assert_eq!(alice.get("hi"), 2);
        assert_eq!(alice.get("there"), 1);
        assert_eq!(alice.get(""), 1);
        assert!(freqs["Me"].is_empty());
    }

    #[test]
    fn test_watched_word_counts() {
        let conv = conversation(
            &["Alice", "Me"],
            vec![
                msg("Alice", D1, Some("I think you said I")),
                msg("Me", D1 + DAY_MS, Some("You!")),
            ],
        );
        let watch = WatchList::new(["i", "you"]);

        let counts = watched_word_counts(&[conv], &watch);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].0, "i");
        assert_eq!(counts[0].1.get("Alice", day(0)), Some(&2.0));
        assert_eq!(counts[1].1.get("Alice", day(0)), Some(&1.0));
        assert_eq!(counts[1].1.get("Me", day(1)), Some(&1.0));
        assert_eq!(counts[0].1.get("Me", day(1)), None);
    }
}
