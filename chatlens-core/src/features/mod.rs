//! Feature extraction
//!
//! Turns conversations into sparse per-participant, per-day accumulations.
//!
//! ```text
//! Conversation(s) ──► extractor ──► Accumulation<f64>      (per-day values)
//!                              └──► BTreeMap<_, TokenCounts> (word rankings)
//! ```
//!
//! Dates are UTC calendar days derived from the message timestamp with no
//! timezone correction.

mod accumulation;
mod extract;
mod tokenize;

pub use accumulation::{Accumulation, MeanBucket};
pub use extract::{
    difference_inputs, ensure_self_participant, messages_per_day, messages_sent_to_others,
    reply_gaps, token_frequencies, watched_word_counts, words_per_day, words_per_message,
    DifferenceUnit,
};
pub use tokenize::{normalize_token, tokenize, TokenCounts, WatchList};
