//! End-to-end analysis of one named conversation.
//!
//! ```text
//! Config ─► ArchiveSource ─► Vec<Conversation> ─► features ─► table ─► derive ─► Analysis
//! ```
//!
//! The pipeline only computes values. Drawing them is [`crate::render`]'s
//! job, so an [`Analysis`] can also be exported as JSON.

use crate::config::Config;
use crate::derive::{
    cumulative_difference, cumulative_sum, relative_frequency, running_average, top_k, Ranking,
};
use crate::error::{Error, Result};
use crate::features::{
    difference_inputs, ensure_self_participant, messages_per_day, messages_sent_to_others,
    reply_gaps, token_frequencies, watched_word_counts, words_per_day, words_per_message,
    DifferenceUnit, WatchList,
};
use crate::ingest::{load_conversations, ArchiveSource};
use crate::table::{align, align_all, AlignedTable, Series};
use crate::types::{Conversation, ConversationMode, Metric};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Computed value of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MetricValue {
    /// Date × participant table
    Table(AlignedTable),
    /// Single derived series
    Series(Series),
    /// Per-participant word ranking
    Ranking(Ranking),
    /// One table per tracked word
    PerWord(Vec<(String, AlignedTable)>),
}

impl MetricValue {
    /// First and last date on the value's axis, if it has one.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = match self {
            MetricValue::Table(table) => table.dates(),
            MetricValue::Series(series) => &series.dates,
            MetricValue::PerWord(tables) => tables.first()?.1.dates(),
            MetricValue::Ranking(_) => return None,
        };
        Some((*dates.first()?, *dates.last()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOutput {
    pub metric: Metric,
    pub value: MetricValue,
}

/// Everything computed for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub conversation: String,
    pub self_name: String,
    pub mode: ConversationMode,
    pub outputs: Vec<MetricOutput>,
}

impl Analysis {
    /// Output for a metric, if it was computed.
    pub fn output(&self, metric: Metric) -> Option<&MetricValue> {
        self.outputs
            .iter()
            .find(|o| o.metric == metric)
            .map(|o| &o.value)
    }

    /// Overall date span across every output.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.outputs
            .iter()
            .filter_map(|o| o.value.date_span())
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }
}

/// Runs analyses against one archive with one configuration.
pub struct Pipeline<S> {
    config: Config,
    source: S,
}

impl<S: ArchiveSource> Pipeline<S> {
    pub fn new(config: Config, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load and analyse a conversation from the configured table.
    ///
    /// `mode` overrides the configured layout.
    pub fn analyze(&self, name: &str, mode: Option<ConversationMode>) -> Result<Analysis> {
        let entry = self.config.conversation(name)?;
        let mode = mode.unwrap_or(entry.mode);

        let conversations = load_conversations(&self.source, &entry.folders)?;
        self.analyze_conversations(name, &conversations, mode)
    }

    /// Analyse already-loaded conversations.
    ///
    /// Self must take part in every conversation; this is checked before
    /// anything is accumulated.
    pub fn analyze_conversations(
        &self,
        name: &str,
        conversations: &[Conversation],
        mode: ConversationMode,
    ) -> Result<Analysis> {
        let self_name = self.config.self_name.as_str();
        ensure_self_participant(conversations, self_name)?;

        info!(
            conversation = name,
            %mode,
            conversations = conversations.len(),
            metrics = self.config.analysis.metrics.len(),
            "Analysing conversation"
        );

        let mut outputs = Vec::new();
        for &metric in &self.config.analysis.metrics {
            match self.compute(metric, conversations)? {
                Some(value) => {
                    debug!(%metric, "Computed metric");
                    outputs.push(MetricOutput { metric, value });
                }
                None => warn!(%metric, "Skipping metric with no watched word in use"),
            }
        }

        Ok(Analysis {
            conversation: name.to_string(),
            self_name: self_name.to_string(),
            mode,
            outputs,
        })
    }

    /// Compute one metric.
    ///
    /// Returns `None` for watch-list metrics whose list is empty or whose
    /// words never occur.
    pub fn compute(
        &self,
        metric: Metric,
        conversations: &[Conversation],
    ) -> Result<Option<MetricValue>> {
        let self_name = self.config.self_name.as_str();
        let analysis = &self.config.analysis;
        let label = metric.label();

        let value = match metric {
            Metric::MessagesPerDay => {
                MetricValue::Table(align(&messages_per_day(conversations), self_name, label)?)
            }
            Metric::WordsPerDay => {
                MetricValue::Table(align(&words_per_day(conversations), self_name, label)?)
            }
            Metric::MessageDifference | Metric::WordDifference => {
                let unit = if metric == Metric::MessageDifference {
                    DifferenceUnit::Messages
                } else {
                    DifferenceUnit::Words
                };
                let inputs = difference_inputs(conversations, self_name, unit, analysis.same_day)?;
                let table = align(&inputs, self_name, label)?;
                MetricValue::Series(cumulative_difference(&table, self_name)?)
            }
            Metric::WordsPerMessage => {
                let inputs = words_per_message(conversations, analysis.same_day);
                MetricValue::Table(running_average(&align(&inputs, self_name, label)?))
            }
            Metric::MessagesSentToOthers => {
                let sent = messages_sent_to_others(conversations, self_name)?;
                MetricValue::Table(cumulative_sum(&align(&sent, self_name, label)?))
            }
            Metric::ReplyGap => {
                MetricValue::Table(align(&reply_gaps(conversations), self_name, label)?)
            }
            Metric::CommonWords => {
                let ranking = top_k(&token_frequencies(conversations), self_name, analysis.top_k)?;
                if ranking.depth() == 0 {
                    return Err(Error::EmptyData {
                        metric: label.to_string(),
                    });
                }
                MetricValue::Ranking(ranking)
            }
            Metric::WordsOfInterest => {
                match self.word_shares(conversations, &analysis.words_of_interest, label)? {
                    Some(tables) => MetricValue::PerWord(tables),
                    None => return Ok(None),
                }
            }
            Metric::Pronouns => match self.word_shares(conversations, &analysis.pronouns, label)? {
                Some(tables) => MetricValue::PerWord(tables),
                None => return Ok(None),
            },
        };

        Ok(Some(value))
    }

    /// Relative usage share of each watched word.
    fn word_shares(
        &self,
        conversations: &[Conversation],
        words: &[String],
        label: &str,
    ) -> Result<Option<Vec<(String, AlignedTable)>>> {
        let watch = WatchList::new(words);
        if watch.is_empty() {
            return Ok(None);
        }

        let counts = watched_word_counts(conversations, &watch);
        if counts.iter().all(|(_, acc)| acc.is_empty()) {
            debug!(metric = label, words = ?watch.words(), "No watched word occurs");
            return Ok(None);
        }
        let accs: Vec<_> = counts.iter().map(|(_, acc)| acc).collect();
        let tables = align_all(&accs, &self.config.self_name, label)?;

        let named: Vec<(String, AlignedTable)> = counts
            .iter()
            .map(|(word, _)| word.clone())
            .zip(tables)
            .collect();
        relative_frequency(&named).map(Some)
    }
}
