//! Per-participant, per-day accumulation

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Participant → date → accumulator.
///
/// Participants can be seeded without any dates so that everyone listed in a
/// conversation gets a column later, even if they never sent a qualifying
/// message. An absent date means "unobserved"; zeros are only introduced at
/// alignment time.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulation<A> {
    participants: BTreeMap<String, BTreeMap<NaiveDate, A>>,
}

impl<A> Default for Accumulation<A> {
    fn default() -> Self {
        Self {
            participants: BTreeMap::new(),
        }
    }
}

impl<A> Accumulation<A> {
    /// Create an empty accumulation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulation with the given participants and no dates.
    pub fn with_participants<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut acc = Self::new();
        for name in names {
            acc.seed(name);
        }
        acc
    }

    /// Make sure `name` has an (initially empty) entry.
    pub fn seed(&mut self, name: impl Into<String>) {
        self.participants.entry(name.into()).or_default();
    }

    /// Mutable bucket for a participant and date, created with the zero value.
    pub fn bucket_mut(&mut self, participant: &str, date: NaiveDate) -> &mut A
    where
        A: Default,
    {
        self.participants
            .entry(participant.to_string())
            .or_default()
            .entry(date)
            .or_default()
    }

    /// Replace the value of a bucket.
    pub fn set(&mut self, participant: &str, date: NaiveDate, value: A) {
        self.participants
            .entry(participant.to_string())
            .or_default()
            .insert(date, value);
    }

    /// Value of a bucket, if observed.
    pub fn get(&self, participant: &str, date: NaiveDate) -> Option<&A> {
        self.participants.get(participant)?.get(&date)
    }

    /// Participant names in sorted order.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.participants.keys().map(String::as_str)
    }

    /// Whether `name` has an entry (seeded or observed).
    pub fn contains(&self, name: &str) -> bool {
        self.participants.contains_key(name)
    }

    /// Earliest and latest observed date across every participant.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self
            .participants
            .values()
            .filter_map(|days| days.keys().next())
            .min()?;
        let last = self
            .participants
            .values()
            .filter_map(|days| days.keys().next_back())
            .max()?;
        Some((*first, *last))
    }

    /// True when no participant has any observed date.
    pub fn is_empty(&self) -> bool {
        self.participants.values().all(BTreeMap::is_empty)
    }

    /// Convert every bucket, keeping participants and dates.
    pub fn map<B>(self, mut f: impl FnMut(A) -> B) -> Accumulation<B> {
        Accumulation {
            participants: self
                .participants
                .into_iter()
                .map(|(name, days)| {
                    let days = days.into_iter().map(|(d, v)| (d, f(v))).collect();
                    (name, days)
                })
                .collect(),
        }
    }
}

impl Accumulation<f64> {
    /// Add `amount` to a bucket.
    pub fn add(&mut self, participant: &str, date: NaiveDate, amount: f64) {
        *self.bucket_mut(participant, date) += amount;
    }
}

/// Running sum and count, reduced to a mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanBucket {
    pub sum: f64,
    pub count: u32,
}

impl MeanBucket {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of the pushed values; NaN when nothing was pushed.
    pub fn mean(&self) -> f64 {
        self.sum / f64::from(self.count)
    }
}
