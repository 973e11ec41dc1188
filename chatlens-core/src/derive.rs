//! Derived metrics computed from aligned tables and token maps.
//!
//! These are pure functions. Division by zero yields NaN, which is allowed
//! only here; the renderer breaks lines at NaN points.

use crate::error::{Error, Result};
use crate::features::TokenCounts;
use crate::table::{AlignedTable, Series};
use serde::Serialize;
use std::collections::BTreeMap;

/// Default ranking length.
pub const DEFAULT_TOP_K: usize = 20;

fn cumulative(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |total, v| {
            *total += v;
            Some(*total)
        })
        .collect()
}

/// Running total of every column.
pub fn cumulative_sum(table: &AlignedTable) -> AlignedTable {
    table.map_columns(cumulative)
}

/// Self's cumulative value minus the mean cumulative value of everyone else.
///
/// With no other columns the mean is undefined and every point is NaN.
pub fn cumulative_difference(table: &AlignedTable, self_name: &str) -> Result<Series> {
    let self_index = table
        .column_index(self_name)
        .ok_or_else(|| Error::SelfNotParticipant {
            name: self_name.to_string(),
            context: "the table columns".to_string(),
        })?;

    let totals = cumulative_sum(table);
    let others: Vec<usize> = (0..totals.column_count())
        .filter(|&i| i != self_index)
        .collect();
    let mine = totals.column_at(self_index);

    let values = (0..totals.row_count())
        .map(|row| {
            let sum: f64 = others.iter().map(|&c| totals.column_at(c)[row]).sum();
            let mean = sum / others.len() as f64;
            mine[row] - mean
        })
        .collect();

    Ok(Series {
        name: self_name.to_string(),
        dates: table.dates().to_vec(),
        values,
    })
}

/// Expanding-window mean of every column.
pub fn running_average(table: &AlignedTable) -> AlignedTable {
    table.map_columns(|col| {
        cumulative(col)
            .into_iter()
            .enumerate()
            .map(|(i, total)| total / (i + 1) as f64)
            .collect()
    })
}

/// Share of each tracked word in a participant's cumulative tracked usage.
///
/// `tables` holds one aligned table per word, all on the same axes. Each
/// output cell is `cumsum(word) / Σ cumsum(all words)` for that participant
/// and date; a participant that has used none of the words yet gets NaN.
pub fn relative_frequency(
    tables: &[(String, AlignedTable)],
) -> Result<Vec<(String, AlignedTable)>> {
    let Some((_, first)) = tables.first() else {
        return Ok(Vec::new());
    };
    if let Some((word, _)) = tables.iter().find(|(_, t)| !t.same_shape(first)) {
        return Err(Error::ShapeMismatch(format!(
            "table for '{}' does not share the axes of '{}'",
            word, tables[0].0
        )));
    }

    let totals: Vec<AlignedTable> = tables.iter().map(|(_, t)| cumulative_sum(t)).collect();

    let denominators: Vec<Vec<f64>> = (0..first.column_count())
        .map(|c| {
            (0..first.row_count())
                .map(|r| totals.iter().map(|t| t.column_at(c)[r]).sum())
                .collect()
        })
        .collect();

    Ok(tables
        .iter()
        .zip(&totals)
        .map(|((word, _), total)| {
            let mut column = 0;
            let ratios = total.map_columns(|values| {
                let denominator = &denominators[column];
                column += 1;
                values
                    .iter()
                    .zip(denominator)
                    .map(|(v, d)| v / d)
                    .collect()
            });
            (word.clone(), ratios)
        })
        .collect())
}

/// One participant's ranked tokens with normalized frequencies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantRanking {
    pub participant: String,
    pub tokens: Vec<(String, f64)>,
}

/// Per-participant top tokens, others first and self last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub participants: Vec<ParticipantRanking>,
}

impl Ranking {
    /// Longest ranking across participants.
    pub fn depth(&self) -> usize {
        self.participants
            .iter()
            .map(|p| p.tokens.len())
            .max()
            .unwrap_or(0)
    }

    pub fn get(&self, participant: &str) -> Option<&ParticipantRanking> {
        self.participants
            .iter()
            .find(|p| p.participant == participant)
    }
}

/// Rank one participant's tokens.
///
/// Normalization runs over every token, the empty one included, before the
/// empty token is dropped. Ties keep first-seen order.
pub fn rank_tokens(counts: &TokenCounts, k: usize) -> Vec<(String, f64)> {
    let total = counts.total() as f64;
    let mut ranked: Vec<(String, f64)> = counts
        .iter()
        .filter(|(token, _)| !token.is_empty())
        .map(|(token, n)| (token.to_string(), n as f64 / total))
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

/// Top `k` tokens for every participant.
pub fn top_k(
    frequencies: &BTreeMap<String, TokenCounts>,
    self_name: &str,
    k: usize,
) -> Result<Ranking> {
    let columns = crate::table::order_columns(frequencies.keys().map(String::as_str), self_name)?;

    let participants = columns
        .into_iter()
        .map(|participant| {
            let tokens = frequencies
                .get(&participant)
                .map(|counts| rank_tokens(counts, k))
                .unwrap_or_default();
            ParticipantRanking {
                participant,
                tokens,
            }
        })
        .collect();

    Ok(Ranking { participants })
}
