//! Series alignment
//!
//! Converts sparse accumulations into dense, date-indexed tables.
//!
//! ## Layout
//!
//! - Rows: every calendar day from the earliest to the latest observed date,
//!   inclusive, even days where nobody was active.
//! - Columns: every participant. Others are sorted case-insensitively, self
//!   is always the last column.
//! - Cells: the observed value, or `0.0` when unobserved.
//!
//! Alignment depends only on participant names and dates, so it is
//! deterministic regardless of the order participants were accumulated in.

use crate::error::{Error, Result};
use crate::features::Accumulation;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

/// A dense date × participant table.
///
/// Values are stored column-major: `values[c][r]` is participant `c` on
/// `dates[r]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl AlignedTable {
    /// Build a table from parts.
    ///
    /// Every column must have one value per date.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} column names for {} columns",
                columns.len(),
                values.len()
            )));
        }
        if let Some(bad) = values.iter().position(|col| col.len() != dates.len()) {
            return Err(Error::ShapeMismatch(format!(
                "column '{}' has {} values for {} dates",
                columns[bad],
                values[bad].len(),
                dates.len()
            )));
        }
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    /// Row labels.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column labels (self last).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of a column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name).map(|i| self.values[i].as_slice())
    }

    /// Column values by position.
    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    /// Value for a participant on a date.
    pub fn get(&self, date: NaiveDate, name: &str) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.column(name).map(|col| col[row])
    }

    /// Same axes, each column transformed independently.
    pub fn map_columns(&self, mut f: impl FnMut(&[f64]) -> Vec<f64>) -> Self {
        Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|col| f(col)).collect(),
        }
    }

    /// Whether two tables share dates and columns.
    pub fn same_shape(&self, other: &AlignedTable) -> bool {
        self.dates == other.dates && self.columns == other.columns
    }

    /// Table without one column.
    pub fn without_column(&self, name: &str) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| self.columns[i] != name)
            .collect();
        Self {
            dates: self.dates.clone(),
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            values: keep.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }

    /// Run alignment again over this table's own cells.
    ///
    /// On a table produced by [`align`] this returns an identical table.
    pub fn realign(&self, self_name: &str) -> Result<AlignedTable> {
        let mut acc = Accumulation::with_participants(self.columns.iter().map(String::as_str));
        for (name, col) in self.columns.iter().zip(&self.values) {
            for (date, value) in self.dates.iter().zip(col) {
                acc.set(name, *date, *value);
            }
        }
        align(&acc, self_name, "realigned table")
    }
}

/// A single derived date-indexed series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

/// Case-insensitive column order with self relocated to the end.
///
/// Names that compare equal ignoring case fall back to a case-sensitive
/// comparison so the order is total.
pub fn order_columns<'a, I>(names: I, self_name: &str) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut others: Vec<String> = Vec::new();
    let mut found_self = false;

    for name in names {
        if name == self_name {
            found_self = true;
        } else if !others.iter().any(|o| o == name) {
            others.push(name.to_string());
        }
    }

    if !found_self {
        return Err(Error::SelfNotParticipant {
            name: self_name.to_string(),
            context: "the table columns".to_string(),
        });
    }

    others.sort_by(|a, b| compare_case_insensitive(a, b));
    others.push(self_name.to_string());
    Ok(others)
}

fn compare_case_insensitive(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Contiguous day range covering every observation of every accumulation.
fn date_axis<'a>(accs: impl IntoIterator<Item = &'a Accumulation<f64>>) -> Option<Vec<NaiveDate>> {
    let (first, last) = accs
        .into_iter()
        .filter_map(Accumulation::date_range)
        .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))?;

    Some(first.iter_days().take_while(|d| *d <= last).collect())
}

fn fill(acc: &Accumulation<f64>, dates: &[NaiveDate], columns: &[String]) -> AlignedTable {
    let values = columns
        .iter()
        .map(|name| {
            dates
                .iter()
                .map(|date| acc.get(name, *date).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    AlignedTable {
        dates: dates.to_vec(),
        columns: columns.to_vec(),
        values,
    }
}

/// Align one accumulation into a dense table.
///
/// `metric` names the statistic in the empty-data error.
pub fn align(acc: &Accumulation<f64>, self_name: &str, metric: &str) -> Result<AlignedTable> {
    let dates = date_axis([acc]).ok_or_else(|| Error::EmptyData {
        metric: metric.to_string(),
    })?;
    let columns = order_columns(acc.participants(), self_name)?;
    Ok(fill(acc, &dates, &columns))
}

/// Align several accumulations onto one shared date axis and column set.
///
/// The axis spans every accumulation; the columns are the union of their
/// participants. Output order follows input order.
pub fn align_all(
    accs: &[&Accumulation<f64>],
    self_name: &str,
    metric: &str,
) -> Result<Vec<AlignedTable>> {
    let dates = date_axis(accs.iter().copied()).ok_or_else(|| Error::EmptyData {
        metric: metric.to_string(),
    })?;
    let columns = order_columns(accs.iter().flat_map(|acc| acc.participants()), self_name)?;

    Ok(accs
        .iter()
        .map(|acc| fill(acc, &dates, &columns))
        .collect())
}
