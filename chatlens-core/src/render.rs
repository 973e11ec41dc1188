//! Chart rendering
//!
//! Draws finished tables, series and rankings as SVG files with `plotters`.
//! Nothing here computes metrics; the renderer only lays out values it is
//! handed.
//!
//! ## Layouts
//!
//! | Layout | Used for |
//! |--------|----------|
//! | [`Layout::Reflected`] | per-participant tables in individual mode; self is drawn negated |
//! | [`Layout::Overlapping`] | per-participant tables in group mode, one line per column |
//! | [`Layout::Stacked`] | cumulative messages sent to others in group mode |
//! | [`Layout::Series`] | single derived series |
//! | [`Layout::Bars`] | top-K word rankings |
//!
//! The x axis of time charts is a day offset from the first date. NaN values
//! break a line instead of being drawn.

use crate::derive::Ranking;
use crate::error::{Error, Result};
use crate::format::{file_stem, format_axis_value, format_date_span};
use crate::pipeline::{Analysis, MetricOutput, MetricValue};
use crate::table::{AlignedTable, Series};
use crate::types::{ConversationMode, Metric};
use chrono::{Duration, NaiveDate};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type PlotResult = std::result::Result<(), DrawingAreaErrorKind<std::io::Error>>;
type TimeChart<'a, 'b> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const DARK_BLUE: RGBColor = RGBColor(0, 0, 139);
const TOMATO: RGBColor = RGBColor(255, 99, 71);
const FONT: &str = "sans-serif";

/// `n` colours linearly interpolated from dark blue to tomato.
pub fn palette(n: usize) -> Vec<RGBColor> {
    let lerp =
        |a: u8, b: u8, t: f64| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            RGBColor(
                lerp(DARK_BLUE.0, TOMATO.0, t),
                lerp(DARK_BLUE.1, TOMATO.1, t),
                lerp(DARK_BLUE.2, TOMATO.2, t),
            )
        })
        .collect()
}

/// Chart layout for one metric output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Reflected,
    Overlapping,
    Stacked,
    Series,
    Bars,
}

impl Layout {
    /// Pick the layout for a metric value in the given mode.
    pub fn choose(metric: Metric, value: &MetricValue, mode: ConversationMode) -> Self {
        match value {
            MetricValue::Series(_) => Layout::Series,
            MetricValue::Ranking(_) => Layout::Bars,
            MetricValue::Table(_) if metric == Metric::MessagesSentToOthers => match mode {
                ConversationMode::Individual => Layout::Overlapping,
                ConversationMode::Group => Layout::Stacked,
            },
            MetricValue::Table(_) | MetricValue::PerWord(_) => match mode {
                ConversationMode::Individual => Layout::Reflected,
                ConversationMode::Group => Layout::Overlapping,
            },
        }
    }
}

/// Split values into finite runs of `(x, y)` points.
fn finite_runs(values: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        if v.is_finite() {
            current.push((i as f64, *v));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Min and max of the finite values, padded so the range is never empty.
fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let pad = ((hi - lo) * 0.05).max(f64::EPSILON);
    if hi - lo < f64::EPSILON {
        lo - 1.0..hi + 1.0
    } else {
        lo - pad..hi + pad
    }
}

fn x_range(rows: usize) -> Range<f64> {
    0.0..(rows.saturating_sub(1).max(1)) as f64
}

fn date_label(dates: &[NaiveDate], x: f64) -> String {
    match dates.first() {
        Some(first) => (*first + Duration::days(x.round() as i64))
            .format("%Y-%m-%d")
            .to_string(),
        None => String::new(),
    }
}

fn draw_line(
    chart: &mut TimeChart<'_, '_>,
    values: &[f64],
    name: &str,
    color: RGBColor,
) -> PlotResult {
    for (i, run) in finite_runs(values).into_iter().enumerate() {
        let line = LineSeries::new(run, color.stroke_width(2));
        if i > 0 {
            chart.draw_series(line)?;
            continue;
        }
        // Only the first run gets a legend entry
        chart.draw_series(line)?.label(name).legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
        });
    }
    Ok(())
}

/// Writes one SVG per metric into an output directory.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    output_dir: PathBuf,
    title: String,
    size: (u32, u32),
}

impl ChartRenderer {
    /// Renderer writing into `output_dir` with charts captioned `title`.
    pub fn new(output_dir: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            title: title.into(),
            size: (1200, 500),
        }
    }

    /// Render every output of an analysis. Creates the output directory.
    pub fn render(&self, analysis: &Analysis) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;

        let mut written = Vec::new();
        for output in &analysis.outputs {
            let paths = self.render_output(output, analysis.mode, &analysis.self_name)?;
            info!(
                metric = %output.metric,
                files = paths.len(),
                "Rendered chart"
            );
            written.extend(paths);
        }
        Ok(written)
    }

    /// Render a single metric output.
    pub fn render_output(
        &self,
        output: &MetricOutput,
        mode: ConversationMode,
        self_name: &str,
    ) -> Result<Vec<PathBuf>> {
        let label = output.metric.label();
        let layout = Layout::choose(output.metric, &output.value, mode);
        debug!(metric = %output.metric, ?layout, "Choosing layout");

        match &output.value {
            MetricValue::Table(table) => Ok(vec![self.render_table(
                layout,
                output.metric,
                table,
                label,
                self_name,
            )?]),
            MetricValue::Series(series) => Ok(vec![self.series(series, label)?]),
            MetricValue::Ranking(ranking) => Ok(vec![self.bars(ranking, label)?]),
            MetricValue::PerWord(tables) => tables
                .iter()
                .map(|(word, table)| {
                    let name = format!("{} - {}", label, word);
                    self.render_table(layout, output.metric, table, &name, self_name)
                })
                .collect(),
        }
    }

    fn render_table(
        &self,
        layout: Layout,
        metric: Metric,
        table: &AlignedTable,
        name: &str,
        self_name: &str,
    ) -> Result<PathBuf> {
        let y_label = metric.label();
        // Self never receives its own messages.
        let owned;
        let table = if metric == Metric::MessagesSentToOthers {
            owned = table.without_column(self_name);
            &owned
        } else {
            table
        };

        match layout {
            Layout::Reflected => self.reflected(table, name, y_label, self_name),
            Layout::Stacked => self.stacked(table, name, y_label),
            _ => self.overlapping(table, name, y_label),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.svg", file_stem(name)))
    }

    fn caption(&self, dates: &[NaiveDate]) -> String {
        match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => {
                format!("{} ({})", self.title, format_date_span(*first, *last))
            }
            _ => self.title.clone(),
        }
    }

    fn draw_svg<F>(&self, path: &Path, draw: F) -> Result<()>
    where
        F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> PlotResult,
    {
        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)
            .and_then(|_| draw(&root))
            .and_then(|_| root.present())
            .map_err(|e| Error::Render(format!("{}: {}", path.display(), e)))
    }

    /// Shared frame of every date-indexed chart: caption, date axis, grid
    /// and legend around whatever `body` draws.
    fn time_chart<F>(
        &self,
        path: &Path,
        y_label: &str,
        dates: &[NaiveDate],
        y_range: Range<f64>,
        abs_ticks: bool,
        legend: bool,
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut TimeChart<'_, '_>) -> PlotResult,
    {
        let caption = self.caption(dates);
        self.draw_svg(path, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(&caption, (FONT, 22))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(x_range(dates.len()), y_range)?;

            let x_fmt = |x: &f64| date_label(dates, *x);
            let y_fmt = |y: &f64| {
                if abs_ticks {
                    format_axis_value(y.abs())
                } else {
                    format_axis_value(*y)
                }
            };
            chart
                .configure_mesh()
                .x_desc("Date")
                .y_desc(y_label)
                .x_labels(8)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .draw()?;

            body(&mut chart)?;

            if legend {
                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperLeft)
                    .background_style(&WHITE.mix(0.85))
                    .border_style(&BLACK)
                    .draw()?;
            }
            Ok(())
        })
    }

    /// Others above the axis, self reflected below it. The y axis is
    /// symmetric and labelled with absolute values.
    pub fn reflected(
        &self,
        table: &AlignedTable,
        name: &str,
        y_label: &str,
        self_name: &str,
    ) -> Result<PathBuf> {
        let self_index = table
            .column_index(self_name)
            .ok_or_else(|| Error::SelfNotParticipant {
                name: self_name.to_string(),
                context: format!("chart '{}'", name),
            })?;

        let reflected: Vec<f64> = table.column_at(self_index).iter().map(|v| -v).collect();
        let bound = (0..table.column_count())
            .flat_map(|c| table.column_at(c).iter())
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |m, v| m.max(v.abs()));
        let bound = if bound > 0.0 { bound * 1.05 } else { 1.0 };

        let colors = palette(table.column_count());
        let path = self.path_for(name);
        self.time_chart(&path, y_label, table.dates(), -bound..bound, true, true, |chart| {
            for c in (0..table.column_count()).filter(|&c| c != self_index) {
                draw_line(chart, table.column_at(c), &table.columns()[c], colors[c])?;
            }
            draw_line(chart, &reflected, self_name, TOMATO)
        })?;
        Ok(path)
    }

    /// One line per column.
    pub fn overlapping(&self, table: &AlignedTable, name: &str, y_label: &str) -> Result<PathBuf> {
        let colors = palette(table.column_count());
        let y_range =
            value_range((0..table.column_count()).flat_map(|c| table.column_at(c).iter()));
        let path = self.path_for(name);
        self.time_chart(&path, y_label, table.dates(), y_range, false, true, |chart| {
            for (c, column) in table.columns().iter().enumerate() {
                draw_line(chart, table.column_at(c), column, colors[c])?;
            }
            Ok(())
        })?;
        Ok(path)
    }

    /// Columns stacked as filled areas, first column at the bottom.
    pub fn stacked(&self, table: &AlignedTable, name: &str, y_label: &str) -> Result<PathBuf> {
        let mut tops: Vec<Vec<f64>> = Vec::with_capacity(table.column_count());
        for c in 0..table.column_count() {
            let layer: Vec<f64> = table
                .column_at(c)
                .iter()
                .enumerate()
                .map(|(r, v)| {
                    let below = tops.last().map_or(0.0, |prev| prev[r]);
                    below + if v.is_finite() { *v } else { 0.0 }
                })
                .collect();
            tops.push(layer);
        }

        let y_range = value_range(tops.iter().flatten());
        let colors = palette(table.column_count());
        let path = self.path_for(name);
        self.time_chart(&path, y_label, table.dates(), y_range, false, true, |chart| {
            // Tallest layer first so lower layers paint over it.
            for c in (0..tops.len()).rev() {
                let color = colors[c];
                let points: Vec<(f64, f64)> = tops[c]
                    .iter()
                    .enumerate()
                    .map(|(r, v)| (r as f64, *v))
                    .collect();
                chart
                    .draw_series(
                        AreaSeries::new(points, 0.0, color.mix(0.9).filled())
                            .border_style(color.stroke_width(1)),
                    )?
                    .label(table.columns()[c].as_str())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                    });
            }
            Ok(())
        })?;
        Ok(path)
    }

    /// A single line.
    pub fn series(&self, series: &Series, name: &str) -> Result<PathBuf> {
        let y_range = value_range(series.values.iter());
        let path = self.path_for(name);
        self.time_chart(&path, name, &series.dates, y_range, false, false, |chart| {
            draw_line(chart, &series.values, &series.name, DARK_BLUE)
        })?;
        Ok(path)
    }

    /// Grouped bars: one group per rank, one bar per participant, each bar
    /// annotated with its token.
    pub fn bars(&self, ranking: &Ranking, name: &str) -> Result<PathBuf> {
        let depth = ranking.depth().max(1);
        let groups = ranking.participants.len().max(1);
        let width = 0.9 / groups as f64;
        let top = ranking
            .participants
            .iter()
            .flat_map(|p| p.tokens.iter().map(|(_, f)| *f))
            .filter(|f| f.is_finite())
            .fold(0.0_f64, f64::max);
        let top = if top > 0.0 { top * 1.15 } else { 1.0 };

        let colors = palette(ranking.participants.len());
        let path = self.path_for(name);
        let title = self.title.clone();
        self.draw_svg(&path, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(&title, (FONT, 22))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(0.0..depth as f64, 0.0..top)?;

            let x_fmt = |x: &f64| format!("{}", x.floor() as i64 + 1);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(name)
                .y_desc("Relative Frequency")
                .x_labels(depth.min(20))
                .x_label_formatter(&x_fmt)
                .draw()?;

            let annotation = TextStyle::from((FONT, 8).into_font())
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            for (i, participant) in ranking.participants.iter().enumerate() {
                let color = colors[i];
                let offset = 0.05 + width * i as f64;
                let tokens = participant.tokens.iter().enumerate();
                chart
                    .draw_series(tokens.clone().map(|(rank, (_, freq))| {
                        let x0 = rank as f64 + offset;
                        Rectangle::new([(x0, 0.0), (x0 + width, *freq)], color.filled())
                    }))?
                    .label(participant.participant.as_str())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                    });

                chart.draw_series(tokens.map(|(rank, (token, freq))| {
                    let x = rank as f64 + offset + width / 2.0;
                    Text::new(token.clone(), (x, *freq), annotation.clone())
                }))?;
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.85))
                .border_style(&BLACK)
                .draw()?;
            Ok(())
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::ParticipantRanking;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn two_person_table() -> AlignedTable {
        AlignedTable::from_columns(
            vec![day(1), day(2), day(3)],
            vec!["Alice".to_string(), "Me".to_string()],
            vec![vec![1.0, 0.0, 2.0], vec![0.0, 3.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_palette_endpoints() {
        let colors = palette(3);
        assert_eq!(colors[0], DARK_BLUE);
        assert_eq!(colors[2], TOMATO);
        assert_eq!(palette(1), vec![DARK_BLUE]);
        assert!(palette(0).is_empty());
    }

    #[test]
    fn test_finite_runs_split_on_nan() {
        let runs = finite_runs(&[1.0, f64::NAN, 2.0, 3.0, f64::NAN]);
        assert_eq!(runs, vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]);
        assert!(finite_runs(&[f64::NAN]).is_empty());
    }

    #[test]
    fn test_value_range_never_empty() {
        let r = value_range([0.0, 0.0].iter());
        assert!(r.start < r.end);
        let r = value_range([f64::NAN].iter());
        assert!(r.start < r.end);
    }

    #[test]
    fn test_layout_choice() {
        let table = MetricValue::Table(two_person_table());
        assert_eq!(
            Layout::choose(Metric::MessagesPerDay, &table, ConversationMode::Individual),
            Layout::Reflected
        );
        assert_eq!(
            Layout::choose(Metric::MessagesPerDay, &table, ConversationMode::Group),
            Layout::Overlapping
        );
        assert_eq!(
            Layout::choose(Metric::MessagesSentToOthers, &table, ConversationMode::Group),
            Layout::Stacked
        );
    }

    #[test]
    fn test_reflected_writes_svg() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), "Analysis of Test");
        let path = renderer
            .reflected(&two_person_table(), "Number of Messages", "Number of Messages", "Me")
            .unwrap();

        assert_eq!(path, dir.path().join("Number of Messages.svg"));
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Alice"));
    }

    #[test]
    fn test_series_with_nan_renders() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), "t");
        let series = Series {
            name: "Me".to_string(),
            dates: vec![day(1), day(2)],
            values: vec![f64::NAN, f64::NAN],
        };
        let path = renderer.series(&series, "Cumulative Word Difference").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_split_line_has_one_legend_entry() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), "t");
        let table = AlignedTable::from_columns(
            vec![day(1), day(2), day(3), day(4)],
            vec!["Zoltan".to_string(), "Me".to_string()],
            vec![vec![1.0, f64::NAN, 2.0, 3.0], vec![0.5, 0.5, 0.5, 0.5]],
        )
        .unwrap();

        let path = renderer.overlapping(&table, "Share", "Share").unwrap();
        let svg = fs::read_to_string(path).unwrap();
        assert_eq!(svg.matches("Zoltan").count(), 1);
    }

    #[test]
    fn test_stacked_and_bars_render() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), "t");
        assert!(renderer
            .stacked(&two_person_table(), "Messages Sent to Others", "Messages")
            .unwrap()
            .exists());

        let ranking = Ranking {
            participants: vec![
                ParticipantRanking {
                    participant: "Alice".to_string(),
                    tokens: vec![("hi".to_string(), 0.6), ("yo".to_string(), 0.4)],
                },
                ParticipantRanking {
                    participant: "Me".to_string(),
                    tokens: vec![("ok".to_string(), 1.0)],
                },
            ],
        };
        let path = renderer.bars(&ranking, "Most Common Words").unwrap();
        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.contains("hi"));
    }

    #[test]
    fn test_reflected_requires_self() {
        let dir = TempDir::new().unwrap();
        let renderer = ChartRenderer::new(dir.path(), "t");
        assert!(matches!(
            renderer.reflected(&two_person_table(), "x", "x", "Nobody"),
            Err(Error::SelfNotParticipant { .. })
        ));
    }
}
