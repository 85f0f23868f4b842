//! # Tide Report Rendering
//!
//! Turns predictions into console text: an attribution line, the location the
//! data applies to, a table of high and low tides, a table of water heights,
//! and optionally an ASCII chart of the height curve.
//!
//! Renderers return `String`s; printing is left to the caller.

use crate::{Epoch, Sample, TideExtreme};
use chrono::{Local, TimeZone};
use std::fmt::{Display, Write};

/// Everything a console report shows.
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// Attribution required by the data provider, printed verbatim
    pub copyright: Option<String>,
    /// Coordinates the constituents apply to (latitude, longitude)
    pub location: Option<(f64, f64)>,
    /// Datum the heights are reported against
    pub datum: Option<String>,
    pub extremes: Vec<TideExtreme>,
    pub heights: Vec<Sample>,
}

/// Format a tide height with an explicit sign and centimetre precision.
fn format_tide_height(height: f64) -> String {
    format!("{:+.2}", height)
}

fn format_time<Tz: TimeZone>(t: Epoch, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    match t.to_datetime() {
        Some(dt) => dt.with_timezone(tz).format("%c").to_string(),
        None => t.to_string(),
    }
}

fn heading(title: &str, datum: Option<&str>) -> String {
    match datum {
        Some(d) => format!("{} ({}):", title, d),
        None => format!("{}:", title),
    }
}

/// Render the report in the local time zone.
pub fn render_report(report: &Report) -> String {
    render_report_in(report, &Local)
}

/// Render the report with times shown in `tz`.
pub fn render_report_in<Tz: TimeZone>(report: &Report, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut out = String::new();
    let datum = report.datum.as_deref();

    if let Some(copyright) = &report.copyright {
        let _ = writeln!(out, "{}", copyright);
    }
    if let Some((lat, lon)) = report.location {
        let _ = writeln!(out, "\nFor location: {:.6} {:.6}", lat, lon);
    }

    let _ = writeln!(out, "\n{}", heading("High and Low Tides", datum));
    if report.extremes.is_empty() {
        let _ = writeln!(out, "(none in window)");
    }
    for extreme in &report.extremes {
        let _ = writeln!(
            out,
            "{} {} {}",
            format_time(extreme.time, tz),
            format_tide_height(extreme.level()),
            extreme.kind()
        );
    }

    let _ = writeln!(out, "\n{}", heading("Water Heights", datum));
    for sample in &report.heights {
        let _ = writeln!(
            out,
            "{} {}",
            format_time(sample.time, tz),
            format_tide_height(sample.level())
        );
    }

    out
}

/// Render the height curve as an ASCII chart, one column per sample.
///
/// Highs are marked `H`, lows `L`, at the column nearest their time.
pub fn draw_ascii(samples: &[Sample], extremes: &[TideExtreme]) -> String {
    const ROWS: usize = 16;
    const Y_AXIS_WIDTH: usize = 7; // Space for Y-axis labels

    if samples.is_empty() {
        return String::new();
    }
    let sample_count = samples.len();

    let (min_height, max_height) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), s| {
            (min.min(s.level()), max.max(s.level()))
        });
    let range = max_height - min_height;

    let height_to_row = |height: f64| {
        if range.is_nan() || range <= 0.0 {
            return ROWS / 2;
        }
        let normalized = ((height - min_height) / range).clamp(0.0, 1.0);
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; sample_count + Y_AXIS_WIDTH]; ROWS];

    // Top, middle and bottom labels
    for height in [max_height, (max_height + min_height) / 2.0, min_height] {
        let row = height_to_row(height);
        let label = format!("{:>width$}", format_tide_height(height), width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    for (column, sample) in samples.iter().enumerate() {
        grid[height_to_row(sample.level())][column + Y_AXIS_WIDTH] = '•';
    }

    // Extremes overwrite the curve at the nearest sample column
    for extreme in extremes {
        let nearest = samples
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (a.time.secs() - extreme.time.secs()).abs();
                let db = (b.time.secs() - extreme.time.secs()).abs();
                da.total_cmp(&db)
            })
            .map(|(i, _)| i);
        if let Some(column) = nearest {
            let row = height_to_row(samples[column].level());
            grid[row][column + Y_AXIS_WIDTH] = if extreme.is_high { 'H' } else { 'L' };
        }
    }

    let mut out = String::new();
    for row in grid {
        let line: String = row.into_iter().collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}
