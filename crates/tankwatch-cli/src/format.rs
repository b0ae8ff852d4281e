//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use tankwatch_core::AlertEvent;
use tankwatch_types::{FillStrategy, Selection, Series, SeriesColor, ThresholdPair};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            ..Self::default()
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    fn paint(&self, text: &str, color: SeriesColor) -> String {
        if self.no_color {
            return text.to_string();
        }
        match color {
            SeriesColor::Red => text.red().to_string(),
            SeriesColor::Blue => text.blue().to_string(),
            SeriesColor::Grey => text.bright_black().to_string(),
        }
    }
}

/// Escape a string for CSV output.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ============================================================================
// Series formatting
// ============================================================================

/// Series plus the selection it was resampled for.
#[derive(Debug, Serialize)]
struct SeriesReport<'a> {
    tank: String,
    granularity: String,
    fill: FillStrategy,
    chart_id: &'a str,
    #[serde(flatten)]
    series: &'a Series,
}

/// Human-readable series: one bucket per line, values outside `bars` marked.
#[must_use]
pub fn format_series_text(
    series: &Series,
    selection: &Selection,
    bars: &ThresholdPair,
    opts: &FormatOptions,
) -> String {
    let (lo, hi) = bars.range();
    let header = format!(
        "{} for {} by {} (range {:.2}..{:.2})",
        series.metric_name, selection.tank_id, selection.granularity, lo, hi
    );
    let mut output = if opts.no_color {
        format!("{}\n\n", header)
    } else {
        format!("{}\n\n", header.bold())
    };

    if series.is_all_absent() {
        output.push_str("No records in this window.\n");
    }

    let width = series.labels.iter().map(String::len).max().unwrap_or(0);
    for (label, value) in series.labels.iter().zip(&series.values) {
        let cell = match value {
            Some(v) if bars.contains(*v) => opts.paint(&format!("{:>8.2}", v), series.color),
            Some(v) => {
                let text = format!("{:>8.2} !", v);
                if opts.no_color {
                    text
                } else {
                    text.red().bold().to_string()
                }
            }
            None => opts.paint(&format!("{:>8}", "-"), SeriesColor::Grey),
        };
        output.push_str(&format!("{:<width$}  {}\n", label, cell, width = width));
    }
    output
}

pub fn format_series_json(
    series: &Series,
    selection: &Selection,
    fill: FillStrategy,
    opts: &FormatOptions,
) -> Result<String> {
    let report = SeriesReport {
        tank: selection.tank_id.to_string(),
        granularity: selection.granularity.to_string(),
        fill,
        chart_id: series.metric.chart_id(),
        series,
    };
    opts.as_json(&report)
}

/// One `label,value` row per bucket; absent values are empty cells.
#[must_use]
pub fn format_series_csv(series: &Series, opts: &FormatOptions) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        format!("label,{}\n", series.metric.as_str())
    };
    for (label, value) in series.labels.iter().zip(&series.values) {
        output.push_str(&format!(
            "{},{}\n",
            csv_escape(label),
            value.map(|v| v.to_string()).unwrap_or_default()
        ));
    }
    output
}

// ============================================================================
// Alert formatting
// ============================================================================

/// Alert events as JSON lines, followed by the banner when it is visible.
pub fn format_check(
    events: &[AlertEvent],
    banner: Option<&str>,
    opts: &FormatOptions,
) -> Result<String> {
    let mut output = String::new();
    for event in events {
        output.push_str(&event.to_json()?);
        output.push('\n');
    }
    if let Some(text) = banner {
        if opts.no_color {
            output.push_str(text);
        } else {
            output.push_str(&text.white().on_red().bold().to_string());
        }
        output.push('\n');
    }
    Ok(output)
}
