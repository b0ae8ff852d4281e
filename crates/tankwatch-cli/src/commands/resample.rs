//! Resample command implementation.

use std::path::PathBuf;

use anyhow::Result;
use time::UtcOffset;
use tracing::debug;

use tankwatch_cli::config::{Config, resolve_source};
use tankwatch_core::Resampler;
use tankwatch_types::Metric;

use crate::cli::{OutputFormat, SelectionArgs};
use crate::format::{FormatOptions, format_series_csv, format_series_json, format_series_text};
use crate::util::{load_store, reference_time, write_output};

/// Arguments for the resample command.
pub struct ResampleArgs<'a> {
    pub source: Option<String>,
    pub selection: SelectionArgs,
    pub metric: Metric,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub config: &'a Config,
    pub local_offset: UtcOffset,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_resample(args: ResampleArgs<'_>) -> Result<()> {
    let ResampleArgs {
        source,
        selection,
        metric,
        format,
        output,
        config,
        local_offset,
        opts,
    } = args;

    let location = resolve_source(source, config);
    let store = load_store(&location, local_offset).await?;

    let fill = selection.fill(config);
    let now = reference_time(selection.now, local_offset);
    let selection = selection.selection(config);
    debug!("Resampling {} at {} with {} fill", metric, now, fill);

    let records = store.snapshot();
    let series = Resampler::new(&records)
        .with_fill(fill)
        .resample_selection(metric, &selection, now);

    let content = match format {
        OutputFormat::Json => format_series_json(&series, &selection, fill, opts)?,
        OutputFormat::Text => {
            format_series_text(&series, &selection, &config.chart(metric).bars(), opts)
        }
        OutputFormat::Csv => format_series_csv(&series, opts),
    };

    write_output(output, &content)?;
    Ok(())
}
