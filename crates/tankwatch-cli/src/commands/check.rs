//! Check command implementation.
//!
//! Runs one full refresh and prints what a host page would receive: one
//! alert event per chart, then the banner text when any chart is out of
//! range.

use std::path::PathBuf;

use anyhow::Result;
use time::UtcOffset;
use tracing::debug;

use tankwatch_cli::config::{Config, resolve_source};
use tankwatch_core::{Dashboard, Locale, MemorySink, SharedBanner};
use tankwatch_types::{Metric, ThresholdPair};

use crate::cli::SelectionArgs;
use crate::format::{FormatOptions, format_check};
use crate::util::{load_store, reference_time, write_output};

/// Arguments for the check command.
pub struct CheckArgs<'a> {
    pub source: Option<String>,
    pub selection: SelectionArgs,
    pub ph_bars: Option<ThresholdPair>,
    pub temp_bars: Option<ThresholdPair>,
    pub locale: Option<Locale>,
    pub output: Option<&'a PathBuf>,
    pub config: &'a Config,
    pub local_offset: UtcOffset,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_check(args: CheckArgs<'_>) -> Result<()> {
    let CheckArgs {
        source,
        selection,
        ph_bars,
        temp_bars,
        locale,
        output,
        config,
        local_offset,
        opts,
    } = args;

    let location = resolve_source(source, config);
    let store = load_store(&location, local_offset).await?;

    let mut dashboard_config = config.dashboard_config();
    dashboard_config.selection = selection.selection(config);
    dashboard_config.fill = selection.fill(config);
    for (metric, bars) in [(Metric::Ph, ph_bars), (Metric::Temperature, temp_bars)] {
        if let Some(bars) = bars {
            let chart = dashboard_config.chart_mut(metric);
            *chart = chart.with_bars(bars);
        }
    }

    let sink = MemorySink::new();
    let banner = SharedBanner::new(locale.unwrap_or(config.locale));
    let mut dashboard = Dashboard::new(store, dashboard_config, Box::new(sink.clone()))
        .with_observer(Box::new(banner.clone()));

    let now = reference_time(selection.now, local_offset);
    let state = dashboard.refresh(now);
    debug!("Alert state after refresh: {:?}", state);

    let banner = banner.get();
    let text = banner.is_visible().then(|| banner.text());
    let content = format_check(&sink.events(), text, opts)?;

    write_output(output, &content)?;
    Ok(())
}
