//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use tankwatch_core::{Source, Store, ingest};
use tankwatch_types::ThresholdPair;

/// Parse the `--now` reference time.
pub fn parse_now(s: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(s.trim(), &Rfc3339).map_err(|_| {
        format!(
            "Invalid time '{}'. Use RFC 3339 (e.g., 2025-01-01T10:00:00Z)",
            s
        )
    })
}

/// Parse a `lo,hi` pair of threshold bars.
///
/// The bars keep their order; either may be the larger one.
pub fn parse_bars(s: &str) -> Result<ThresholdPair, String> {
    let invalid = || format!("Invalid bars '{}'. Use two numbers: lo,hi", s);
    let (low, high) = s.split_once(',').ok_or_else(invalid)?;
    let low: f64 = low.trim().parse().map_err(|_| invalid())?;
    let high: f64 = high.trim().parse().map_err(|_| invalid())?;
    if !low.is_finite() || !high.is_finite() {
        return Err(invalid());
    }
    Ok(ThresholdPair::new(low, high))
}

/// Reference time for a command, expressed in the local offset.
pub fn reference_time(now: Option<OffsetDateTime>, local_offset: UtcOffset) -> OffsetDateTime {
    now.unwrap_or_else(OffsetDateTime::now_utc)
        .to_offset(local_offset)
}

/// Load the sensor log at `location` into a new store.
///
/// One-shot commands fail when the log cannot be loaded; only the dashboard
/// keeps running on an empty store.
pub async fn load_store(location: &str, local_offset: UtcOffset) -> Result<Arc<Store>> {
    let source = Source::parse(location);
    let transport = source
        .transport()
        .with_context(|| format!("Cannot read sensor log from {}", source))?;
    let store = Arc::new(Store::new());
    ingest::ingest(&store, transport.as_ref(), local_offset)
        .await
        .with_context(|| format!("Failed to load sensor log from {}", source))?;
    Ok(store)
}

pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
