//! Standalone terminal dashboard.
//!
//! Usage: `tankwatch-tui [SOURCE]`. The sensor log location is taken from
//! the argument, then `TANKWATCH_SOURCE`, then the config file. Setting
//! `TANKWATCH_UTC` reads naive timestamps and labels buckets in UTC.

use std::env;

use anyhow::{Context, Result};

use tankwatch_cli::config::{Config, resolve_offset, resolve_source};
use tankwatch_cli::tui;

fn main() -> Result<()> {
    // Read before the runtime spawns its worker threads
    let local_offset = resolve_offset(env::var_os("TANKWATCH_UTC").is_some());

    let config = Config::load();
    if config.log_file {
        tui::init_file_logging(&Config::log_path(), false)?;
    }

    let source = env::args()
        .nth(1)
        .or_else(|| env::var("TANKWATCH_SOURCE").ok().filter(|s| !s.is_empty()));
    let source = resolve_source(source, &config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(tui::run(tui::Options {
        config,
        source,
        local_offset,
    }))
}
