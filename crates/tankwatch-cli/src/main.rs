mod cli;
mod commands;
mod format;
mod util;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

use tankwatch_cli::config::{Config, resolve_offset};

use cli::{Cli, Commands};
use commands::{CheckArgs, ResampleArgs, cmd_check, cmd_config, cmd_resample};
use format::FormatOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "tankwatch", &mut io::stdout());
        return Ok(());
    }

    // The local offset can only be read while the process is single-threaded,
    // so this runs before the runtime starts.
    let local_offset = resolve_offset(cli.utc);

    // The dashboard owns the terminal and sets up its own file logging
    if !cli.command.is_dashboard() {
        let filter = if cli.quiet {
            EnvFilter::new("warn")
        } else if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let config = Config::load_from(&config_path);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run(cli, config, config_path, local_offset))
}

async fn run(cli: Cli, config: Config, config_path: PathBuf, local_offset: UtcOffset) -> Result<()> {
    let opts = FormatOptions::new(cli.no_color).with_compact(cli.compact);
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Resample {
            source,
            selection,
            metric,
            format,
            no_header,
        } => {
            let opts = opts.with_no_header(no_header);
            cmd_resample(ResampleArgs {
                source: source.source,
                selection,
                metric,
                format,
                output,
                config: &config,
                local_offset,
                opts: &opts,
            })
            .await
        }
        Commands::Check {
            source,
            selection,
            ph_bars,
            temp_bars,
            locale,
        } => {
            cmd_check(CheckArgs {
                source: source.source,
                selection,
                ph_bars,
                temp_bars,
                locale,
                output,
                config: &config,
                local_offset,
                opts: &opts,
            })
            .await
        }
        #[cfg(feature = "tui")]
        Commands::Dashboard { source, log_file } => {
            use tankwatch_cli::config::resolve_source;
            use tankwatch_cli::tui;

            if log_file || config.log_file {
                tui::init_file_logging(&Config::log_path(), cli.verbose)?;
            }
            let source = resolve_source(source.source, &config);
            tui::run(tui::Options {
                config,
                source,
                local_offset,
            })
            .await
        }
        Commands::Config { action } => cmd_config(action, &config, &config_path, output),
        // Handled before the runtime starts
        Commands::Completions { .. } => Ok(()),
    }
}
