//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use time::OffsetDateTime;

use tankwatch_cli::config::Config;
use tankwatch_core::Locale;
use tankwatch_types::{FillStrategy, Granularity, Metric, Selection, TankId, ThresholdPair};

use crate::util::{parse_bars, parse_now};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Where the sensor log comes from
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Sensor log path or http(s) URL, or use TANKWATCH_SOURCE env var
    #[arg(short, long, env = "TANKWATCH_SOURCE")]
    pub source: Option<String>,
}

/// Reusable selection arguments; unset values come from the config file
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Tank selector (tank_<n> or a bare number)
    #[arg(short, long)]
    pub tank: Option<TankId>,

    /// Bucket granularity (minute, hour, day)
    #[arg(short, long)]
    pub granularity: Option<Granularity>,

    /// How a bucket with several records is reduced (first, nearest, average)
    #[arg(long)]
    pub fill: Option<FillStrategy>,

    /// Reference time in RFC 3339 (defaults to the current time)
    #[arg(long, value_parser = parse_now)]
    pub now: Option<OffsetDateTime>,
}

impl SelectionArgs {
    /// Selection with explicit flags overriding the config file.
    pub fn selection(&self, config: &Config) -> Selection {
        let initial = config.selection();
        Selection::new(
            self.granularity.unwrap_or(initial.granularity),
            self.tank.unwrap_or(initial.tank_id),
        )
    }

    pub fn fill(&self, config: &Config) -> FillStrategy {
        self.fill.unwrap_or(config.fill)
    }
}

#[derive(Parser)]
#[command(name = "tankwatch")]
#[command(author, version, about = "Aquarium sensor log charts, thresholds and alerts", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Read naive timestamps and label buckets in UTC instead of local time
    #[arg(long, global = true)]
    pub utc: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resampled series of one metric
    Resample {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Metric to resample (ph, temperature)
        #[arg(short, long, default_value = "ph")]
        metric: Metric,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Omit header row in CSV output (useful for appending)
        #[arg(long)]
        no_header: bool,
    },

    /// Evaluate both charts and print their alert events
    Check {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// pH threshold bars as lo,hi
        #[arg(long, value_parser = parse_bars)]
        ph_bars: Option<ThresholdPair>,

        /// Temperature threshold bars as lo,hi
        #[arg(long, value_parser = parse_bars)]
        temp_bars: Option<ThresholdPair>,

        /// Banner language (en, ko)
        #[arg(long)]
        locale: Option<Locale>,
    },

    /// Launch interactive terminal dashboard
    #[cfg(feature = "tui")]
    Dashboard {
        #[command(flatten)]
        source: SourceArgs,

        /// Write logs to the tankwatch-tui.log file in the data directory
        #[arg(long)]
        log_file: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Whether this command takes over the terminal.
    pub fn is_dashboard(&self) -> bool {
        #[cfg(feature = "tui")]
        if let Commands::Dashboard { .. } = self {
            return true;
        }
        false
    }
}

/// Configuration subcommands
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Show the effective configuration
    Show,

    /// Initialize default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
