//! Command-line interface and terminal dashboard for aquarium sensor logs.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `resample` | Print one resampled series |
//! | `check` | Evaluate thresholds and print alert events |
//! | `dashboard` | Interactive terminal dashboard |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Output Formats
//!
//! - **Text** (default): Human-readable colored output
//! - **JSON**: Machine-readable JSON format
//! - **CSV**: One `label,value` row per bucket
//!
//! # Configuration
//!
//! The CLI stores configuration in `~/.config/tankwatch/config.toml` (or
//! platform equivalent): sensor log source, banner locale, fill strategy,
//! notification policy, initial selection and per-chart axis and bars.
//!
//! # Environment Variables
//!
//! - `TANKWATCH_SOURCE`: Sensor log path or URL (overridden by `--source`)
//! - `NO_COLOR`: Disable colored output when set
//! - `TANKWATCH_UTC`: Use UTC instead of local time (`tankwatch-tui` only;
//!   the CLI takes `--utc`)
//!
//! # Examples
//!
//! ```bash
//! tankwatch resample --metric ph --tank tank_1 --granularity hour
//! tankwatch check --ph-bars 6.5,7.5 --source http://tank.local/sensor_Value.csv
//! tankwatch dashboard
//! ```

pub mod config;

// Re-export core dependencies for convenience
pub use tankwatch_core;
pub use tankwatch_types;

// TUI module - publicly exposed for tankwatch-tui crate to use
#[cfg(feature = "tui")]
pub mod tui;
