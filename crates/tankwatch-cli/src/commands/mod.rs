//! Command implementations for the CLI.

mod check;
mod config;
mod resample;

pub use check::{CheckArgs, cmd_check};
pub use config::cmd_config;
pub use resample::{ResampleArgs, cmd_resample};
