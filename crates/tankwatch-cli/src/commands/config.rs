//! Config command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use tankwatch_cli::config::Config;

use crate::cli::ConfigAction;
use crate::util::write_output;

pub fn cmd_config(
    action: ConfigAction,
    config: &Config,
    path: &Path,
    output: Option<&PathBuf>,
) -> Result<()> {
    match action {
        ConfigAction::Path => write_output(output, &format!("{}\n", path.display())),
        ConfigAction::Show => {
            let content = toml::to_string_pretty(config)?;
            write_output(output, &content)
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {}\nUse --force to overwrite it.",
                    path.display()
                );
            }
            Config::default().save_to(path)?;
            eprintln!("Created config file: {}", path.display());
            Ok(())
        }
    }
}
