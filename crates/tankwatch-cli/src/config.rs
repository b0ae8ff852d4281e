//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::UtcOffset;

use tankwatch_core::threshold::AxisRange;
use tankwatch_core::{DashboardConfig, Locale, NotifyPolicy};
use tankwatch_types::{FillStrategy, Granularity, Metric, Selection, TankId, ThresholdPair};

/// Default location of the sensor log.
pub const DEFAULT_SOURCE: &str = "sensor_Value.csv";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Sensor log path or http(s) URL
    #[serde(default = "default_source")]
    pub source: String,

    /// Banner language
    #[serde(default)]
    pub locale: Locale,

    /// Bucket fill strategy
    #[serde(default)]
    pub fill: FillStrategy,

    /// When the alert sink is notified
    #[serde(default)]
    pub notify: NotifyPolicy,

    /// Initial granularity
    #[serde(default)]
    pub granularity: Granularity,

    /// Initial tank number
    #[serde(default = "default_tank")]
    pub tank: u32,

    /// Grab distance for threshold bars, in terminal rows
    #[serde(default = "default_drag_tolerance")]
    pub drag_tolerance: f64,

    /// Write terminal dashboard logs to a file
    #[serde(default)]
    pub log_file: bool,

    /// pH chart settings
    #[serde(default = "ChartSettings::ph")]
    pub ph: ChartSettings,

    /// Temperature chart settings
    #[serde(default = "ChartSettings::temperature")]
    pub temperature: ChartSettings,
}

/// Axis range and threshold bars of one chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartSettings {
    pub axis_min: f64,
    pub axis_max: f64,
    pub low_bar: f64,
    pub high_bar: f64,
}

impl ChartSettings {
    pub fn ph() -> Self {
        Self::for_metric(Metric::Ph)
    }

    pub fn temperature() -> Self {
        Self::for_metric(Metric::Temperature)
    }

    fn for_metric(metric: Metric) -> Self {
        let chart = tankwatch_core::ChartConfig::for_metric(metric);
        Self {
            axis_min: chart.axis.min,
            axis_max: chart.axis.max,
            low_bar: chart.bars.low_bar,
            high_bar: chart.bars.high_bar,
        }
    }

    pub fn bars(&self) -> ThresholdPair {
        ThresholdPair::new(self.low_bar, self.high_bar)
    }
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_tank() -> u32 {
    1
}

fn default_drag_tolerance() -> f64 {
    1.5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            locale: Locale::default(),
            fill: FillStrategy::default(),
            notify: NotifyPolicy::default(),
            granularity: Granularity::default(),
            tank: default_tank(),
            drag_tolerance: default_drag_tolerance(),
            log_file: false,
            ph: ChartSettings::ph(),
            temperature: ChartSettings::temperature(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tankwatch")
            .join("config.toml")
    }

    /// Path of the terminal dashboard log file
    pub fn log_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tankwatch")
            .join("tankwatch-tui.log")
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, or return default if missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn chart(&self, metric: Metric) -> &ChartSettings {
        match metric {
            Metric::Ph => &self.ph,
            Metric::Temperature => &self.temperature,
        }
    }

    /// Initial selection
    pub fn selection(&self) -> Selection {
        Selection::new(self.granularity, TankId(self.tank))
    }

    /// Dashboard configuration for these settings
    pub fn dashboard_config(&self) -> DashboardConfig {
        let mut config = DashboardConfig {
            selection: self.selection(),
            fill: self.fill,
            notify: self.notify,
            ..DashboardConfig::default()
        };
        for metric in Metric::ALL {
            let settings = self.chart(metric);
            let chart = config.chart_mut(metric);
            *chart = chart
                .with_axis(AxisRange::new(settings.axis_min, settings.axis_max))
                .with_bars(settings.bars())
                .with_tolerance(self.drag_tolerance);
        }
        config
    }
}

/// Resolve the sensor log location: explicit value (flag or env var) wins
/// over the config file.
pub fn resolve_source(source: Option<String>, config: &Config) -> String {
    source.unwrap_or_else(|| config.source.clone())
}

/// Offset used for naive timestamps and bucket labels.
///
/// Must be called before any extra threads are started; the platform's local
/// offset cannot be determined soundly once the process is multi-threaded.
pub fn resolve_offset(utc: bool) -> UtcOffset {
    if utc {
        return UtcOffset::UTC;
    }
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}
