//! Core types for aquarium sensor data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Identifier of an aquarium tank.
///
/// Tanks are numbered in the sensor log; the control panel refers to them
/// as `tank_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TankId(pub u32);

impl TankId {
    /// The tank number.
    #[must_use]
    pub fn number(self) -> u32 {
        self.0
    }
}

impl Default for TankId {
    fn default() -> Self {
        TankId(1)
    }
}

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tank_{}", self.0)
    }
}

impl FromStr for TankId {
    type Err = ParseError;

    /// Parse a tank selector.
    ///
    /// Accepts `tank_<n>` (the control panel value) as well as a bare number.
    ///
    /// ```
    /// use tankwatch_types::TankId;
    ///
    /// assert_eq!("tank_2".parse::<TankId>().unwrap(), TankId(2));
    /// assert_eq!("7".parse::<TankId>().unwrap(), TankId(7));
    /// assert!("tank_x".parse::<TankId>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed
            .strip_prefix("tank_")
            .unwrap_or(trimmed)
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidTank(s.to_string()))?;
        Ok(TankId(number))
    }
}

/// A single row of the sensor log.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorRecord {
    /// When the measurement was taken.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// Tank the sensor belongs to.
    pub tank_id: TankId,
    /// pH value.
    pub ph: f64,
    /// Water temperature in degrees Celsius.
    pub temperature: f64,
}

impl SensorRecord {
    /// Get the value of the given metric.
    #[must_use]
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Ph => self.ph,
            Metric::Temperature => self.temperature,
        }
    }
}

/// A plotted sensor quantity. Each metric owns one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Metric {
    /// Acidity of the water.
    Ph,
    /// Water temperature.
    Temperature,
}

impl Metric {
    /// All metrics in chart order.
    pub const ALL: [Metric; 2] = [Metric::Ph, Metric::Temperature];

    /// Identifier of the chart used in alert events.
    #[must_use]
    pub fn chart_id(self) -> &'static str {
        match self {
            Metric::Ph => "phAlert",
            Metric::Temperature => "tempAlert",
        }
    }

    /// Look up a metric from its alert chart identifier.
    #[must_use]
    pub fn from_chart_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.chart_id() == id)
    }

    /// Short machine name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Ph => "ph",
            Metric::Temperature => "temperature",
        }
    }

    /// Human-readable name used in chart titles.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Ph => "pH",
            Metric::Temperature => "Temperature",
        }
    }

    /// Series color used while data is present.
    #[must_use]
    pub fn color(self) -> SeriesColor {
        match self {
            Metric::Ph => SeriesColor::Red,
            Metric::Temperature => SeriesColor::Blue,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ph" => Ok(Metric::Ph),
            "temperature" | "temp" => Ok(Metric::Temperature),
            _ => Err(ParseError::InvalidMetric(s.to_string())),
        }
    }
}

/// Width of a resampling bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Granularity {
    /// One-minute buckets over the last hour.
    #[default]
    Minute,
    /// One-hour buckets over the last day.
    Hour,
    /// One-day buckets over the last 30 days.
    Day,
}

impl Granularity {
    /// All granularities in selector order.
    pub const ALL: [Granularity; 3] = [Granularity::Minute, Granularity::Hour, Granularity::Day];

    /// Number of buckets in a resampled series.
    ///
    /// ```
    /// use tankwatch_types::Granularity;
    ///
    /// assert_eq!(Granularity::Minute.bucket_count(), 60);
    /// assert_eq!(Granularity::Hour.bucket_count(), 24);
    /// assert_eq!(Granularity::Day.bucket_count(), 30);
    /// ```
    #[must_use]
    pub fn bucket_count(self) -> usize {
        match self {
            Granularity::Minute => 60,
            Granularity::Hour => 24,
            Granularity::Day => 30,
        }
    }

    /// Width of a single bucket.
    #[must_use]
    pub fn bucket_width(self) -> time::Duration {
        match self {
            Granularity::Minute => time::Duration::MINUTE,
            Granularity::Hour => time::Duration::HOUR,
            Granularity::Day => time::Duration::DAY,
        }
    }

    /// Selector value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" | "min" => Ok(Granularity::Minute),
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            _ => Err(ParseError::InvalidGranularity(s.to_string())),
        }
    }
}

/// How a bucket picks its value when several records fall into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FillStrategy {
    /// Earliest matching record in log order.
    #[default]
    First,
    /// Record closest to the bucket's target instant.
    Nearest,
    /// Arithmetic mean of all matching records.
    Average,
}

impl FillStrategy {
    /// Configuration value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FillStrategy::First => "first",
            FillStrategy::Nearest => "nearest",
            FillStrategy::Average => "average",
        }
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillStrategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(FillStrategy::First),
            "nearest" => Ok(FillStrategy::Nearest),
            "average" | "avg" | "mean" => Ok(FillStrategy::Average),
            _ => Err(ParseError::InvalidFill(s.to_string())),
        }
    }
}

/// Render color of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SeriesColor {
    Red,
    Blue,
    /// Neutral color used when there is no data to show.
    Grey,
}

impl SeriesColor {
    /// CSS color name.
    #[must_use]
    pub fn css(self) -> &'static str {
        match self {
            SeriesColor::Red => "red",
            SeriesColor::Blue => "blue",
            SeriesColor::Grey => "grey",
        }
    }
}

/// A fixed-length, labeled series ready for plotting.
///
/// `labels` and `values` always have the same length; `values[i]` is `None`
/// when no record fell into bucket `i`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Series {
    /// Metric this series plots.
    pub metric: Metric,
    /// Display name of the metric.
    pub metric_name: String,
    /// Bucket labels, oldest first.
    pub labels: Vec<String>,
    /// Bucket values, oldest first.
    pub values: Vec<Option<f64>>,
    /// Line color.
    pub color: SeriesColor,
}

impl Series {
    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the values that are present.
    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    /// Whether every bucket is absent.
    #[must_use]
    pub fn is_all_absent(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// The two draggable bars of a chart.
///
/// The bars are not ordered: either may be above the other. The effective
/// range is always `[min, max]` of the two.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdPair {
    pub low_bar: f64,
    pub high_bar: f64,
}

impl ThresholdPair {
    /// Create a pair from two bar values.
    #[must_use]
    pub fn new(low_bar: f64, high_bar: f64) -> Self {
        Self { low_bar, high_bar }
    }

    /// Bar values in iteration order.
    #[must_use]
    pub fn bars(&self) -> [f64; 2] {
        [self.low_bar, self.high_bar]
    }

    /// Get a bar by index. Index 0 is `low_bar`, anything else `high_bar`.
    #[must_use]
    pub fn bar(&self, index: usize) -> f64 {
        if index == 0 {
            self.low_bar
        } else {
            self.high_bar
        }
    }

    /// Set a bar by index.
    pub fn set_bar(&mut self, index: usize, value: f64) {
        if index == 0 {
            self.low_bar = value;
        } else {
            self.high_bar = value;
        }
    }

    /// Effective `(lo, hi)` range.
    ///
    /// ```
    /// use tankwatch_types::ThresholdPair;
    ///
    /// assert_eq!(ThresholdPair::new(8.0, 6.0).range(), (6.0, 8.0));
    /// ```
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (
            self.low_bar.min(self.high_bar),
            self.low_bar.max(self.high_bar),
        )
    }

    /// Whether a value lies inside the effective range (inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = self.range();
        value >= lo && value <= hi
    }
}

/// Combined alert state of the dashboard.
///
/// Derived by the alert aggregator; there is no public way to flip a single
/// flag in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlertState {
    ph_out_of_range: bool,
    temperature_out_of_range: bool,
}

impl AlertState {
    /// Build a state from per-metric flags.
    #[must_use]
    pub fn from_flags(ph_out_of_range: bool, temperature_out_of_range: bool) -> Self {
        Self {
            ph_out_of_range,
            temperature_out_of_range,
        }
    }

    #[must_use]
    pub fn ph_out_of_range(&self) -> bool {
        self.ph_out_of_range
    }

    #[must_use]
    pub fn temperature_out_of_range(&self) -> bool {
        self.temperature_out_of_range
    }

    /// Flag of a single metric.
    #[must_use]
    pub fn is_out_of_range(&self, metric: Metric) -> bool {
        match metric {
            Metric::Ph => self.ph_out_of_range,
            Metric::Temperature => self.temperature_out_of_range,
        }
    }

    /// Whether any chart is out of range.
    #[must_use]
    pub fn any(&self) -> bool {
        self.ph_out_of_range || self.temperature_out_of_range
    }

    /// Out-of-range metrics in chart order.
    #[must_use]
    pub fn out_of_range_metrics(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.is_out_of_range(*m))
            .collect()
    }
}

/// What the control panel currently selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selection {
    pub granularity: Granularity,
    pub tank_id: TankId,
}

impl Selection {
    #[must_use]
    pub fn new(granularity: Granularity, tank_id: TankId) -> Self {
        Self {
            granularity,
            tank_id,
        }
    }
}
