//! Time-bucket resampling of the sensor log.
//!
//! A resample turns the irregular, time-sorted sensor log into a fixed number
//! of labeled buckets ending at `now`:
//!
//! | Granularity | Buckets | Anchor | Label |
//! |-------------|---------|--------|-------|
//! | minute | 60 | start of the minute | `HH:MM` |
//! | hour | 24 | top of the hour | `HH:00` |
//! | day | 30 | local midnight | `M/D` |
//!
//! "Local" is the offset carried by `now`. Record timestamps are compared as
//! instants, so their own offsets do not matter.
//!
//! A record belongs to bucket `i` when its timestamp lies in
//! `[start_i, start_i + width)`. For minute buckets this is the same as
//! sharing the bucket's year, month, day, hour and minute. Buckets are
//! contiguous, so each record is assigned with one subtraction and the whole
//! resample is a single pass over the log.
//!
//! # Example
//!
//! ```
//! use tankwatch_core::Resampler;
//! use tankwatch_types::{Granularity, Metric, SensorRecord, TankId};
//! use time::macros::datetime;
//!
//! let records = [SensorRecord {
//!     timestamp: datetime!(2025-01-01 10:00:00 UTC),
//!     tank_id: TankId(1),
//!     ph: 7.0,
//!     temperature: 25.0,
//! }];
//! let series = Resampler::new(&records).resample(
//!     Metric::Ph,
//!     TankId(1),
//!     Granularity::Minute,
//!     datetime!(2025-01-01 10:00:30 UTC),
//! );
//! assert_eq!(series.labels[59], "10:00");
//! assert_eq!(series.values[59], Some(7.0));
//! assert_eq!(series.present_values().count(), 1);
//! ```

use time::macros::format_description;
use time::{Duration, OffsetDateTime, Time};
use tracing::debug;

use tankwatch_types::{
    FillStrategy, Granularity, Metric, Selection, SensorRecord, Series, SeriesColor, TankId,
};

/// The contiguous bucket grid of one resample.
///
/// Every bucket uses the UTC offset carried by `now`. Day buckets are
/// therefore a fixed 24 hours wide and start at midnight in that offset; a
/// daylight-saving change inside the window shifts the older buckets by the
/// size of the change instead of re-anchoring each day at its own midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPlan {
    granularity: Granularity,
    now: OffsetDateTime,
    origin: OffsetDateTime,
}

impl BucketPlan {
    /// Build the grid of `granularity` buckets ending at `now`.
    pub fn new(granularity: Granularity, now: OffsetDateTime) -> Self {
        let newest = truncate(now, granularity);
        let span = granularity.bucket_width() * (granularity.bucket_count() as i32 - 1);
        Self {
            granularity,
            now,
            origin: newest - span,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.granularity.bucket_count()
    }

    /// Always false: every granularity has at least one bucket.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start of bucket `index` (0 is the oldest).
    pub fn bucket_start(&self, index: usize) -> OffsetDateTime {
        self.origin + self.granularity.bucket_width() * index as i32
    }

    /// Instant bucket `index` was derived from by walking back from `now`.
    pub fn target(&self, index: usize) -> OffsetDateTime {
        let steps_back = (self.len() - 1 - index) as i32;
        self.now - self.granularity.bucket_width() * steps_back
    }

    /// Bucket index of a timestamp, if it falls inside the grid.
    pub fn index_of(&self, timestamp: OffsetDateTime) -> Option<usize> {
        let offset = timestamp - self.origin;
        if offset.is_negative() {
            return None;
        }
        let index = offset.whole_nanoseconds() / self.granularity.bucket_width().whole_nanoseconds();
        usize::try_from(index).ok().filter(|i| *i < self.len())
    }

    /// Display label of bucket `index`.
    pub fn label(&self, index: usize) -> String {
        let start = self.bucket_start(index);
        match self.granularity {
            Granularity::Minute => start
                .format(format_description!("[hour]:[minute]"))
                .unwrap_or_else(|_| format!("{:02}:{:02}", start.hour(), start.minute())),
            Granularity::Hour => format!("{:02}:00", start.hour()),
            Granularity::Day => format!("{}/{}", u8::from(start.month()), start.day()),
        }
    }

    /// All labels, oldest first.
    pub fn labels(&self) -> Vec<String> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }
}

/// Truncate to the start of the enclosing bucket in the timestamp's own offset.
fn truncate(ts: OffsetDateTime, granularity: Granularity) -> OffsetDateTime {
    let time = ts.time();
    let sub_minute =
        Duration::seconds(i64::from(time.second())) + Duration::nanoseconds(i64::from(time.nanosecond()));
    match granularity {
        Granularity::Minute => ts - sub_minute,
        Granularity::Hour => ts - Duration::minutes(i64::from(time.minute())) - sub_minute,
        Granularity::Day => ts.replace_time(Time::MIDNIGHT),
    }
}

/// Per-bucket accumulator for the fill strategies.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    first: Option<f64>,
    nearest: Option<(Duration, f64)>,
    sum: f64,
    count: u32,
}

impl Slot {
    fn push(&mut self, value: f64, distance: Duration) {
        if self.first.is_none() {
            self.first = Some(value);
        }
        // Strict `<` keeps the earlier record on ties.
        match self.nearest {
            Some((best, _)) if distance >= best => {}
            _ => self.nearest = Some((distance, value)),
        }
        self.sum += value;
        self.count += 1;
    }

    fn value(&self, fill: FillStrategy) -> Option<f64> {
        match fill {
            FillStrategy::First => self.first,
            FillStrategy::Nearest => self.nearest.map(|(_, v)| v),
            FillStrategy::Average => (self.count > 0).then(|| self.sum / f64::from(self.count)),
        }
    }
}

/// Resamples a borrowed, time-sorted record slice.
///
/// The resampler never mutates the store or the selection it is given.
#[derive(Debug, Clone, Copy)]
pub struct Resampler<'a> {
    records: &'a [SensorRecord],
    fill: FillStrategy,
}

impl<'a> Resampler<'a> {
    /// Create a resampler over time-sorted records with first-match fill.
    pub fn new(records: &'a [SensorRecord]) -> Self {
        Self {
            records,
            fill: FillStrategy::default(),
        }
    }

    /// Use a different fill strategy.
    pub fn with_fill(mut self, fill: FillStrategy) -> Self {
        self.fill = fill;
        self
    }

    /// Resample one metric of one tank.
    ///
    /// An empty log is valid input: the series has the usual labels, every
    /// value is absent and the color is neutral.
    pub fn resample(
        &self,
        metric: Metric,
        tank_id: TankId,
        granularity: Granularity,
        now: OffsetDateTime,
    ) -> Series {
        let plan = BucketPlan::new(granularity, now);
        let mut slots = vec![Slot::default(); plan.len()];

        let mut matched = 0usize;
        for record in self.records.iter().filter(|r| r.tank_id == tank_id) {
            if let Some(index) = plan.index_of(record.timestamp) {
                let distance = (record.timestamp - plan.target(index)).abs();
                slots[index].push(record.value(metric), distance);
                matched += 1;
            }
        }

        let values: Vec<Option<f64>> = slots.iter().map(|s| s.value(self.fill)).collect();
        debug!(
            "Resampled {} for {} by {}: {} records in window, {} buckets filled",
            metric,
            tank_id,
            granularity,
            matched,
            values.iter().filter(|v| v.is_some()).count()
        );

        Series {
            metric,
            metric_name: metric.display_name().to_string(),
            labels: plan.labels(),
            values,
            color: if self.records.is_empty() {
                SeriesColor::Grey
            } else {
                metric.color()
            },
        }
    }

    /// Resample one metric for the current selection.
    pub fn resample_selection(
        &self,
        metric: Metric,
        selection: &Selection,
        now: OffsetDateTime,
    ) -> Series {
        self.resample(metric, selection.tank_id, selection.granularity, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn rec(ts: OffsetDateTime, tank: u32, ph: f64) -> SensorRecord {
        SensorRecord {
            timestamp: ts,
            tank_id: TankId(tank),
            ph,
            temperature: ph * 3.0,
        }
    }

    #[test]
    fn test_bucket_counts() {
        let now = datetime!(2025-03-10 12:34:56 UTC);
        for g in Granularity::ALL {
            let series = Resampler::new(&[]).resample(Metric::Ph, TankId(1), g, now);
            assert_eq!(series.labels.len(), g.bucket_count());
            assert_eq!(series.values.len(), g.bucket_count());
        }
    }

    #[test]
    fn test_minute_scenario() {
        let records = [rec(datetime!(2025-01-01 10:00:00 UTC), 1, 7.0)];
        let series = Resampler::new(&records).resample(
            Metric::Ph,
            TankId(1),
            Granularity::Minute,
            datetime!(2025-01-01 10:00:30 UTC),
        );
        assert_eq!(series.labels[59], "10:00");
        assert_eq!(series.labels[0], "09:01");
        assert_eq!(series.values[59], Some(7.0));
        assert_eq!(series.values.iter().filter(|v| v.is_none()).count(), 59);
        assert_eq!(series.color, SeriesColor::Red);
    }

    #[test]
    fn test_first_match_wins() {
        let records = [
            rec(datetime!(2025-01-01 10:00:05 UTC), 1, 7.0),
            rec(datetime!(2025-01-01 10:00:40 UTC), 1, 8.0),
        ];
        let now = datetime!(2025-01-01 10:00:50 UTC);
        let series =
            Resampler::new(&records).resample(Metric::Ph, TankId(1), Granularity::Minute, now);
        assert_eq!(series.values[59], Some(7.0));
    }

    #[test]
    fn test_nearest_and_average_fill() {
        let records = [
            rec(datetime!(2025-01-01 10:00:05 UTC), 1, 7.0),
            rec(datetime!(2025-01-01 10:00:40 UTC), 1, 8.0),
        ];
        let now = datetime!(2025-01-01 10:00:45 UTC);
        let nearest = Resampler::new(&records)
            .with_fill(FillStrategy::Nearest)
            .resample(Metric::Ph, TankId(1), Granularity::Minute, now);
        assert_eq!(nearest.values[59], Some(8.0));

        let average = Resampler::new(&records)
            .with_fill(FillStrategy::Average)
            .resample(Metric::Ph, TankId(1), Granularity::Minute, now);
        assert_eq!(average.values[59], Some(7.5));
    }

    #[test]
    fn test_hour_buckets_half_open() {
        let records = [
            rec(datetime!(2025-01-01 09:00:00 UTC), 1, 6.0),
            rec(datetime!(2025-01-01 09:59:59 UTC), 1, 6.5),
            rec(datetime!(2025-01-01 10:00:00 UTC), 1, 7.0),
        ];
        let now = datetime!(2025-01-01 10:15 UTC);
        let series =
            Resampler::new(&records).resample(Metric::Ph, TankId(1), Granularity::Hour, now);
        assert_eq!(series.labels[23], "10:00");
        assert_eq!(series.labels[22], "09:00");
        assert_eq!(series.labels[0], "11:00");
        assert_eq!(series.values[22], Some(6.0));
        assert_eq!(series.values[23], Some(7.0));
    }

    #[test]
    fn test_day_buckets_use_local_midnight() {
        // 23:30 UTC on Jan 1 is already Jan 2 at +09:00.
        let records = [rec(datetime!(2025-01-01 23:30 UTC), 1, 7.3)];
        let now = datetime!(2025-01-02 12:00 +9);
        let series =
            Resampler::new(&records).resample(Metric::Ph, TankId(1), Granularity::Day, now);
        assert_eq!(series.labels[29], "1/2");
        assert_eq!(series.labels[28], "1/1");
        assert_eq!(series.labels[0], "12/4");
        assert_eq!(series.values[29], Some(7.3));
    }

    #[test]
    fn test_day_buckets_keep_offset_of_now() {
        let now = datetime!(2025-03-31 12:00 +2);
        let plan = BucketPlan::new(Granularity::Day, now);
        assert_eq!(plan.bucket_start(29), datetime!(2025-03-31 00:00 +2));
        // Before the March change the same wall-clock midnight was +1, but the
        // grid stays on +2 and stays 24 hours wide.
        assert_eq!(plan.bucket_start(28), datetime!(2025-03-30 00:00 +2));
        assert_eq!(plan.bucket_start(0), datetime!(2025-03-02 00:00 +2));
        for i in 0..plan.len() {
            assert_eq!(plan.bucket_start(i).offset(), now.offset());
        }
    }

    #[test]
    fn test_other_tanks_ignored() {
        let records = [
            rec(datetime!(2025-01-01 10:00:10 UTC), 2, 4.0),
            rec(datetime!(2025-01-01 10:00:20 UTC), 1, 7.0),
        ];
        let now = datetime!(2025-01-01 10:00:30 UTC);
        let series =
            Resampler::new(&records).resample(Metric::Ph, TankId(1), Granularity::Minute, now);
        assert_eq!(series.values[59], Some(7.0));
        let tank2 =
            Resampler::new(&records).resample(Metric::Ph, TankId(2), Granularity::Minute, now);
        assert_eq!(tank2.values[59], Some(4.0));
    }

    #[test]
    fn test_records_outside_window_ignored() {
        let records = [
            rec(datetime!(2025-01-01 08:59:59 UTC), 1, 1.0),
            rec(datetime!(2025-01-01 10:01:00 UTC), 1, 2.0),
        ];
        let now = datetime!(2025-01-01 10:00:30 UTC);
        let series =
            Resampler::new(&records).resample(Metric::Ph, TankId(1), Granularity::Minute, now);
        assert!(series.is_all_absent());
    }

    #[test]
    fn test_empty_store_is_neutral() {
        let series = Resampler::new(&[]).resample(
            Metric::Temperature,
            TankId(1),
            Granularity::Hour,
            datetime!(2025-01-01 10:00 UTC),
        );
        assert_eq!(series.color, SeriesColor::Grey);
        assert!(series.is_all_absent());
        assert_eq!(series.metric_name, "Temperature");
    }

    #[test]
    fn test_temperature_metric_selected() {
        let records = [rec(datetime!(2025-01-01 10:00:00 UTC), 1, 8.0)];
        let series = Resampler::new(&records).resample(
            Metric::Temperature,
            TankId(1),
            Granularity::Minute,
            datetime!(2025-01-01 10:00:30 UTC),
        );
        assert_eq!(series.values[59], Some(24.0));
        assert_eq!(series.color, SeriesColor::Blue);
    }

    #[test]
    fn test_labels_follow_now_offset() {
        let plan = BucketPlan::new(Granularity::Minute, datetime!(2025-01-01 01:05:10 +5:30));
        assert_eq!(plan.label(59), "01:05");
        assert_eq!(plan.index_of(datetime!(2024-12-31 19:35:00 UTC)), Some(59));
    }

    #[test]
    fn test_plan_targets_walk_back_from_now() {
        let now = datetime!(2025-01-01 10:20:30 UTC);
        let plan = BucketPlan::new(Granularity::Hour, now);
        assert_eq!(plan.target(23), now);
        assert_eq!(plan.target(0), now - Duration::hours(23));
        assert_eq!(plan.bucket_start(23), datetime!(2025-01-01 10:00 UTC));
    }
}
