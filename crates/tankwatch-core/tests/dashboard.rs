//! End-to-end tests of the dashboard refresh cycle.
//!
//! These drive [`Dashboard`] from raw CSV text through ingestion, resampling,
//! threshold drags and alert delivery, with an in-memory transport and a
//! recording sink standing in for the host.

use std::sync::{Arc, Mutex};

use tankwatch_core::{
    AlertStatus, Dashboard, DashboardConfig, Locale, MemorySink, NotifyPolicy, PlotArea,
    SharedBanner, StaticTransport, Store, ingest,
};
use tankwatch_types::{Granularity, Metric, Selection, TankId, ThresholdPair};
use time::OffsetDateTime;
use time::macros::{datetime, offset};

const LOG: &str = "timestamp,tanknumber,pH_Value,temp_Value
2025-01-01 09:57:10,1,7.0,25.0
2025-01-01 09:58:10,1,5.9,25.5
2025-01-01 09:59:10,2,9.5,35.0
2025-01-01 10:00:00,1,7.0,25.0
2025-01-01 10:00:20,1,7.4,26.0
";

const NOW: OffsetDateTime = datetime!(2025-01-01 10:00:30 UTC);

async fn loaded_dashboard(config: DashboardConfig) -> (Dashboard, MemorySink) {
    let store = Arc::new(Store::new());
    let transport = StaticTransport::new(LOG);
    let count = ingest::ingest(&store, &transport, offset!(UTC)).await.unwrap();
    assert_eq!(count, 5);

    let sink = MemorySink::new();
    let dashboard = Dashboard::new(store, config, Box::new(sink.clone()));
    (dashboard, sink)
}

#[tokio::test]
async fn test_refresh_builds_minute_series() {
    let (mut dash, _sink) = loaded_dashboard(DashboardConfig::default()).await;
    dash.refresh(NOW);

    let ph = dash.chart(Metric::Ph).unwrap().series();
    assert_eq!(ph.labels.len(), 60);
    assert_eq!(ph.labels[59], "10:00");
    assert_eq!(ph.values[59], Some(7.0));
    assert_eq!(ph.values[58], None);
    assert_eq!(ph.values[57], Some(5.9));
    assert_eq!(ph.values[56], Some(7.0));

    let temp = dash.chart(Metric::Temperature).unwrap().series();
    assert_eq!(temp.values[59], Some(25.0));
}

#[tokio::test]
async fn test_refresh_notifies_both_charts_every_time() {
    let (mut dash, sink) = loaded_dashboard(DashboardConfig::default()).await;

    let first = dash.refresh(NOW);
    let second = dash.refresh(NOW);
    assert_eq!(first, second);
    assert!(first.ph_out_of_range());
    assert!(!first.temperature_out_of_range());

    let events = sink.events();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], events[2]);
    assert_eq!(events[1], events[3]);
    assert_eq!(events[0].chart_id, "phAlert");
    assert_eq!(events[0].status, AlertStatus::OutOfRange);
    assert_eq!(events[1].chart_id, "tempAlert");
    assert_eq!(events[1].status, AlertStatus::InRange);
}

#[tokio::test]
async fn test_change_policy_deduplicates() {
    let config = DashboardConfig {
        notify: NotifyPolicy::Change,
        ..DashboardConfig::default()
    };
    let (mut dash, sink) = loaded_dashboard(config).await;
    dash.refresh(NOW);
    dash.refresh(NOW);
    assert_eq!(sink.events().len(), 2);
}

#[tokio::test]
async fn test_other_tank_is_isolated() {
    let (mut dash, _sink) = loaded_dashboard(DashboardConfig::default()).await;
    dash.refresh(NOW);
    let tank_one = dash.chart(Metric::Ph).unwrap().series().clone();

    let state = dash.set_tank(TankId(2), NOW);
    let tank_two = dash.chart(Metric::Ph).unwrap().series();
    assert_eq!(tank_two.present_values().collect::<Vec<_>>(), vec![9.5]);
    assert!(state.ph_out_of_range());
    assert!(state.temperature_out_of_range());

    dash.set_tank(TankId(1), NOW);
    assert_eq!(dash.chart(Metric::Ph).unwrap().series(), &tank_one);
}

#[tokio::test]
async fn test_granularity_change_resizes_series() {
    let (mut dash, _sink) = loaded_dashboard(DashboardConfig::default()).await;
    dash.refresh(NOW);
    for (granularity, len) in [(Granularity::Hour, 24), (Granularity::Day, 30), (Granularity::Minute, 60)] {
        dash.set_granularity(granularity, NOW);
        assert_eq!(dash.selection(), Selection::new(granularity, TankId(1)));
        for chart in dash.charts() {
            assert_eq!(chart.series().len(), len);
        }
    }
}

#[tokio::test]
async fn test_drag_release_reevaluates_dragged_chart_only() {
    let (mut dash, sink) = loaded_dashboard(DashboardConfig::default()).await;
    dash.refresh(NOW);
    dash.set_plot_area(Metric::Ph, PlotArea::new(0.0, 0.0, 600.0, 300.0));
    sink.clear();

    // Low bar at 6.0 is 200 px down a 4..10 axis; drag it to 5.5.
    assert!(dash.pointer_down(Metric::Ph, 198.0));
    for y in [205.0, 215.0, 225.0] {
        dash.pointer_move(Metric::Ph, y);
    }
    assert!(sink.events().is_empty());
    assert!(dash.alert_state().ph_out_of_range());

    let (metric, state) = dash.pointer_up().unwrap();
    assert_eq!(metric, Metric::Ph);
    assert!(!state.any());
    assert_eq!(
        dash.chart(Metric::Ph).unwrap().thresholds(),
        ThresholdPair::new(5.5, 8.0)
    );

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].chart_id, "phAlert");
    assert_eq!(events[0].status, AlertStatus::InRange);

    assert!(dash.pointer_up().is_none());
    assert_eq!(sink.events().len(), 1);
}

#[tokio::test]
async fn test_drag_beyond_axis_clamps() {
    let (mut dash, _sink) = loaded_dashboard(DashboardConfig::default()).await;
    dash.refresh(NOW);
    dash.set_plot_area(Metric::Temperature, PlotArea::new(0.0, 0.0, 600.0, 300.0));

    // High bar 28.0 on a 10..40 axis: 300 - 18 * 10 = 120 px.
    assert!(dash.pointer_down(Metric::Temperature, 120.0));
    assert_eq!(dash.pointer_move(Metric::Temperature, -1000.0), Some(40.0));
    dash.pointer_up();
    assert_eq!(
        dash.chart(Metric::Temperature).unwrap().thresholds().high_bar,
        40.0
    );
}

#[tokio::test]
async fn test_banner_follows_alert_state() {
    let banner = SharedBanner::new(Locale::Ko);
    let (dash, _sink) = loaded_dashboard(DashboardConfig::default()).await;
    let mut dash = dash.with_observer(Box::new(banner.clone()));

    dash.refresh(NOW);
    assert_eq!(banner.get().text(), "pH 값이 범위를 초과했습니다!");

    dash.set_tank(TankId(2), NOW);
    assert_eq!(banner.get().text(), "pH, 온도 값이 범위를 초과했습니다!");

    dash.set_tank(TankId(3), NOW);
    assert!(!banner.get().is_visible());
}

/// Captures formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_reload_keeps_records() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (mut dash, _sink) = loaded_dashboard(DashboardConfig::default()).await;
    dash.refresh(NOW);

    let missing = tempfile::tempdir().unwrap().path().join("gone.csv");
    let transport = tankwatch_core::ingest::FileTransport::new(missing);
    let state = dash.reload(&transport, offset!(UTC), NOW).await;

    assert_eq!(dash.store().len(), 5);
    assert!(state.ph_out_of_range());

    let output = logs.contents();
    assert!(output.contains("WARN"), "logs: {output}");
    assert!(output.contains("Failed to load sensor data from"), "logs: {output}");
    assert!(output.contains("gone.csv"), "logs: {output}");
}

#[tokio::test]
async fn test_nudge_reevaluates_chart() {
    let (mut dash, sink) = loaded_dashboard(DashboardConfig::default()).await;
    assert!(dash.refresh(NOW).ph_out_of_range());
    sink.clear();

    // Lowest pH in the window is 5.9; drop the low bar below it.
    let state = dash.nudge(Metric::Ph, 0, -0.5).unwrap();
    assert!(!state.ph_out_of_range());
    assert_eq!(dash.chart(Metric::Ph).unwrap().thresholds().range(), (5.5, 8.0));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].metric(), Some(Metric::Ph));
    assert_eq!(events[0].status, AlertStatus::InRange);
}

#[tokio::test]
async fn test_nudge_ignored_during_drag() {
    let (mut dash, sink) = loaded_dashboard(DashboardConfig::default()).await;
    dash.refresh(NOW);
    dash.set_plot_area(Metric::Ph, PlotArea::new(0.0, 0.0, 600.0, 300.0));
    sink.clear();

    assert!(dash.pointer_down(Metric::Ph, 198.0));
    assert!(dash.nudge(Metric::Ph, 1, 0.5).is_none());
    assert_eq!(
        dash.chart(Metric::Ph).unwrap().thresholds(),
        ThresholdPair::new(6.0, 8.0)
    );
    assert!(sink.events().is_empty());

    dash.pointer_up();
    assert!(dash.nudge(Metric::Ph, 1, 0.5).is_some());
    assert_eq!(
        dash.chart(Metric::Ph).unwrap().thresholds(),
        ThresholdPair::new(6.0, 8.5)
    );
}

#[tokio::test]
async fn test_empty_store_gives_neutral_charts() {
    let sink = MemorySink::new();
    let mut dash = Dashboard::new(
        Arc::new(Store::new()),
        DashboardConfig::default(),
        Box::new(sink.clone()),
    );
    let state = dash.refresh(NOW);
    assert!(!state.any());
    for chart in dash.charts() {
        assert!(chart.series().is_all_absent());
        assert_eq!(chart.series().color, tankwatch_types::SeriesColor::Grey);
    }
    assert!(sink.events().iter().all(|e| e.status == AlertStatus::InRange));
}
