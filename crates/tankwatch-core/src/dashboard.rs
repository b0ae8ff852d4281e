//! The dashboard coordinator.
//!
//! [`Dashboard`] owns all application state: the shared record [`Store`], the
//! current [`Selection`], one [`ChartSession`] per metric and the
//! [`AlertAggregator`]. Each piece has a single writer:
//!
//! - the store is written by ingestion only,
//! - the selection by [`Dashboard::select`] and friends,
//! - threshold bars by the drag state machine,
//! - the alert state by the aggregator.
//!
//! Charts do not exist until the first [`Dashboard::refresh`], which callers
//! run once ingestion has finished.

use std::sync::Arc;

use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, warn};

use tankwatch_types::{AlertState, FillStrategy, Granularity, Metric, Selection, TankId};

use crate::alert::{AlertAggregator, AlertObserver, AlertSink, NotifyPolicy};
use crate::chart::{ChartConfig, ChartSession, PlotArea};
use crate::threshold::DragState;
use crate::ingest::{self, Transport};
use crate::resample::Resampler;
use crate::store::Store;

/// Startup configuration of a [`Dashboard`].
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub selection: Selection,
    pub fill: FillStrategy,
    pub notify: NotifyPolicy,
    pub ph: ChartConfig,
    pub temperature: ChartConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            fill: FillStrategy::default(),
            notify: NotifyPolicy::default(),
            ph: ChartConfig::for_metric(Metric::Ph),
            temperature: ChartConfig::for_metric(Metric::Temperature),
        }
    }
}

impl DashboardConfig {
    pub fn chart(&self, metric: Metric) -> &ChartConfig {
        match metric {
            Metric::Ph => &self.ph,
            Metric::Temperature => &self.temperature,
        }
    }

    pub fn chart_mut(&mut self, metric: Metric) -> &mut ChartConfig {
        match metric {
            Metric::Ph => &mut self.ph,
            Metric::Temperature => &mut self.temperature,
        }
    }
}

/// Application state and the refresh cycle.
#[derive(Debug)]
pub struct Dashboard {
    store: Arc<Store>,
    config: DashboardConfig,
    selection: Selection,
    charts: Option<[ChartSession; 2]>,
    aggregator: AlertAggregator,
}

impl Dashboard {
    /// Create a dashboard over `store` that reports to `sink`.
    pub fn new(store: Arc<Store>, config: DashboardConfig, sink: Box<dyn AlertSink>) -> Self {
        let aggregator = AlertAggregator::new(sink).with_policy(config.notify);
        Self {
            store,
            selection: config.selection,
            config,
            charts: None,
            aggregator,
        }
    }

    /// Attach an observer of the combined alert state, e.g. a banner.
    pub fn with_observer(mut self, observer: Box<dyn AlertObserver>) -> Self {
        self.aggregator.add_observer(observer);
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn fill(&self) -> FillStrategy {
        self.config.fill
    }

    pub fn alert_state(&self) -> AlertState {
        self.aggregator.state()
    }

    /// Whether the charts have been constructed.
    pub fn is_ready(&self) -> bool {
        self.charts.is_some()
    }

    pub fn chart(&self, metric: Metric) -> Option<&ChartSession> {
        self.charts.as_ref().map(|c| &c[slot(metric)])
    }

    pub fn chart_mut(&mut self, metric: Metric) -> Option<&mut ChartSession> {
        self.charts.as_mut().map(|c| &mut c[slot(metric)])
    }

    /// Iterate over constructed charts in display order.
    pub fn charts(&self) -> impl Iterator<Item = &ChartSession> {
        self.charts.iter().flatten()
    }

    /// Reload the store from `transport`, then refresh.
    ///
    /// A failed load is logged and the previous records are kept.
    pub async fn reload(
        &mut self,
        transport: &dyn Transport,
        local_offset: UtcOffset,
        now: OffsetDateTime,
    ) -> AlertState {
        ingest::ingest_or_log(&self.store, transport, local_offset).await;
        self.refresh(now)
    }

    /// Resample both metrics, redraw both charts and re-evaluate both
    /// thresholds.
    pub fn refresh(&mut self, now: OffsetDateTime) -> AlertState {
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            warn!("Refreshing with an empty sensor store");
        }
        let resampler = Resampler::new(&snapshot).with_fill(self.config.fill);
        let ph = resampler.resample_selection(Metric::Ph, &self.selection, now);
        let temperature = resampler.resample_selection(Metric::Temperature, &self.selection, now);

        match self.charts.as_mut() {
            Some([ph_chart, temp_chart]) => {
                ph_chart.replace_series(ph);
                temp_chart.replace_series(temperature);
            }
            None => {
                debug!("Constructing chart sessions");
                self.charts = Some([
                    ChartSession::new(self.config.ph, ph),
                    ChartSession::new(self.config.temperature, temperature),
                ]);
            }
        }

        let mut state = self.aggregator.state();
        for metric in Metric::ALL {
            state = self.evaluate(metric).unwrap_or(state);
        }
        state
    }

    /// Change the selection and refresh.
    pub fn select(&mut self, selection: Selection, now: OffsetDateTime) -> AlertState {
        self.selection = selection;
        debug!(
            "Selection changed to {} / {}",
            selection.granularity, selection.tank_id
        );
        self.refresh(now)
    }

    pub fn set_granularity(&mut self, granularity: Granularity, now: OffsetDateTime) -> AlertState {
        self.select(Selection::new(granularity, self.selection.tank_id), now)
    }

    pub fn set_tank(&mut self, tank_id: TankId, now: OffsetDateTime) -> AlertState {
        self.select(Selection::new(self.selection.granularity, tank_id), now)
    }

    /// Record the plot area a renderer laid out for `metric`.
    pub fn set_plot_area(&mut self, metric: Metric, area: PlotArea) {
        if let Some(chart) = self.chart_mut(metric) {
            chart.set_plot_area(area);
        }
    }

    /// Pointer pressed on the chart of `metric`. Returns whether a bar was
    /// grabbed.
    pub fn pointer_down(&mut self, metric: Metric, y: f64) -> bool {
        self.chart_mut(metric).is_some_and(|c| c.pointer_down(y))
    }

    /// Pointer moved over the chart of `metric`.
    ///
    /// Only the dragged bar changes; nothing is resampled or evaluated.
    pub fn pointer_move(&mut self, metric: Metric, y: f64) -> Option<f64> {
        self.chart_mut(metric)?.pointer_move(y)
    }

    /// Pointer released anywhere.
    ///
    /// Ends any drag in progress, re-evaluates that chart only and returns
    /// the released chart with the new alert state. Returns `None` when no
    /// drag was in progress.
    pub fn pointer_up(&mut self) -> Option<(Metric, AlertState)> {
        let charts = self.charts.as_mut()?;
        let released = charts
            .iter_mut()
            .filter_map(|c| c.pointer_up().map(|_| c.metric()))
            .collect::<Vec<_>>();

        let mut result = None;
        for metric in released {
            if let Some(state) = self.evaluate(metric) {
                result = Some((metric, state));
            }
        }
        result
    }

    /// Move a bar of `metric` by `delta`, then re-evaluate that chart.
    ///
    /// Ignored while that chart has a drag in progress.
    pub fn nudge(&mut self, metric: Metric, index: usize, delta: f64) -> Option<AlertState> {
        let chart = self.chart_mut(metric)?;
        if chart.drag_state() != DragState::Idle {
            return None;
        }
        chart.nudge(index, delta);
        self.evaluate(metric)
    }

    fn evaluate(&mut self, metric: Metric) -> Option<AlertState> {
        let out_of_range = self.chart(metric)?.evaluate();
        Some(self.aggregator.update(metric, out_of_range))
    }
}

fn slot(metric: Metric) -> usize {
    match metric {
        Metric::Ph => 0,
        Metric::Temperature => 1,
    }
}
