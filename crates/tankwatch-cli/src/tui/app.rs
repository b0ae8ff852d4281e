//! Application state for the terminal dashboard.
//!
//! [`App`] wraps the core [`Dashboard`] with what only a terminal needs:
//! load progress, keyboard focus, the chart rectangles of the last layout for
//! mouse hit-testing, and the alert banner and sink the UI reads back.

use std::sync::Arc;

use ratatui::layout::Rect;
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::mpsc;

use tankwatch_core::{
    Dashboard, DashboardConfig, LabelStyle, MemorySink, SharedBanner, Store,
};
use tankwatch_types::{Granularity, Metric, TankId};

use super::messages::LoadEvent;
use super::ui;
use crate::config::Config;

/// Readout box size in terminal cells.
const READOUT_STYLE: LabelStyle = LabelStyle {
    width: 6.0,
    height: 1.0,
    margin: 1.0,
    precision: 2,
};

/// Progress of the sensor log load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet.
    #[default]
    Pending,
    /// A load is in flight.
    Loading,
    /// The last load succeeded.
    Ready { records: usize, dropped: usize },
    /// The last load failed.
    Failed(String),
}

impl LoadState {
    pub fn label(&self) -> String {
        match self {
            Self::Pending => "waiting".to_string(),
            Self::Loading => "loading".to_string(),
            Self::Ready { records, dropped } if *dropped > 0 => {
                format!("{records} records ({dropped} rows dropped)")
            }
            Self::Ready { records, .. } => format!("{records} records"),
            Self::Failed(error) => format!("load failed: {error}"),
        }
    }
}

/// Terminal dashboard state.
pub struct App {
    pub should_quit: bool,
    pub dashboard: Dashboard,
    pub banner: SharedBanner,
    pub sink: MemorySink,
    /// Chart that keyboard threshold controls act on.
    pub focus: Metric,
    pub load_state: LoadState,
    pub source: String,
    /// Chart rectangles of the last layout, in display order.
    pub chart_areas: [Rect; 2],
    pub local_offset: UtcOffset,
    /// Chart whose bar is being dragged with the mouse.
    dragging: Option<Metric>,
    pub event_rx: mpsc::Receiver<LoadEvent>,
}

impl App {
    pub fn new(
        config: &Config,
        source: String,
        store: Arc<Store>,
        local_offset: UtcOffset,
        event_rx: mpsc::Receiver<LoadEvent>,
    ) -> Self {
        let mut dashboard_config: DashboardConfig = config.dashboard_config();
        for metric in Metric::ALL {
            let chart = dashboard_config.chart_mut(metric);
            *chart = chart.with_label(READOUT_STYLE);
        }

        let sink = MemorySink::new();
        let banner = SharedBanner::new(config.locale);
        let dashboard = Dashboard::new(store, dashboard_config, Box::new(sink.clone()))
            .with_observer(Box::new(banner.clone()));

        Self {
            should_quit: false,
            dashboard,
            banner,
            sink,
            focus: Metric::Ph,
            load_state: LoadState::Pending,
            source,
            chart_areas: [Rect::default(); 2],
            local_offset,
            dragging: None,
            event_rx,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Current time in the dashboard's offset.
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.local_offset)
    }

    /// Apply a report from the load worker.
    pub fn handle_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Loading { source } => {
                self.source = source;
                self.load_state = LoadState::Loading;
            }
            LoadEvent::Loaded { records, dropped } => {
                self.load_state = LoadState::Ready { records, dropped };
                self.refresh();
            }
            LoadEvent::Failed { error } => {
                self.load_state = LoadState::Failed(error);
                self.refresh();
            }
        }
    }

    /// Re-run the full refresh cycle.
    pub fn refresh(&mut self) {
        let now = self.now();
        self.dashboard.refresh(now);
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        if self.dashboard.is_ready() {
            let now = self.now();
            self.dashboard.set_granularity(granularity, now);
        }
    }

    pub fn set_tank(&mut self, tank: u32) {
        if self.dashboard.is_ready() {
            let now = self.now();
            self.dashboard.set_tank(TankId(tank), now);
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Metric::Ph => Metric::Temperature,
            Metric::Temperature => Metric::Ph,
        };
    }

    /// Move a bar of the focused chart by one step.
    pub fn nudge_bar(&mut self, index: usize, up: bool) {
        let Some(chart) = self.dashboard.chart(self.focus) else {
            return;
        };
        let axis = chart.config().axis;
        let step = axis.span() / 60.0;
        let delta = if up { step } else { -step };
        self.dashboard.nudge(self.focus, index, delta);
    }

    /// Record the chart rectangles of the current layout.
    pub fn update_layout(&mut self, chart_areas: [Rect; 2]) {
        self.chart_areas = chart_areas;
        for (metric, area) in Metric::ALL.into_iter().zip(chart_areas) {
            self.dashboard.set_plot_area(metric, ui::plot_area(area));
        }
    }

    /// Chart under a terminal cell.
    pub fn chart_at(&self, x: u16, y: u16) -> Option<Metric> {
        Metric::ALL
            .into_iter()
            .zip(self.chart_areas)
            .find(|(_, r)| x >= r.x && x < r.right() && y >= r.y && y < r.bottom())
            .map(|(metric, _)| metric)
    }

    pub fn mouse_down(&mut self, x: u16, y: u16) {
        let Some(metric) = self.chart_at(x, y) else {
            return;
        };
        self.focus = metric;
        if self.dashboard.pointer_down(metric, f64::from(y)) {
            self.dragging = Some(metric);
        }
    }

    /// Drag continues outside the chart; the value is clamped to the axis.
    pub fn mouse_drag(&mut self, y: u16) {
        if let Some(metric) = self.dragging {
            self.dashboard.pointer_move(metric, f64::from(y));
        }
    }

    /// Release anywhere on the terminal.
    pub fn mouse_up(&mut self) {
        self.dragging = None;
        self.dashboard.pointer_up();
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Banner text when any chart is out of range.
    pub fn banner_text(&self) -> Option<String> {
        let banner = self.banner.get();
        banner.is_visible().then(|| banner.text().to_string())
    }

    /// The last event delivered to the alert sink, as JSON.
    pub fn last_event(&self) -> Option<String> {
        self.sink.last().and_then(|event| event.to_json().ok())
    }
}
