//! WebAssembly module for the aquarium sensor dashboard.
//!
//! The page fetches the sensor log itself and hands the text to
//! [`WasmDashboard::load_csv`]. Charts are drawn from the JSON returned by
//! `seriesJson` and `overlayJson`; pointer events on a chart canvas go to
//! `pointerDown` and `pointerMove`, and a window-level `pointerup` listener
//! calls `pointerUp`.
//!
//! Alert events are passed to a JavaScript callback as plain objects
//! (`{type: "sensorAlert", chartId, status}`), typically one that forwards
//! them with `window.parent.postMessage`.
//!
//! ```js
//! const dash = new WasmDashboard((event) => window.parent.postMessage(event, "*"), "en");
//! dash.loadCsv(await (await fetch("sensor_Value.csv")).text());
//! ```

use std::fmt::Display;
use std::sync::Arc;

use js_sys::Function;
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};
use wasm_bindgen::prelude::*;

use tankwatch_core::{
    AlertEvent, AlertSink, BarOverlay, Dashboard, DashboardConfig, Error, Locale, NotifyPolicy,
    NullSink, PlotArea, Redraw, SharedBanner, Store, parse_csv,
};
use tankwatch_types::{Granularity, Metric, Series, TankId};

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    log("tankwatch WASM module initialized");
}

/// Log a message to the browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Delivers alert events to a JavaScript function.
struct JsCallbackSink {
    callback: Function,
}

impl AlertSink for JsCallbackSink {
    fn notify(&mut self, event: &AlertEvent) -> tankwatch_core::Result<()> {
        let json = event.to_json()?;
        let value = js_sys::JSON::parse(&json).map_err(|e| Error::Sink(format!("{:?}", e)))?;
        self.callback
            .call1(&JsValue::NULL, &value)
            .map(|_| ())
            .map_err(|e| Error::Sink(format!("{:?}", e)))
    }
}

/// Current time and offset of the browser.
fn browser_now() -> (OffsetDateTime, UtcOffset) {
    let date = js_sys::Date::new_0();
    // getTimezoneOffset is in minutes west of UTC
    let offset_seconds = -(date.get_timezone_offset() as i32) * 60;
    let offset = UtcOffset::from_whole_seconds(offset_seconds).unwrap_or(UtcOffset::UTC);
    let nanos = (date.get_time() * 1_000_000.0) as i128;
    let now = OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .to_offset(offset);
    (now, offset)
}

/// Chart selector used by the page: a chart id (`phAlert`, `tempAlert`) or
/// a metric name (`ph`, `temperature`).
fn metric_for(id: &str) -> Result<Metric, String> {
    match Metric::from_chart_id(id) {
        Some(metric) => Ok(metric),
        None => id.parse::<Metric>().map_err(|e| e.to_string()),
    }
}

fn redraw_name(redraw: Redraw) -> &'static str {
    match redraw {
        Redraw::Overlay => "overlay",
        Redraw::Full => "full",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesView<'a> {
    chart_id: &'static str,
    metric_name: &'a str,
    labels: &'a [String],
    values: &'a [Option<f64>],
    color: &'static str,
}

impl<'a> From<&'a Series> for SeriesView<'a> {
    fn from(series: &'a Series) -> Self {
        Self {
            chart_id: series.metric.chart_id(),
            metric_name: &series.metric_name,
            labels: &series.labels,
            values: &series.values,
            color: series.color.css(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LabelView {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OverlayView<'a> {
    index: usize,
    value: f64,
    y: f64,
    left: f64,
    right: f64,
    text: &'a str,
    label: LabelView,
    color: &'static str,
    dragging: bool,
}

impl<'a> From<&'a BarOverlay> for OverlayView<'a> {
    fn from(bar: &'a BarOverlay) -> Self {
        Self {
            index: bar.index,
            value: bar.value,
            y: bar.y,
            left: bar.left,
            right: bar.right,
            text: &bar.text,
            label: LabelView {
                x: bar.label_box.x,
                y: bar.label_box.y,
                width: bar.label_box.width,
                height: bar.label_box.height,
            },
            color: bar.color.css(),
            dragging: bar.dragging,
        }
    }
}

fn overlay_json(overlay: &[BarOverlay]) -> serde_json::Result<String> {
    let views: Vec<OverlayView<'_>> = overlay.iter().map(OverlayView::from).collect();
    serde_json::to_string(&views)
}

/// The dashboard, driven from JavaScript.
#[wasm_bindgen]
pub struct WasmDashboard {
    dashboard: Dashboard,
    banner: SharedBanner,
}

#[wasm_bindgen]
impl WasmDashboard {
    /// Create a dashboard.
    ///
    /// `on_alert` receives every alert event; `locale` is `"en"` (default)
    /// or `"ko"`; `notify` is `"every"` (default) or `"change"`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        on_alert: Option<Function>,
        locale: Option<String>,
        notify: Option<String>,
    ) -> Result<WasmDashboard, JsValue> {
        let locale: Locale = match locale {
            Some(s) => s.parse().map_err(js_err)?,
            None => Locale::default(),
        };
        let notify: NotifyPolicy = match notify {
            Some(s) => s.parse().map_err(js_err)?,
            None => NotifyPolicy::default(),
        };
        let sink: Box<dyn AlertSink> = match on_alert {
            Some(callback) => Box::new(JsCallbackSink { callback }),
            None => Box::new(NullSink),
        };

        let config = DashboardConfig {
            notify,
            ..DashboardConfig::default()
        };
        let banner = SharedBanner::new(locale);
        // The page is single-threaded; the dashboard is the store's only writer.
        let dashboard = Dashboard::new(Arc::new(Store::new()), config, sink)
            .with_observer(Box::new(banner.clone()));
        Ok(Self { dashboard, banner })
    }

    /// Replace the sensor log with `text` and refresh both charts.
    ///
    /// Returns the number of records loaded.
    #[wasm_bindgen(js_name = loadCsv)]
    pub fn load_csv(&mut self, text: &str) -> Result<usize, JsValue> {
        let (now, offset) = browser_now();
        let parsed = parse_csv(text, offset).map_err(js_err)?;
        log(&format!(
            "Loaded {} sensor records ({} rows dropped)",
            parsed.records.len(),
            parsed.dropped
        ));
        let count = parsed.records.len();
        self.dashboard.store().replace(parsed.records);
        self.dashboard.refresh(now);
        Ok(count)
    }

    /// Report a failed fetch. The previous records stay; charts are
    /// refreshed so they exist even when nothing was ever loaded.
    #[wasm_bindgen(js_name = loadFailed)]
    pub fn load_failed(&mut self, message: &str) {
        web_sys::console::warn_1(&format!("Failed to load sensor data: {}", message).into());
        let (now, _) = browser_now();
        self.dashboard.refresh(now);
    }

    /// Re-run the refresh cycle against the current time.
    pub fn refresh(&mut self) {
        let (now, _) = browser_now();
        self.dashboard.refresh(now);
    }

    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.dashboard.is_ready()
    }

    /// Select `minute`, `hour` or `day` buckets.
    #[wasm_bindgen(js_name = setGranularity)]
    pub fn set_granularity(&mut self, value: &str) -> Result<(), JsValue> {
        let granularity: Granularity = value.parse().map_err(js_err)?;
        let (now, _) = browser_now();
        self.dashboard.set_granularity(granularity, now);
        Ok(())
    }

    /// Select a tank (`tank_<n>`).
    #[wasm_bindgen(js_name = setTank)]
    pub fn set_tank(&mut self, value: &str) -> Result<(), JsValue> {
        let tank: TankId = value.parse().map_err(js_err)?;
        let (now, _) = browser_now();
        self.dashboard.set_tank(tank, now);
        Ok(())
    }

    /// Plot area of a chart canvas in CSS pixels.
    #[wasm_bindgen(js_name = setPlotArea)]
    pub fn set_plot_area(
        &mut self,
        chart: &str,
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    ) -> Result<(), JsValue> {
        let metric = metric_for(chart).map_err(js_err)?;
        self.dashboard
            .set_plot_area(metric, PlotArea::new(left, top, right, bottom));
        Ok(())
    }

    /// Start dragging the bar near `y`, if any.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, chart: &str, y: f64) -> Result<bool, JsValue> {
        let metric = metric_for(chart).map_err(js_err)?;
        Ok(self.dashboard.pointer_down(metric, y))
    }

    /// Move the dragged bar. Returns its new value.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, chart: &str, y: f64) -> Result<Option<f64>, JsValue> {
        let metric = metric_for(chart).map_err(js_err)?;
        Ok(self.dashboard.pointer_move(metric, y))
    }

    /// End any drag. Returns whether a drag ended.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> bool {
        self.dashboard.pointer_up().is_some()
    }

    #[wasm_bindgen(js_name = seriesJson)]
    pub fn series_json(&self, chart: &str) -> Result<Option<String>, JsValue> {
        let metric = metric_for(chart).map_err(js_err)?;
        self.dashboard
            .chart(metric)
            .map(|c| serde_json::to_string(&SeriesView::from(c.series())))
            .transpose()
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = overlayJson)]
    pub fn overlay_json(&self, chart: &str) -> Result<Option<String>, JsValue> {
        let metric = metric_for(chart).map_err(js_err)?;
        self.dashboard
            .chart(metric)
            .map(|c| overlay_json(&c.overlay()))
            .transpose()
            .map_err(js_err)
    }

    /// What a chart needs redrawn since the last call: `"overlay"`, `"full"`
    /// or nothing.
    #[wasm_bindgen(js_name = takeRedraw)]
    pub fn take_redraw(&mut self, chart: &str) -> Result<Option<String>, JsValue> {
        let metric = metric_for(chart).map_err(js_err)?;
        Ok(self
            .dashboard
            .chart_mut(metric)
            .and_then(|c| c.take_redraw())
            .map(|r| redraw_name(r).to_string()))
    }

    /// Banner text, or nothing while every chart is in range.
    #[wasm_bindgen(js_name = bannerText)]
    pub fn banner_text(&self) -> Option<String> {
        let banner = self.banner.get();
        banner.is_visible().then(|| banner.text().to_string())
    }
}
