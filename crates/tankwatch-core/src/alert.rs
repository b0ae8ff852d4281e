//! Alert aggregation and notification.
//!
//! The [`AlertAggregator`] keeps one out-of-range flag per chart and derives
//! the combined [`AlertState`]. Every update is forwarded to an [`AlertSink`]
//! (the host bridge) as an [`AlertEvent`]; observers such as the
//! [`AlertBanner`] are told about the combined state.
//!
//! Sink failures are logged and never propagated: the dashboard keeps working
//! when the host bridge goes away.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tankwatch_types::{AlertState, Metric};

use crate::error::{Error, Result};

/// Whether a chart is inside its threshold range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertStatus {
    InRange,
    OutOfRange,
}

impl AlertStatus {
    pub fn from_out_of_range(out_of_range: bool) -> Self {
        if out_of_range {
            AlertStatus::OutOfRange
        } else {
            AlertStatus::InRange
        }
    }

    pub fn is_out_of_range(self) -> bool {
        self == AlertStatus::OutOfRange
    }
}

/// Structured event sent to the host bridge.
///
/// Serializes as `{"type":"sensorAlert","chartId":"phAlert","status":"outOfRange"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "sensorAlert", rename_all = "camelCase")]
pub struct AlertEvent {
    pub chart_id: String,
    pub status: AlertStatus,
}

impl AlertEvent {
    pub fn new(metric: Metric, out_of_range: bool) -> Self {
        Self {
            chart_id: metric.chart_id().to_string(),
            status: AlertStatus::from_out_of_range(out_of_range),
        }
    }

    /// Metric this event refers to, if the chart id is known.
    pub fn metric(&self) -> Option<Metric> {
        Metric::from_chart_id(&self.chart_id)
    }

    /// Compact JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receiver of alert events (the host bridge).
pub trait AlertSink {
    fn notify(&mut self, event: &AlertEvent) -> Result<()>;
}

/// Sink used when no bridge is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AlertSink for NullSink {
    fn notify(&mut self, _event: &AlertEvent) -> Result<()> {
        Ok(())
    }
}

/// Writes one JSON event per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> AlertSink for JsonLinesSink<W> {
    fn notify(&mut self, event: &AlertEvent) -> Result<()> {
        let line = event.to_json()?;
        writeln!(self.writer, "{line}").map_err(|e| Error::Sink(e.to_string()))?;
        self.writer.flush().map_err(|e| Error::Sink(e.to_string()))
    }
}

/// Records events in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AlertEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    pub fn events(&self) -> Vec<AlertEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent event.
    pub fn last(&self) -> Option<AlertEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AlertSink for MemorySink {
    fn notify(&mut self, event: &AlertEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

impl<F> AlertSink for F
where
    F: FnMut(&AlertEvent) -> Result<()>,
{
    fn notify(&mut self, event: &AlertEvent) -> Result<()> {
        self(event)
    }
}

/// Observer of the combined alert state.
pub trait AlertObserver {
    fn alert_state_changed(&mut self, state: &AlertState);
}

/// When the sink is notified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyPolicy {
    /// On every evaluation, including repeats of the same status.
    #[default]
    Every,
    /// Only when a chart's status differs from the last notified one.
    Change,
}

impl NotifyPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            NotifyPolicy::Every => "every",
            NotifyPolicy::Change => "change",
        }
    }
}

impl std::str::FromStr for NotifyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "every" | "always" => Ok(NotifyPolicy::Every),
            "change" | "changes" => Ok(NotifyPolicy::Change),
            _ => Err(Error::InvalidConfig(format!(
                "notify policy must be 'every' or 'change', got '{s}'"
            ))),
        }
    }
}

/// Banner language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    pub fn metric_name(self, metric: Metric) -> &'static str {
        match (self, metric) {
            (_, Metric::Ph) => "pH",
            (Locale::En, Metric::Temperature) => "Temperature",
            (Locale::Ko, Metric::Temperature) => "온도",
        }
    }

    /// Sentence listing the out-of-range metrics, or `None` when all are in
    /// range.
    pub fn summary(self, state: &AlertState) -> Option<String> {
        let names: Vec<&str> = state
            .out_of_range_metrics()
            .into_iter()
            .map(|m| self.metric_name(m))
            .collect();
        if names.is_empty() {
            return None;
        }
        let list = names.join(", ");
        Some(match self {
            Locale::En => format!("{list} out of range!"),
            Locale::Ko => format!("{list} 값이 범위를 초과했습니다!"),
        })
    }
}

impl std::str::FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ko" | "korean" => Ok(Locale::Ko),
            _ => Err(Error::InvalidConfig(format!(
                "locale must be 'en' or 'ko', got '{s}'"
            ))),
        }
    }
}

/// Visible alert banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertBanner {
    locale: Locale,
    text: Option<String>,
}

impl AlertBanner {
    pub fn new(locale: Locale) -> Self {
        Self { locale, text: None }
    }

    pub fn is_visible(&self) -> bool {
        self.text.is_some()
    }

    /// Banner text; empty when hidden.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn update(&mut self, state: &AlertState) {
        self.text = self.locale.summary(state);
    }
}

impl AlertObserver for AlertBanner {
    fn alert_state_changed(&mut self, state: &AlertState) {
        self.update(state);
    }
}

/// Shared banner handle, so a UI can read what the aggregator writes.
#[derive(Debug, Clone, Default)]
pub struct SharedBanner(Arc<Mutex<AlertBanner>>);

impl SharedBanner {
    pub fn new(locale: Locale) -> Self {
        Self(Arc::new(Mutex::new(AlertBanner::new(locale))))
    }

    pub fn get(&self) -> AlertBanner {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AlertObserver for SharedBanner {
    fn alert_state_changed(&mut self, state: &AlertState) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(state);
    }
}

/// Combines per-chart flags into one [`AlertState`] and notifies the sink.
pub struct AlertAggregator {
    state: AlertState,
    policy: NotifyPolicy,
    sink: Box<dyn AlertSink>,
    observers: Vec<Box<dyn AlertObserver>>,
    last_notified: [Option<bool>; 2],
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl std::fmt::Debug for AlertAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertAggregator")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl AlertAggregator {
    pub fn new(sink: Box<dyn AlertSink>) -> Self {
        Self {
            state: AlertState::default(),
            policy: NotifyPolicy::Every,
            sink,
            observers: Vec::new(),
            last_notified: [None; 2],
        }
    }

    pub fn with_policy(mut self, policy: NotifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn AlertObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn AlertObserver>) {
        self.observers.push(observer);
    }

    pub fn set_sink(&mut self, sink: Box<dyn AlertSink>) {
        self.sink = sink;
        self.last_notified = [None; 2];
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    /// Record a chart's evaluation and return the combined state.
    pub fn update(&mut self, metric: Metric, out_of_range: bool) -> AlertState {
        self.state = match metric {
            Metric::Ph => {
                AlertState::from_flags(out_of_range, self.state.temperature_out_of_range())
            }
            Metric::Temperature => AlertState::from_flags(self.state.ph_out_of_range(), out_of_range),
        };

        let slot = &mut self.last_notified[metric_slot(metric)];
        let send = self.policy == NotifyPolicy::Every || *slot != Some(out_of_range);
        if send {
            let event = AlertEvent::new(metric, out_of_range);
            match self.sink.notify(&event) {
                Ok(()) => *slot = Some(out_of_range),
                Err(e) => warn!("Failed to deliver alert event for {}: {}", event.chart_id, e),
            }
        } else {
            debug!("Suppressed unchanged alert status for {}", metric.chart_id());
        }

        for observer in &mut self.observers {
            observer.alert_state_changed(&self.state);
        }
        self.state
    }
}

fn metric_slot(metric: Metric) -> usize {
    match metric {
        Metric::Ph => 0,
        Metric::Temperature => 1,
    }
}
