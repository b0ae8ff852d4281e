//! Resampling, threshold and alert engine for aquarium sensor dashboards.
//!
//! This crate turns an irregular, timestamped sensor log into fixed-width
//! series for charting, and tracks user-adjustable threshold bars that raise
//! alerts when readings leave the allowed range.
//!
//! # Features
//!
//! - **Ingestion**: tolerant CSV parsing from a file, an HTTP(S) URL or memory
//! - **Resampling**: minute, hour and day buckets with first, nearest or
//!   average fill
//! - **Threshold bars**: drag state machine with axis clamping
//! - **Alerts**: per-chart flags combined into one state, forwarded to a host
//!   bridge and an optional localized banner
//! - **Dashboard**: one coordinator owning all state and the refresh cycle
//!
//! # Feature Flags
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `fs` | yes | [`ingest::FileTransport`] |
//! | `http` | yes | [`ingest::HttpTransport`] |
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tankwatch_core::{Dashboard, DashboardConfig, JsonLinesSink, Source, Store, ingest};
//! use time::{OffsetDateTime, UtcOffset};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(Store::new());
//!     let transport = Source::parse("sensor_Value.csv").transport()?;
//!     ingest::ingest(&store, transport.as_ref(), UtcOffset::UTC).await?;
//!
//!     let sink = JsonLinesSink::new(std::io::stdout());
//!     let mut dashboard = Dashboard::new(store, DashboardConfig::default(), Box::new(sink));
//!     let state = dashboard.refresh(OffsetDateTime::now_utc());
//!     println!("out of range: {}", state.any());
//!     Ok(())
//! }
//! ```

pub mod alert;
pub mod chart;
pub mod dashboard;
pub mod error;
pub mod ingest;
pub mod resample;
pub mod store;
pub mod threshold;

// Re-export the shared types crate
pub use tankwatch_types as types;

pub use alert::{
    AlertAggregator, AlertBanner, AlertEvent, AlertObserver, AlertSink, AlertStatus,
    JsonLinesSink, Locale, MemorySink, NotifyPolicy, NullSink, SharedBanner,
};
pub use chart::{BarOverlay, ChartConfig, ChartSession, LabelBox, LabelStyle, PlotArea, Redraw};
pub use dashboard::{Dashboard, DashboardConfig};
pub use error::{Error, Result};
pub use ingest::{ParsedLog, Source, StaticTransport, Transport, parse_csv, parse_timestamp};
pub use resample::{BucketPlan, Resampler};
pub use store::{Snapshot, Store};
pub use threshold::{
    AxisRange, DEFAULT_DRAG_TOLERANCE, DragState, LinearAxis, ThresholdBars, ValueAxis,
    is_out_of_range,
};
