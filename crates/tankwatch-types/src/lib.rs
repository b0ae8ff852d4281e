//! Platform-agnostic types for aquarium sensor dashboards.
//!
//! This crate provides shared types that can be used by both native
//! (tankwatch-core, tankwatch-cli) and WebAssembly (tankwatch-wasm) front-ends.
//!
//! # Features
//!
//! - Sensor log records and tank identifiers
//! - Metric, granularity and fill-strategy selectors
//! - Resampled series, threshold bars and alert state
//! - Error types for selector parsing
//!
//! # Example
//!
//! ```
//! use tankwatch_types::{Granularity, Selection, TankId};
//!
//! let selection = Selection::new("hour".parse().unwrap(), "tank_2".parse().unwrap());
//! assert_eq!(selection.granularity, Granularity::Hour);
//! assert_eq!(selection.tank_id, TankId(2));
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    AlertState, FillStrategy, Granularity, Metric, Selection, SensorRecord, Series, SeriesColor,
    TankId, ThresholdPair,
};
