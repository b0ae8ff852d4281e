//! Draggable threshold bars and out-of-range evaluation.
//!
//! Each chart carries two horizontal bars. A bar is picked up by a
//! pointer-down close to its rendered position, follows pointer moves while
//! dragging, and is released by a pointer-up anywhere. The drag is an explicit
//! state machine:
//!
//! ```text
//!            down within tolerance of bar i
//!   Idle ───────────────────────────────────▶ Dragging(i) ──┐ move: set bar i,
//!    ▲                                            │  ▲      │ clamp to axis
//!    └──────────────── up (release i) ────────────┘  └──────┘
//! ```
//!
//! Moves only change the bar value; evaluation against data happens on
//! release. A pointer-up while idle is ignored.

use tankwatch_types::{Series, ThresholdPair};

/// Pixel distance within which a pointer-down grabs a bar.
pub const DEFAULT_DRAG_TOLERANCE: f64 = 5.0;

/// Mapping between data values and vertical pixel positions.
///
/// This is the seam to the rendering engine: whatever draws the chart knows
/// where a value lands on screen.
pub trait ValueAxis {
    /// Vertical pixel position of a value.
    fn pixel_for_value(&self, value: f64) -> f64;
    /// Value at a vertical pixel position.
    fn value_for_pixel(&self, pixel: f64) -> f64;
    /// Configured `(min, max)` of the axis.
    fn bounds(&self) -> (f64, f64);

    /// Clamp a value into the axis bounds.
    fn clamp(&self, value: f64) -> f64 {
        let (min, max) = self.bounds();
        value.max(min).min(max)
    }
}

/// Vertical value range of a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Linear axis over a plot area, `max` at `top` and `min` at `bottom`.
///
/// Pixel coordinates grow downward, as on a canvas or terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearAxis {
    range: AxisRange,
    top: f64,
    bottom: f64,
}

impl LinearAxis {
    pub fn new(range: AxisRange, top: f64, bottom: f64) -> Self {
        Self { range, top, bottom }
    }

    pub fn range(&self) -> AxisRange {
        self.range
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

impl ValueAxis for LinearAxis {
    fn pixel_for_value(&self, value: f64) -> f64 {
        if self.range.span() == 0.0 {
            return self.bottom;
        }
        self.bottom - (value - self.range.min) / self.range.span() * self.height()
    }

    fn value_for_pixel(&self, pixel: f64) -> f64 {
        if self.height() == 0.0 {
            return self.range.min;
        }
        self.range.min + (self.bottom - pixel) / self.height() * self.range.span()
    }

    fn bounds(&self) -> (f64, f64) {
        (self.range.min, self.range.max)
    }
}

/// Drag state of a chart's bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    /// Dragging the bar with this index.
    Dragging(usize),
}

/// The two bars of a chart plus their drag state.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBars {
    pair: ThresholdPair,
    state: DragState,
    tolerance: f64,
}

impl ThresholdBars {
    /// Create bars, clamping both into `range`.
    pub fn new(pair: ThresholdPair, range: AxisRange) -> Self {
        let clamp = |v: f64| v.max(range.min).min(range.max);
        Self {
            pair: ThresholdPair::new(clamp(pair.low_bar), clamp(pair.high_bar)),
            state: DragState::Idle,
            tolerance: DEFAULT_DRAG_TOLERANCE,
        }
    }

    /// Use a different grab tolerance, in the axis' pixel units.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn pair(&self) -> ThresholdPair {
        self.pair
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Pointer pressed at vertical position `y`.
    ///
    /// Grabs the bar whose rendered position is strictly closer than the
    /// tolerance. When both bars qualify the last one (the high bar) wins.
    /// Returns whether a drag started.
    pub fn pointer_down(&mut self, y: f64, axis: &impl ValueAxis) -> bool {
        let mut grabbed = None;
        for (index, value) in self.pair.bars().into_iter().enumerate() {
            if (y - axis.pixel_for_value(value)).abs() < self.tolerance {
                grabbed = Some(index);
            }
        }
        match grabbed {
            Some(index) => {
                self.state = DragState::Dragging(index);
                true
            }
            None => false,
        }
    }

    /// Pointer moved to vertical position `y`.
    ///
    /// While dragging, sets the dragged bar to the value under the pointer,
    /// clamped to the axis bounds, and returns the new value. Idle moves are
    /// ignored.
    pub fn pointer_move(&mut self, y: f64, axis: &impl ValueAxis) -> Option<f64> {
        let DragState::Dragging(index) = self.state else {
            return None;
        };
        let value = axis.clamp(axis.value_for_pixel(y));
        self.pair.set_bar(index, value);
        Some(value)
    }

    /// Pointer released anywhere.
    ///
    /// Returns the index of the released bar, or `None` if nothing was being
    /// dragged.
    pub fn pointer_up(&mut self) -> Option<usize> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(index) => Some(index),
            DragState::Idle => None,
        }
    }

    /// Move a bar by `delta`, clamped to `range`. Used by keyboard controls.
    pub fn nudge(&mut self, index: usize, delta: f64, range: AxisRange) -> f64 {
        let value = (self.pair.bar(index) + delta).max(range.min).min(range.max);
        self.pair.set_bar(index, value);
        value
    }
}

/// Whether any present value lies outside the effective bar range.
///
/// Absent values are ignored, so an all-absent series is always in range.
///
/// ```
/// use tankwatch_core::threshold::is_out_of_range;
/// use tankwatch_types::ThresholdPair;
///
/// let bars = ThresholdPair::new(6.0, 8.0);
/// assert!(is_out_of_range(&[Some(5.9), Some(7.0), None], &bars));
/// assert!(!is_out_of_range(&[None, None], &bars));
/// ```
pub fn is_out_of_range(values: &[Option<f64>], pair: &ThresholdPair) -> bool {
    let (lo, hi) = pair.range();
    values.iter().flatten().any(|v| *v < lo || *v > hi)
}

/// [`is_out_of_range`] for a whole series.
pub fn series_out_of_range(series: &Series, pair: &ThresholdPair) -> bool {
    is_out_of_range(&series.values, pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ph_axis() -> LinearAxis {
        // 4.0 at y=300, 10.0 at y=0: 50 px per pH unit.
        LinearAxis::new(AxisRange::new(4.0, 10.0), 0.0, 300.0)
    }

    #[test]
    fn test_linear_axis_roundtrip() {
        let axis = ph_axis();
        assert_eq!(axis.pixel_for_value(10.0), 0.0);
        assert_eq!(axis.pixel_for_value(4.0), 300.0);
        assert_eq!(axis.pixel_for_value(6.0), 200.0);
        assert_eq!(axis.value_for_pixel(100.0), 8.0);
    }

    #[test]
    fn test_pointer_down_within_tolerance() {
        let mut bars = ThresholdBars::new(ThresholdPair::new(6.0, 8.0), ph_axis().range());
        // Bar 0 at y=200, bar 1 at y=100.
        assert!(!bars.pointer_down(195.0, &ph_axis()));
        assert_eq!(bars.state(), DragState::Idle);
        assert!(bars.pointer_down(196.0, &ph_axis()));
        assert_eq!(bars.state(), DragState::Dragging(0));
    }

    #[test]
    fn test_pointer_down_last_bar_wins() {
        let mut bars = ThresholdBars::new(ThresholdPair::new(7.0, 7.02), ph_axis().range());
        assert!(bars.pointer_down(150.0, &ph_axis()));
        assert_eq!(bars.state(), DragState::Dragging(1));
    }

    #[test]
    fn test_drag_clamps_to_axis() {
        let axis = ph_axis();
        let mut bars = ThresholdBars::new(ThresholdPair::new(6.0, 8.0), axis.range());
        bars.pointer_down(100.0, &axis);
        assert_eq!(bars.pointer_move(-500.0, &axis), Some(10.0));
        assert_eq!(bars.pair().high_bar, 10.0);
        assert_eq!(bars.pointer_move(900.0, &axis), Some(4.0));
        assert_eq!(bars.pair().high_bar, 4.0);
        assert_eq!(bars.pair().low_bar, 6.0);
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let axis = ph_axis();
        let mut bars = ThresholdBars::new(ThresholdPair::new(6.0, 8.0), axis.range());
        assert_eq!(bars.pointer_move(50.0, &axis), None);
        assert_eq!(bars.pair(), ThresholdPair::new(6.0, 8.0));
    }

    #[test]
    fn test_pointer_up_releases_once() {
        let axis = ph_axis();
        let mut bars = ThresholdBars::new(ThresholdPair::new(6.0, 8.0), axis.range());
        bars.pointer_down(200.0, &axis);
        assert_eq!(bars.pointer_up(), Some(0));
        assert_eq!(bars.pointer_up(), None);
        assert!(!bars.is_dragging());
    }

    #[test]
    fn test_initial_bars_clamped() {
        let bars = ThresholdBars::new(ThresholdPair::new(2.0, 12.0), AxisRange::new(4.0, 10.0));
        assert_eq!(bars.pair(), ThresholdPair::new(4.0, 10.0));
    }

    #[test]
    fn test_nudge_clamps() {
        let range = AxisRange::new(4.0, 10.0);
        let mut bars = ThresholdBars::new(ThresholdPair::new(6.0, 8.0), range);
        assert_eq!(bars.nudge(1, 5.0, range), 10.0);
        assert_eq!(bars.nudge(0, -0.5, range), 5.5);
    }

    #[test]
    fn test_out_of_range_scenario() {
        let bars = ThresholdPair::new(6.0, 8.0);
        assert!(is_out_of_range(&[Some(5.9), Some(7.0), None], &bars));
        assert!(!is_out_of_range(&[Some(6.0), Some(8.0), None], &bars));
        assert!(is_out_of_range(&[Some(8.01)], &ThresholdPair::new(8.0, 6.0)));
    }

    #[test]
    fn test_degenerate_axis() {
        let axis = LinearAxis::new(AxisRange::new(5.0, 5.0), 0.0, 100.0);
        assert_eq!(axis.pixel_for_value(5.0), 100.0);
        let flat = LinearAxis::new(AxisRange::new(4.0, 10.0), 50.0, 50.0);
        assert_eq!(flat.value_for_pixel(50.0), 4.0);
    }
}
