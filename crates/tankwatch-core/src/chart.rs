//! Chart sessions: per-metric series, threshold bars and overlay geometry.
//!
//! A [`ChartSession`] is what a renderer draws from. It holds the current
//! [`Series`], the draggable bars and the plot area the renderer reported, and
//! produces the overlay (bar lines and value readout boxes) in plot
//! coordinates. Series replacements are drawn immediately; there is no
//! transition animation.

use tankwatch_types::{Metric, Series, SeriesColor, ThresholdPair};

use crate::threshold::{self, AxisRange, DragState, LinearAxis, ThresholdBars, ValueAxis};

/// Static configuration of one chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    pub metric: Metric,
    pub axis: AxisRange,
    pub bars: ThresholdPair,
    pub color: SeriesColor,
    pub tolerance: f64,
    pub label: LabelStyle,
}

impl ChartConfig {
    /// Defaults: pH on 4..10 with bars at 6 and 8, temperature on 10..40
    /// with bars at 22 and 28.
    pub fn for_metric(metric: Metric) -> Self {
        let (axis, bars) = match metric {
            Metric::Ph => (AxisRange::new(4.0, 10.0), ThresholdPair::new(6.0, 8.0)),
            Metric::Temperature => (AxisRange::new(10.0, 40.0), ThresholdPair::new(22.0, 28.0)),
        };
        Self {
            metric,
            axis,
            bars,
            color: metric.color(),
            tolerance: threshold::DEFAULT_DRAG_TOLERANCE,
            label: LabelStyle::default(),
        }
    }

    pub fn with_axis(mut self, axis: AxisRange) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_bars(mut self, bars: ThresholdPair) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_label(mut self, label: LabelStyle) -> Self {
        self.label = label;
        self
    }
}

/// Plot area of a chart in renderer pixels, `y` growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

impl Default for PlotArea {
    fn default() -> Self {
        Self::new(0.0, 0.0, 600.0, 300.0)
    }
}

/// Size and placement of the value readout next to each bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    pub width: f64,
    pub height: f64,
    /// Gap between the box and the right edge of the plot area.
    pub margin: f64,
    pub precision: usize,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 20.0,
            margin: 5.0,
            precision: 2,
        }
    }
}

/// Rectangle of a value readout box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One threshold bar as it should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct BarOverlay {
    pub index: usize,
    pub value: f64,
    /// Vertical position of the line.
    pub y: f64,
    pub left: f64,
    pub right: f64,
    pub text: String,
    pub label_box: LabelBox,
    pub color: SeriesColor,
    pub dragging: bool,
}

/// What a renderer has to repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Redraw {
    /// Only the bar overlay changed.
    Overlay,
    /// The series changed.
    Full,
}

/// Rendering session of one metric.
#[derive(Debug, Clone)]
pub struct ChartSession {
    config: ChartConfig,
    series: Series,
    bars: ThresholdBars,
    area: PlotArea,
    pending: Option<Redraw>,
}

impl ChartSession {
    /// Create a session with an initial series.
    pub fn new(config: ChartConfig, series: Series) -> Self {
        let bars = ThresholdBars::new(config.bars, config.axis).with_tolerance(config.tolerance);
        Self {
            config,
            series,
            bars,
            area: PlotArea::default(),
            pending: Some(Redraw::Full),
        }
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn plot_area(&self) -> PlotArea {
        self.area
    }

    pub fn thresholds(&self) -> ThresholdPair {
        self.bars.pair()
    }

    pub fn drag_state(&self) -> DragState {
        self.bars.state()
    }

    /// Swap in a new series.
    pub fn replace_series(&mut self, series: Series) {
        self.series = series;
        self.request(Redraw::Full);
    }

    /// Record the plot area the renderer laid out.
    pub fn set_plot_area(&mut self, area: PlotArea) {
        if area != self.area {
            self.area = area;
            self.request(Redraw::Full);
        }
    }

    /// Axis mapping for the current plot area.
    pub fn axis(&self) -> LinearAxis {
        LinearAxis::new(self.config.axis, self.area.top, self.area.bottom)
    }

    /// Replace both bars, clamped to the axis.
    pub fn set_thresholds(&mut self, pair: ThresholdPair) {
        self.bars = ThresholdBars::new(pair, self.config.axis).with_tolerance(self.bars.tolerance());
        self.request(Redraw::Overlay);
    }

    pub fn pointer_down(&mut self, y: f64) -> bool {
        let axis = self.axis();
        self.bars.pointer_down(y, &axis)
    }

    /// Follow the pointer while dragging. Requests an overlay redraw only.
    pub fn pointer_move(&mut self, y: f64) -> Option<f64> {
        let axis = self.axis();
        let value = self.bars.pointer_move(y, &axis)?;
        self.request(Redraw::Overlay);
        Some(value)
    }

    pub fn pointer_up(&mut self) -> Option<usize> {
        self.bars.pointer_up()
    }

    /// Move a bar by `delta` in value units.
    pub fn nudge(&mut self, index: usize, delta: f64) -> f64 {
        let value = self.bars.nudge(index, delta, self.config.axis);
        self.request(Redraw::Overlay);
        value
    }

    /// Whether any present value lies outside the bars.
    pub fn evaluate(&self) -> bool {
        threshold::series_out_of_range(&self.series, &self.bars.pair())
    }

    /// Bar lines and readout boxes in plot coordinates.
    pub fn overlay(&self) -> Vec<BarOverlay> {
        let axis = self.axis();
        let style = self.config.label;
        let dragged = match self.bars.state() {
            DragState::Dragging(i) => Some(i),
            DragState::Idle => None,
        };
        self.bars
            .pair()
            .bars()
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let y = axis.pixel_for_value(value);
                BarOverlay {
                    index,
                    value,
                    y,
                    left: self.area.left,
                    right: self.area.right,
                    text: format!("{value:.prec$}", prec = style.precision),
                    label_box: LabelBox {
                        x: self.area.right - style.width - style.margin,
                        y: y - style.height / 2.0,
                        width: style.width,
                        height: style.height,
                    },
                    color: self.config.color,
                    dragging: dragged == Some(index),
                }
            })
            .collect()
    }

    /// Pending repaint, cleared on read.
    pub fn take_redraw(&mut self) -> Option<Redraw> {
        self.pending.take()
    }

    fn request(&mut self, redraw: Redraw) {
        self.pending = Some(self.pending.map_or(redraw, |p| p.max(redraw)));
    }
}
