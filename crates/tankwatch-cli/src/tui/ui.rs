//! Layout and rendering for the terminal dashboard.
//!
//! The screen is split into:
//!
//! - **Header**: source, selection and load state
//! - **Banner**: blinking red line while any chart is out of range
//! - **Charts**: pH (left) and temperature (right)
//! - **Status bar**: last alert event and key hints

use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph};

use tankwatch_core::{ChartSession, PlotArea};
use tankwatch_types::{Metric, SeriesColor};

use super::app::{App, LoadState};

const BORDER_TYPE: BorderType = BorderType::Rounded;
const TEXT_MUTED: Color = Color::Rgb(100, 116, 139);
const PRIMARY: Color = Color::Rgb(34, 211, 238);

/// Rows taken by the x-axis line and its labels below the plot.
const X_AXIS_ROWS: u16 = 2;

/// Screen regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiLayout {
    pub header: Rect,
    pub banner: Rect,
    pub charts: [Rect; 2],
    pub status: Rect,
}

/// Split the terminal area.
pub fn layout(area: Rect) -> UiLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Banner
            Constraint::Min(6),    // Charts
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    UiLayout {
        header: rows[0],
        banner: rows[1],
        charts: [charts[0], charts[1]],
        status: rows[3],
    }
}

/// Plot area of a chart drawn in `area`, in terminal cells.
///
/// Excludes the border and the x-axis rows; `bottom` is the last plot row.
pub fn plot_area(area: Rect) -> PlotArea {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    let bottom = inner.bottom().saturating_sub(X_AXIS_ROWS + 1).max(inner.y);
    PlotArea::new(
        f64::from(inner.x),
        f64::from(inner.y),
        f64::from(inner.right()),
        f64::from(bottom),
    )
}

fn color(color: SeriesColor) -> Color {
    match color {
        SeriesColor::Red => Color::Red,
        SeriesColor::Blue => Color::Blue,
        SeriesColor::Grey => Color::DarkGray,
    }
}

/// Draw the complete interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let ui = layout(frame.area());

    draw_header(frame, ui.header, app);
    draw_banner(frame, ui.banner, app);

    if app.dashboard.is_ready() {
        for (metric, area) in Metric::ALL.into_iter().zip(ui.charts) {
            if let Some(chart) = app.dashboard.chart(metric) {
                draw_chart(frame, area, chart, app.focus == metric);
            }
        }
    } else {
        let text = match &app.load_state {
            LoadState::Failed(error) => format!("Failed to load {}: {}", app.source, error),
            _ => format!("Loading sensor data from {}...", app.source),
        };
        let loading = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(TEXT_MUTED));
        let area = ui.charts[0].union(ui.charts[1]);
        let middle = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
        frame.render_widget(loading, middle);
    }

    draw_status_bar(frame, ui.status, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let selection = app.dashboard.selection();
    let spans = vec![
        Span::styled(" tankwatch ", Style::default().fg(PRIMARY).bold()),
        Span::styled(
            format!("{} ", app.source),
            Style::default().fg(TEXT_MUTED),
        ),
        Span::raw(format!(
            "| {} | {} | {} | fill: {}",
            selection.granularity,
            selection.tank_id,
            app.load_state.label(),
            app.dashboard.fill()
        )),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_banner(frame: &mut Frame, area: Rect, app: &App) {
    let Some(text) = app.banner_text() else {
        return;
    };
    let banner = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        );
    frame.render_widget(banner, area);
}

fn draw_chart(frame: &mut Frame, area: Rect, chart: &ChartSession, focused: bool) {
    let config = chart.config();
    let series = chart.series();
    let bar_color = color(config.color);

    let border_color = if focused { bar_color } else { TEXT_MUTED };
    let block = Block::default()
        .title(format!(" {} ({}) ", series.metric_name, series.metric.chart_id()))
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(Style::default().fg(border_color));

    let last = series.len().saturating_sub(1) as f64;
    let points: Vec<(f64, f64)> = series
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect();
    let overlay = chart.overlay();
    let bar_lines: Vec<[(f64, f64); 2]> = overlay
        .iter()
        .map(|bar| [(0.0, bar.value), (last, bar.value)])
        .collect();

    let mut datasets = vec![
        Dataset::default()
            .name(series.metric_name.clone())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color(series.color)))
            .data(&points),
    ];
    for (bar, line) in overlay.iter().zip(&bar_lines) {
        let mut style = Style::default().fg(bar_color);
        if bar.dragging {
            style = style.add_modifier(Modifier::BOLD);
        }
        datasets.push(
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(style)
                .data(line),
        );
    }

    let x_labels: Vec<Line> = match (series.labels.first(), series.labels.last()) {
        (Some(first), Some(end)) => {
            let mid = &series.labels[series.labels.len() / 2];
            vec![first.clone().into(), mid.clone().into(), end.clone().into()]
        }
        _ => Vec::new(),
    };
    let (min, max) = (config.axis.min, config.axis.max);
    let y_labels: Vec<Line> = vec![
        format!("{min:.1}").into(),
        format!("{:.1}", (min + max) / 2.0).into(),
        format!("{max:.1}").into(),
    ];

    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(TEXT_MUTED))
                .bounds([0.0, last.max(1.0)])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(TEXT_MUTED))
                .bounds([min, max])
                .labels(y_labels),
        );
    frame.render_widget(widget, area);

    // Value readouts at the right edge of the plot area, in the bar color.
    for bar in &overlay {
        let row = bar.y.round();
        if row < f64::from(area.y) || row >= f64::from(area.bottom()) {
            continue;
        }
        let x = bar.label_box.x.max(f64::from(area.x)) as u16;
        let width = (bar.label_box.width as u16).min(area.right().saturating_sub(x));
        let rect = Rect::new(x, row as u16, width, 1);
        let readout = Paragraph::new(bar.text.clone())
            .alignment(Alignment::Right)
            .style(Style::default().fg(bar_color).bg(Color::Black));
        frame.render_widget(readout, rect);
    }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::raw(" ")];
    if let Some(event) = app.last_event() {
        spans.push(Span::styled(event, Style::default().fg(PRIMARY)));
        spans.push(Span::styled(" | ", Style::default().fg(TEXT_MUTED)));
    }
    let hints = [
        ("m/h/d", "unit"),
        ("1-9", "tank"),
        ("Tab", "focus"),
        ("↑↓ PgUp/PgDn", "bars"),
        ("r", "reload"),
        ("q", "quit"),
    ];
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ", Style::default().fg(TEXT_MUTED)));
        }
        spans.push(Span::styled(*key, Style::default().bold()));
        spans.push(Span::styled(format!(" {desc}"), Style::default().fg(TEXT_MUTED)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_splits_charts() {
        let ui = layout(Rect::new(0, 0, 100, 30));
        assert_eq!(ui.header.height, 1);
        assert_eq!(ui.banner.y, 1);
        assert_eq!(ui.charts[0].width + ui.charts[1].width, 100);
        assert_eq!(ui.charts[0].height, 27);
        assert_eq!(ui.status.y, 29);
    }

    #[test]
    fn test_plot_area_excludes_border_and_axis() {
        let area = plot_area(Rect::new(0, 2, 50, 27));
        assert_eq!(area.top, 3.0);
        assert_eq!(area.bottom, 28.0 - 3.0);
        assert_eq!(area.left, 1.0);
        assert_eq!(area.right, 49.0);
    }
}
