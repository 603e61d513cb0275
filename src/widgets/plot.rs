//! Scatter view for the selected condition, with a hover tooltip.

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, StatefulWidget, Widget,
    },
};

use crate::config::Theme;
use crate::labels::{show_color, LabelRegistry};
use crate::plot::{PlotBounds, PlotData};

/// Padding around the data bounds, as a fraction of the span.
const BOUNDS_PADDING: f64 = 0.05;
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

#[derive(Debug, Default)]
pub struct PlotState {
    /// Index into `PlotData::points` of the point shown in the tooltip.
    pub hovered: Option<usize>,
    /// Drawable graph area of the last frame (inside the axes).
    graph_area: Rect,
    bounds: Option<PlotBounds>,
}

impl PlotState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Hover the point nearest to terminal position (x, y). Returns whether
    /// the hovered point changed. Positions outside the graph clear the hover.
    pub fn hover_at(&mut self, data: &PlotData, x: u16, y: u16) -> bool {
        let previous = self.hovered;
        self.hovered = match self.bounds {
            Some(b) if self.graph_area.contains(Position::new(x, y)) => {
                let area = self.graph_area;
                let x_span = b.x_max - b.x_min;
                let y_span = b.y_max - b.y_min;
                let fx = (x - area.x) as f64 + 0.5;
                let fy = (y - area.y) as f64 + 0.5;
                let data_x = b.x_min + fx / area.width as f64 * x_span;
                let data_y = b.y_max - fy / area.height as f64 * y_span;
                data.nearest(
                    data_x,
                    data_y,
                    area.width as f64 / x_span,
                    area.height as f64 * CELL_ASPECT / y_span,
                )
            }
            _ => None,
        };
        self.hovered != previous
    }

    /// Step the inspected point forward or backward, wrapping around.
    pub fn step(&mut self, data: &PlotData, delta: isize) {
        let len = data.points.len();
        if len == 0 {
            self.hovered = None;
            return;
        }
        let next = match self.hovered {
            None if delta < 0 => len - 1,
            None => 0,
            Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
        };
        self.hovered = Some(next);
    }
}

pub struct ScatterPlot<'a> {
    data: &'a PlotData,
    theme: &'a Theme,
    subsets: &'a LabelRegistry,
    disruptions: &'a LabelRegistry,
    marker: Marker,
    focused: bool,
}

impl<'a> ScatterPlot<'a> {
    pub fn new(
        data: &'a PlotData,
        theme: &'a Theme,
        subsets: &'a LabelRegistry,
        disruptions: &'a LabelRegistry,
    ) -> Self {
        Self {
            data,
            theme,
            subsets,
            disruptions,
            marker: Marker::Braille,
            focused: false,
        }
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn title(&self) -> String {
        format!(
            "Selection: {} / {}",
            self.subsets.full(&self.data.key.subset),
            self.disruptions.full(&self.data.key.disruption)
        )
    }

    fn render_tooltip(&self, index: usize, state: &PlotState, within: Rect, buf: &mut Buffer) {
        let (Some(point), Some(b)) = (self.data.points.get(index), state.bounds) else {
            return;
        };
        let area = state.graph_area;
        let px = area.x as f64
            + (point.x - b.x_min) / (b.x_max - b.x_min) * area.width.saturating_sub(1) as f64;
        let py = area.y as f64
            + (b.y_max - point.y) / (b.y_max - b.y_min) * area.height.saturating_sub(1) as f64;

        let mut lines = vec![Line::from(Span::styled(
            point.show.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.extend(
            point
                .tooltip
                .iter()
                .map(|(name, value)| Line::from(format!("{}: {}", name, value))),
        );
        let width = lines.iter().map(|l| l.width() as u16).max().unwrap_or(0) + 2;
        let height = lines.len() as u16 + 2;
        if width > within.width || height > within.height {
            return;
        }

        // Right of and below the point, flipped to stay inside the plot.
        let mut x = px.round() as u16 + 2;
        if x + width > within.right() {
            x = (px.round() as u16).saturating_sub(width + 1).max(within.x);
        }
        let mut y = py.round() as u16 + 1;
        if y + height > within.bottom() {
            y = within.bottom().saturating_sub(height).max(within.y);
        }
        let popup = Rect::new(x, y, width, height);

        Clear.render(popup, buf);
        Paragraph::new(lines)
            .style(Style::default().fg(self.theme.get("text_primary")))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.get("modal_border"))),
            )
            .render(popup, buf);
    }
}

fn axis_labels(lo: f64, hi: f64, style: Style) -> Vec<Span<'static>> {
    [lo, (lo + hi) / 2.0, hi]
        .iter()
        .map(|v| Span::styled(format!("{:.1}", v), style))
        .collect()
}

impl StatefulWidget for ScatterPlot<'_> {
    type State = PlotState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut PlotState) {
        let border = if self.focused { "cursor" } else { "grid_border" };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title()))
            .border_style(Style::default().fg(self.theme.get(border)));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(bounds) = self.data.bounds().map(|b| b.padded(BOUNDS_PADDING)) else {
            state.bounds = None;
            state.graph_area = Rect::default();
            state.hovered = None;
            Paragraph::new("No points for this selection")
                .style(Style::default().fg(self.theme.get("dimmed")))
                .centered()
                .render(inner, buf);
            return;
        };

        let label_style = Style::default().fg(self.theme.get("text_primary"));
        let x_labels = axis_labels(bounds.x_min, bounds.x_max, label_style);
        let y_labels = axis_labels(bounds.y_min, bounds.y_max, label_style);
        let y_label_width = y_labels.iter().map(|s| s.width() as u16).max().unwrap_or(0);

        let fallback = self.theme.get("series_fallback");
        let mut datasets: Vec<Dataset> = self
            .data
            .groups
            .iter()
            .map(|group| {
                let color = show_color(&group.show)
                    .and_then(|hex| self.theme.hex(hex))
                    .unwrap_or(fallback);
                Dataset::default()
                    .name(group.show.clone())
                    .marker(self.marker)
                    .graph_type(GraphType::Scatter)
                    .style(Style::default().fg(color))
                    .data(&group.points)
            })
            .collect();

        let hovered_point: Vec<(f64, f64)> = state
            .hovered
            .and_then(|i| self.data.points.get(i))
            .map(|p| vec![(p.x, p.y)])
            .unwrap_or_default();
        if !hovered_point.is_empty() {
            datasets.push(
                Dataset::default()
                    .marker(Marker::Block)
                    .graph_type(GraphType::Scatter)
                    .style(Style::default().fg(self.theme.get("cursor")))
                    .data(&hovered_point),
            );
        }

        let axis_style = Style::default().fg(self.theme.get("dimmed"));
        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("UMAP1")
                    .style(axis_style)
                    .bounds([bounds.x_min, bounds.x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("UMAP2")
                    .style(axis_style)
                    .bounds([bounds.y_min, bounds.y_max])
                    .labels(y_labels),
            )
            .legend_position(None)
            .render(inner, buf);

        // Chart reserves the y labels plus the axis line on the left and the
        // x labels plus the axis line at the bottom.
        let left = y_label_width + 1;
        state.graph_area = Rect::new(
            inner.x + left.min(inner.width),
            inner.y,
            inner.width.saturating_sub(left),
            inner.height.saturating_sub(2),
        );
        state.bounds = Some(bounds);

        if let Some(i) = state.hovered {
            self.render_tooltip(i, state, inner, buf);
        }
    }
}
