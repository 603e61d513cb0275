//! Score grid view: pinned label column, gradient cells, keyboard cursor and
//! mouse hit-testing.

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, StatefulWidget, Widget},
};

use crate::config::Theme;
use crate::pivot::{format_value, PivotGrid};
use crate::selection::{CellKey, Selection};

/// Darkening applied to the selected cell's fill.
const SELECTED_DARKEN: f64 = 0.7;
/// Widest cell text: a bracketed value such as "[-0.123]".
const MIN_CELL_WIDTH: u16 = 8;

#[derive(Debug, Default)]
pub struct GridState {
    /// (row, column) of the keyboard cursor.
    pub cursor: (usize, usize),
    row_offset: usize,
    col_offset: usize,
    /// Data cells drawn in the last frame, for mouse hit-testing.
    cell_areas: Vec<(Rect, usize, usize)>,
}

impl GridState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_cursor(&mut self, grid: &PivotGrid, d_row: isize, d_col: isize) {
        let clamp = |v: usize, d: isize, len: usize| -> usize {
            if len == 0 {
                return 0;
            }
            v.saturating_add_signed(d).min(len - 1)
        };
        self.cursor = (
            clamp(self.cursor.0, d_row, grid.num_rows()),
            clamp(self.cursor.1, d_col, grid.num_columns()),
        );
    }

    pub fn set_cursor(&mut self, grid: &PivotGrid, row: usize, col: usize) {
        self.cursor = (
            row.min(grid.num_rows().saturating_sub(1)),
            col.min(grid.num_columns().saturating_sub(1)),
        );
    }

    /// Grid position of the data cell drawn at terminal position (x, y).
    pub fn cell_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        self.cell_areas
            .iter()
            .find(|(rect, _, _)| rect.contains(Position::new(x, y)))
            .map(|(_, r, c)| (*r, *c))
    }

    /// Canonical pair under the cursor (empty for an empty cell).
    pub fn cursor_key(&self, grid: &PivotGrid) -> CellKey {
        grid.resolve(self.cursor.0, self.cursor.1)
    }
}

/// Smallest offset that keeps `cursor` inside a window of `visible` items.
fn scroll_into_view(offset: usize, cursor: usize, visible: usize) -> usize {
    if visible == 0 {
        offset
    } else if cursor < offset {
        cursor
    } else if cursor >= offset + visible {
        cursor + 1 - visible
    } else {
        offset
    }
}

fn fit(text: &str, width: u16) -> String {
    let width = width as usize;
    let len = text.chars().count();
    if len <= width {
        format!("{:^width$}", text, width = width)
    } else {
        text.chars().take(width).collect()
    }
}

fn label_width(grid: &PivotGrid) -> u16 {
    grid.rows
        .iter()
        .map(|r| r.label.chars().count() as u16)
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

fn cell_width(grid: &PivotGrid, col: usize) -> u16 {
    let label = grid.columns[col].label.chars().count() as u16;
    label.max(MIN_CELL_WIDTH) + 2
}

/// (width, height) needed to draw every cell, borders included.
pub fn preferred_size(grid: &PivotGrid) -> (u16, u16) {
    let width = (0..grid.num_columns())
        .map(|c| cell_width(grid, c))
        .fold(label_width(grid), u16::saturating_add);
    (width + 2, grid.num_rows() as u16 + 3)
}

pub struct ScoreGrid<'a> {
    grid: &'a PivotGrid,
    selection: &'a Selection,
    theme: &'a Theme,
    focused: bool,
}

impl<'a> ScoreGrid<'a> {
    pub fn new(grid: &'a PivotGrid, selection: &'a Selection, theme: &'a Theme) -> Self {
        Self {
            grid,
            selection,
            theme,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn cell_style(&self, row: usize, col: usize, selected: bool) -> Style {
        match self.grid.cell_color(row, col) {
            Some(rgb) => {
                let rgb = if selected {
                    rgb.darken(SELECTED_DARKEN)
                } else {
                    rgb
                };
                let style = Style::default()
                    .bg(self.theme.rgb(rgb.0, rgb.1, rgb.2))
                    .fg(self.theme.get("text_inverse"));
                if selected {
                    style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    style
                }
            }
            None => Style::default().fg(self.theme.get("dimmed")),
        }
    }
}

impl StatefulWidget for ScoreGrid<'_> {
    type State = GridState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut GridState) {
        state.cell_areas.clear();

        let border = if self.focused { "cursor" } else { "grid_border" };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Silhouette scores ")
            .border_style(Style::default().fg(self.theme.get(border)));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height < 2 || self.grid.num_rows() == 0 {
            return;
        }

        let label_width = label_width(self.grid).min(inner.width);
        let width_of = |col: usize| cell_width(self.grid, col);

        let visible_rows = (inner.height - 1) as usize;
        state.row_offset = scroll_into_view(state.row_offset, state.cursor.0, visible_rows);

        // Columns that fit to the right of the pinned label column, starting at col_offset.
        let data_width = inner.width - label_width;
        let fitting = |offset: usize| -> usize {
            let mut used = 0u16;
            let mut n = 0;
            for col in offset..self.grid.num_columns() {
                used = used.saturating_add(width_of(col));
                if used > data_width {
                    break;
                }
                n += 1;
            }
            n.max(1)
        };
        if state.cursor.1 < state.col_offset {
            state.col_offset = state.cursor.1;
        }
        while state.cursor.1 >= state.col_offset + fitting(state.col_offset) {
            state.col_offset += 1;
        }
        let visible_cols = fitting(state.col_offset).min(self.grid.num_columns() - state.col_offset);

        let header_style = Style::default()
            .fg(self.theme.get("grid_header"))
            .add_modifier(Modifier::BOLD);
        let label_style = Style::default()
            .fg(self.theme.get("text_primary"))
            .add_modifier(Modifier::BOLD);

        let mut x = inner.x + label_width;
        let mut col_x = Vec::with_capacity(visible_cols);
        for col in state.col_offset..state.col_offset + visible_cols {
            let w = width_of(col).min(inner.right().saturating_sub(x));
            buf.set_string(x, inner.y, fit(&self.grid.columns[col].label, w), header_style);
            col_x.push((col, x, w));
            x = x.saturating_add(w);
        }

        let last_row = (state.row_offset + visible_rows).min(self.grid.num_rows());
        for (i, row) in (state.row_offset..last_row).enumerate() {
            let y = inner.y + 1 + i as u16;
            let label = &self.grid.rows[row].label;
            buf.set_string(
                inner.x,
                y,
                format!("{:<width$}", label, width = label_width as usize),
                label_style,
            );

            for &(col, cx, w) in &col_x {
                // Only cells with a value carry the highlight.
                let selected = self.grid.value(row, col).is_some()
                    && self.grid.is_cell_selected(row, col, self.selection);
                let mut style = self.cell_style(row, col, selected);
                if self.focused && state.cursor == (row, col) {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let text = match self.grid.value(row, col) {
                    Some(_) if selected => format!("[{}]", format_value(self.grid.value(row, col))),
                    value => format_value(value),
                };
                let rect = Rect::new(cx, y, w, 1);
                buf.set_style(rect, style);
                buf.set_string(cx, y, fit(&text, w), style);
                state.cell_areas.push((rect, row, col));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{LabelStyle, DISRUPTIONS, SUBSETS};
    use crate::loader::{DISRUPTION, SIL_SCORE, SUBSET};
    use crate::pivot::Orientation;
    use polars::df;

    fn sample_grid() -> PivotGrid {
        let scores = df!(
            SUBSET => ["Emotion", "Topics"],
            DISRUPTION => ["RAW", "C"],
            SIL_SCORE => [0.4567, 0.1]
        )
        .unwrap();
        PivotGrid::build(
            &scores,
            &SUBSETS,
            &DISRUPTIONS,
            Orientation::SubsetRows,
            LabelStyle::Abbr,
        )
        .unwrap()
    }

    fn render(grid: &PivotGrid, selection: &Selection, state: &mut GridState) -> Buffer {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        ScoreGrid::new(grid, selection, &theme)
            .focused(true)
            .render(area, &mut buf, state);
        buf
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn renders_values_and_brackets_selection() {
        let grid = sample_grid();
        let selection = Selection::init(&SUBSETS, &DISRUPTIONS);
        let mut state = GridState::new();
        let buf = render(&grid, &selection, &mut state);

        assert!(row_text(&buf, 1).contains("Raw"));
        assert!(row_text(&buf, 2).contains("[0.457]"));
        assert!(row_text(&buf, 4).contains("0.100"));
        assert!(!row_text(&buf, 4).contains("[0.100]"));
    }

    #[test]
    fn hit_testing_maps_back_to_grid_positions() {
        let grid = sample_grid();
        let selection = Selection::init(&SUBSETS, &DISRUPTIONS);
        let mut state = GridState::new();
        render(&grid, &selection, &mut state);

        let (rect, row, col) = state.cell_areas[1];
        assert_eq!(state.cell_at(rect.x, rect.y), Some((row, col)));
        assert_eq!(state.cell_at(0, 0), None);
    }

    #[test]
    fn cursor_is_clamped() {
        let grid = sample_grid();
        let mut state = GridState::new();
        state.move_cursor(&grid, -1, -1);
        assert_eq!(state.cursor, (0, 0));
        state.move_cursor(&grid, 100, 100);
        assert_eq!(state.cursor, (6, 4));
        state.set_cursor(&grid, 2, 1);
        assert_eq!(state.cursor_key(&grid), CellKey::new("Topics", "C"));
        state.set_cursor(&grid, 0, 1);
        assert_eq!(state.cursor_key(&grid), CellKey::empty());
    }

    #[test]
    fn preferred_size_fits_all_cells() {
        let grid = sample_grid();
        assert_eq!(preferred_size(&grid), (60, 10));
    }

    #[test]
    fn scrolling_keeps_cursor_visible() {
        assert_eq!(scroll_into_view(0, 5, 3), 3);
        assert_eq!(scroll_into_view(4, 2, 3), 2);
        assert_eq!(scroll_into_view(1, 2, 3), 1);
    }
}
