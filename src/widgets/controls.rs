use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

/// Key-hint bar along the bottom of the screen.
pub struct Controls {
    pub row_count: Option<usize>,
    pub dimmed: bool,
    pub plot_focused: bool,
    pub bg: Color,
    pub status: Option<String>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            row_count: None,
            dimmed: false,
            plot_focused: false,
            bg: Color::DarkGray,
            status: None,
        }
    }
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.row_count = Some(row_count);
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_plot_focused(mut self, plot_focused: bool) -> Self {
        self.plot_focused = plot_focused;
        self
    }

    pub fn with_bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        if self.dimmed {
            &[("q", "Quit")]
        } else if self.plot_focused {
            &[
                ("Tab", "Grid"),
                ("[ ]", "Inspect"),
                ("e", "PNG"),
                ("E", "SVG"),
                ("?", "Help"),
                ("q", "Quit"),
            ]
        } else {
            &[
                ("Tab", "Plot"),
                ("↵", "Select"),
                ("t", "Transpose"),
                ("L", "Labels"),
                ("e", "Export"),
                ("?", "Help"),
                ("q", "Quit"),
            ]
        }
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let hints = self.hints();
        let mut constraints = hints.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(14)); // "Points: 12345"
        }

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        for (i, (key, action)) in hints.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(self.bg))
                .render(layout[j + 1], buf);
        }

        let fill_idx = hints.len() * 2;
        Paragraph::new(self.status.clone().unwrap_or_default())
            .style(base_style.bg(self.bg))
            .render(layout[fill_idx], buf);

        if let Some(count) = self.row_count {
            Paragraph::new(format!("Points: {}", count))
                .style(base_style.bg(self.bg))
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Modifier;

    fn render(controls: &Controls) -> Buffer {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        controls.render(area, &mut buf);
        buf
    }

    fn text(buf: &Buffer) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect()
    }

    #[test]
    fn keys_are_bold_and_points_shown() {
        let buf = render(&Controls::new().with_row_count(42));
        let line = text(&buf);
        assert!(line.contains("Transpose"));
        assert!(line.contains("Points: 42"));

        let x = line.find("Tab").unwrap() as u16;
        assert!(buf[(x, 0)].modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn error_screen_only_offers_quit() {
        let buf = render(&Controls::new().with_dimmed(true));
        let line = text(&buf);
        assert!(line.contains("Quit"));
        assert!(!line.contains("Help"));
    }
}
