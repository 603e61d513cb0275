use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::config::Theme;
use crate::labels::{LabelRegistry, DISRUPTION_LEGEND, SHOW_COLORS, SUBSET_LEGEND};

/// Show swatches and the abbreviation lists for both dimensions.
///
/// The area is cleared and reset before drawing, so styles from the
/// surrounding layout never bleed into the legend or out of it.
pub struct Legend<'a> {
    theme: &'a Theme,
    subsets: &'a LabelRegistry,
    disruptions: &'a LabelRegistry,
}

impl<'a> Legend<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            subsets: &SUBSET_LEGEND,
            disruptions: &DISRUPTION_LEGEND,
        }
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let heading = Style::reset().add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::styled("Shows", heading)];
        for (show, hex) in SHOW_COLORS {
            let swatch = self
                .theme
                .hex(hex)
                .map(|c| Style::reset().fg(c))
                .unwrap_or_else(Style::reset);
            lines.push(Line::from(vec![
                Span::styled("● ", swatch),
                Span::styled(show, Style::reset()),
            ]));
        }

        for (title, registry) in [
            ("Disruptions", self.disruptions),
            ("Subsets", self.subsets),
        ] {
            lines.push(Line::default());
            lines.push(Line::styled(title, heading));
            for meta in registry.entries() {
                lines.push(Line::from(vec![
                    Span::styled(meta.abbr, Style::reset().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" — {}", meta.full), Style::reset()),
                ]));
            }
        }
        lines
    }
}

impl Widget for Legend<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        buf.set_style(area, Style::reset());

        Paragraph::new(self.lines())
            .style(Style::reset())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Legend "))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_shows_then_both_dimensions() {
        let theme = Theme::default();
        let text: Vec<String> = Legend::new(&theme)
            .lines()
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(text[0], "Shows");
        assert_eq!(text[1], "● South Park");
        assert_eq!(text[5], "Disruptions");
        assert!(text.contains(&"C+PS — Cleaned and shuffled in 5 word increments".to_string()));
        let subsets = text.iter().position(|l| l == "Subsets").unwrap();
        assert_eq!(text[subsets + 1], "E — Emotion");
        assert_eq!(text.len(), subsets + 4);
    }

    #[test]
    fn legend_does_not_inherit_surrounding_style() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        buf.set_style(area, Style::default().add_modifier(Modifier::REVERSED));
        Legend::new(&theme).render(area, &mut buf);
        assert!(!buf[(2, 2)].modifier.contains(Modifier::REVERSED));
    }
}
