//! Filter bar: free-text search box plus the active category chip

use estatedash_core::ReportFilter;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Renders a [`ReportFilter`]; the filter itself lives in the view state
pub struct FilterBar<'a> {
    filter: &'a ReportFilter,
    /// Search box has keyboard focus
    editing: bool,
    /// (shown, total) rows after filtering, when the tab has a table
    matches: Option<(usize, usize)>,
}

impl<'a> FilterBar<'a> {
    pub fn new(filter: &'a ReportFilter) -> Self {
        Self {
            filter,
            editing: false,
            matches: None,
        }
    }

    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    pub fn matches(mut self, matches: Option<(usize, usize)>) -> Self {
        self.matches = matches;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let query = self.filter.search();
        let mut spans = vec![Span::styled("/ ", Style::default().fg(Color::Cyan))];

        if query.is_empty() && !self.editing {
            spans.push(Span::styled(
                "search",
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::styled(
                query.to_string(),
                Style::default().fg(Color::White),
            ));
        }
        if self.editing {
            spans.push(Span::styled(
                "_",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }

        spans.push(Span::raw("   "));
        match self.filter.category() {
            Some(category) => spans.push(Span::styled(
                format!(" {} ", category),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
            None => spans.push(Span::styled(
                "c: category",
                Style::default().fg(Color::DarkGray),
            )),
        }

        if let Some((shown, total)) = self.matches {
            if self.filter.is_active() {
                spans.push(Span::styled(
                    format!("   {}/{} rows", shown, total),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }

        let border_color = if self.editing {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(Span::styled(
                    " Filter ",
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
        );
        frame.render_widget(paragraph, area);
    }
}

/// Split `text` into spans with case-insensitive matches of `query` highlighted
pub fn highlight_matches(text: &str, query: &str) -> Vec<Span<'static>> {
    let query = query.trim();
    let text_lower = text.to_lowercase();
    // Byte offsets from the lowered copy are only valid when lowering kept lengths
    if query.is_empty() || text_lower.len() != text.len() {
        return vec![Span::raw(text.to_string())];
    }

    let needle = query.to_lowercase();
    let hit = Style::default()
        .bg(Color::Yellow)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut last_end = 0;
    for (idx, _) in text_lower.match_indices(&needle) {
        let end = idx + needle.len();
        let (Some(before), Some(matched)) = (text.get(last_end..idx), text.get(idx..end)) else {
            continue;
        };
        if !before.is_empty() {
            spans.push(Span::raw(before.to_string()));
        }
        spans.push(Span::styled(matched.to_string(), hit));
        last_end = end;
    }
    if let Some(rest) = text.get(last_end..) {
        if !rest.is_empty() {
            spans.push(Span::raw(rest.to_string()));
        }
    }

    if spans.is_empty() {
        vec![Span::raw(text.to_string())]
    } else {
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_without_query() {
        assert_eq!(highlight_matches("Acme Realty", "").len(), 1);
        assert_eq!(highlight_matches("Acme Realty", "   ").len(), 1);
    }

    #[test]
    fn test_highlight_case_insensitive() {
        let spans = highlight_matches("Acme Realty", "REALTY");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].content, "Realty");
    }

    #[test]
    fn test_highlight_repeated_matches() {
        let spans = highlight_matches("ab ab ab", "ab");
        assert_eq!(spans.len(), 5);
    }

    #[test]
    fn test_highlight_no_match_keeps_text() {
        let spans = highlight_matches("Beta Estates", "zzz");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "Beta Estates");
    }
}
