//! Report tabs and the widgets they share

pub mod agencies;
pub mod agents;
pub mod campaigns;
pub mod followups;
pub mod funnel;
pub mod overview;
pub mod revenue;
pub mod site_visits;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Paragraph, Row, Sparkline, Table, TableState},
};

/// Bordered panel with a bold title
pub fn panel(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
}

/// Key figure card: centered value with a dim subtitle
pub fn render_stat_card(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: &str,
    color: Color,
    subtitle: &str,
) {
    let block = panel(title, color);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let value_widget = Paragraph::new(Line::from(Span::styled(
        value.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(value_widget, chunks[1]);

    let subtitle_widget = Paragraph::new(Line::from(Span::styled(
        subtitle.to_string(),
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(subtitle_widget, chunks[2]);
}

/// One stat card
pub struct Card {
    pub title: &'static str,
    pub value: String,
    pub color: Color,
    pub subtitle: String,
}

impl Card {
    pub fn new(title: &'static str, value: impl Into<String>, color: Color) -> Self {
        Self {
            title,
            value: value.into(),
            color,
            subtitle: String::new(),
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }
}

/// Cards side by side in equal widths
pub fn render_card_row(frame: &mut Frame, area: Rect, cards: &[Card]) {
    if cards.is_empty() {
        return;
    }
    let constraints: Vec<Constraint> = cards
        .iter()
        .map(|_| Constraint::Ratio(1, cards.len() as u32))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (card, chunk) in cards.iter().zip(chunks.iter()) {
        render_stat_card(frame, *chunk, card.title, &card.value, card.color, &card.subtitle);
    }
}

/// Placeholder for a panel with nothing to show
pub fn render_empty(frame: &mut Frame, area: Rect, title: &str, hint: &str) {
    let block = panel(title, Color::White);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No data available",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        area,
    );
}

pub fn header_row(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.to_vec()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

/// Table with an optional highlighted row, clamped to the row count
pub fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    header: Row<'static>,
    rows: Vec<Row<'static>>,
    widths: &[Constraint],
    selected: Option<usize>,
) {
    let count = rows.len();
    let table = Table::new(rows, widths.iter().copied())
        .header(header)
        .block(panel(&format!("{} ({})", title, count), Color::White))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if count > 0 {
        state.select(selected.map(|row| row.min(count - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

/// Bar chart of grouped counts
pub fn render_count_bars(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    counts: &[(String, usize)],
    color: Color,
) {
    if counts.iter().all(|(_, c)| *c == 0) {
        render_empty(frame, area, title, "Nothing recorded for this period");
        return;
    }

    let block = panel(title, color);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let data: Vec<(&str, u64)> = counts
        .iter()
        .map(|(label, count)| (label.as_str(), *count as u64))
        .collect();
    let bar_width = (inner.width / data.len().max(1) as u16)
        .saturating_sub(1)
        .clamp(3, 12);

    let chart = BarChart::default()
        .data(data.as_slice())
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(color))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )
        .label_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(chart, inner);
}

/// Sparkline over a time series' counts
pub fn render_trend(frame: &mut Frame, area: Rect, title: &str, counts: &[u64], color: Color) {
    if counts.is_empty() {
        render_empty(frame, area, title, "No activity in this period");
        return;
    }

    let block = panel(title, color);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let max = counts.iter().copied().max().unwrap_or(1).max(1);
    let sparkline = Sparkline::default()
        .data(counts)
        .max(max)
        .style(Style::default().fg(color));
    frame.render_widget(sparkline, inner);
}

/// Whole currency units with thousands separators
pub fn fmt_money(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

pub fn fmt_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn fmt_date(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Color for a 0-100 rate
pub fn rate_color(rate: f64) -> Color {
    if rate >= 50.0 {
        Color::Green
    } else if rate >= 20.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_money_groups_thousands() {
        assert_eq!(fmt_money(0.0), "0");
        assert_eq!(fmt_money(999.4), "999");
        assert_eq!(fmt_money(1_000.0), "1,000");
        assert_eq!(fmt_money(12_345_678.9), "12,345,679");
        assert_eq!(fmt_money(-4_500.0), "-4,500");
    }

    #[test]
    fn test_fmt_pct() {
        assert_eq!(fmt_pct(0.0), "0.0%");
        assert_eq!(fmt_pct(33.3), "33.3%");
    }

    #[test]
    fn test_rate_color_bands() {
        assert_eq!(rate_color(75.0), Color::Green);
        assert_eq!(rate_color(20.0), Color::Yellow);
        assert_eq!(rate_color(0.0), Color::Red);
    }
}
