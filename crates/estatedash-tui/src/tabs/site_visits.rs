//! Site visit tab

use super::{
    Card, fmt_date, fmt_pct, header_row, rate_color, render_card_row, render_count_bars,
    render_table,
};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::SiteVisitReport;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    text::Line,
    widgets::{Cell, Row},
};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    report: &SiteVisitReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    let cards = [
        Card::new("Visits", report.total.to_string(), Color::Cyan),
        Card::new("Completed", report.completed.to_string(), Color::Green),
        Card::new("No-shows", report.no_show.to_string(), Color::Red),
        Card::new(
            "Show-up Rate",
            fmt_pct(report.show_up_rate),
            rate_color(report.show_up_rate),
        ),
        Card::new(
            "Visit → Won",
            fmt_pct(report.visit_conversion_rate),
            rate_color(report.visit_conversion_rate),
        )
        .subtitle(format!("{} converted", report.converted_after_visit)),
    ];
    render_card_row(frame, chunks[0], &cards);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    let outcomes = vec![
        ("scheduled".to_string(), report.scheduled),
        ("completed".to_string(), report.completed),
        ("cancelled".to_string(), report.cancelled),
        ("no-show".to_string(), report.no_show),
        ("pending".to_string(), report.pending),
    ];
    render_count_bars(frame, body[0], "Outcomes", &outcomes, Color::Cyan);

    let rows: Vec<Row> = filter
        .apply(&report.upcoming)
        .into_iter()
        .map(|v| {
            let agent = if v.agent_id.is_empty() {
                "unassigned".to_string()
            } else {
                v.agent_id.clone()
            };
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&v.name, filter.search()))),
                Cell::from(agent),
                Cell::from(fmt_date(v.scheduled_date)),
            ])
        })
        .collect();
    render_table(
        frame,
        body[1],
        "Upcoming Visits",
        header_row(&["Lead", "Agent", "Scheduled"]),
        rows,
        &[
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Percentage(35),
        ],
        Some(selected),
    );
}
