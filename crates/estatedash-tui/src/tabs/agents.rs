//! Agent performance tab

use super::{Card, fmt_pct, header_row, rate_color, render_card_row, render_table};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::AgentReport;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Cell, Row},
};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    report: &AgentReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    let top = report
        .top(1)
        .first()
        .filter(|a| a.converted > 0)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| "-".to_string());
    let cards = [
        Card::new("Agents", report.total_agents.to_string(), Color::Cyan),
        Card::new("Active", report.active_agents.to_string(), Color::Green),
        Card::new(
            "Unassigned Leads",
            report.unassigned_leads.to_string(),
            if report.unassigned_leads > 0 {
                Color::Yellow
            } else {
                Color::DarkGray
            },
        ),
        Card::new("Top Performer", top, Color::Magenta).subtitle("most conversions"),
    ];
    render_card_row(frame, chunks[0], &cards);

    let rows: Vec<Row> = filter
        .apply(&report.agents)
        .into_iter()
        .map(|a| {
            let name_style = if a.is_active {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let overdue_style = if a.overdue_follow_ups > 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&a.name, filter.search()))).style(name_style),
                Cell::from(a.email.clone()),
                Cell::from(format!("{}/{}/{}", a.listings, a.active_listings, a.closed_listings)),
                Cell::from(a.leads.to_string()),
                Cell::from(a.converted.to_string()),
                Cell::from(a.lost.to_string()),
                Cell::from(fmt_pct(a.conversion_rate))
                    .style(Style::default().fg(rate_color(a.conversion_rate))),
                Cell::from(a.overdue_follow_ups.to_string()).style(overdue_style),
            ])
        })
        .collect();

    render_table(
        frame,
        chunks[1],
        "Agents",
        header_row(&[
            "Agent",
            "Email",
            "Listings (all/active/closed)",
            "Leads",
            "Won",
            "Lost",
            "Conv.",
            "Overdue",
        ]),
        rows,
        &[
            Constraint::Percentage(18),
            Constraint::Percentage(22),
            Constraint::Percentage(18),
            Constraint::Percentage(8),
            Constraint::Percentage(8),
            Constraint::Percentage(8),
            Constraint::Percentage(9),
            Constraint::Percentage(9),
        ],
        Some(selected),
    );
}
