//! Follow-up compliance tab

use super::{Card, fmt_date, fmt_pct, header_row, rate_color, render_card_row, render_table};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::FollowUpReport;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Cell, Row},
};
use std::collections::HashMap;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    report: &FollowUpReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    let cards = [
        Card::new("Scheduled", report.scheduled.to_string(), Color::Cyan),
        Card::new("Due", report.due.to_string(), Color::White),
        Card::new("Overdue", report.overdue.to_string(), Color::Red),
        Card::new("Due Today", report.due_today.to_string(), Color::Yellow),
        Card::new("Upcoming", report.upcoming.to_string(), Color::Blue),
        Card::new(
            "Compliance",
            fmt_pct(report.compliance_rate),
            rate_color(report.compliance_rate),
        )
        .subtitle("due and handled"),
    ];
    render_card_row(frame, chunks[0], &cards);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    let agent_names: HashMap<&str, &str> = report
        .by_agent
        .iter()
        .map(|a| (a.agent_id.as_str(), a.name.as_str()))
        .collect();

    let rows: Vec<Row> = filter
        .apply(&report.overdue_leads)
        .into_iter()
        .map(|l| {
            let agent = agent_names
                .get(l.agent_id.as_str())
                .copied()
                .unwrap_or("unassigned");
            let days_style = match l.days_overdue {
                d if d > 7 => Style::default().fg(Color::Red),
                d if d > 2 => Style::default().fg(Color::Yellow),
                _ => Style::default(),
            };
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&l.name, filter.search()))),
                Cell::from(l.phone.clone()),
                Cell::from(agent.to_string()),
                Cell::from(fmt_date(l.follow_up_date)),
                Cell::from(l.days_overdue.to_string()).style(days_style),
            ])
        })
        .collect();
    render_table(
        frame,
        body[0],
        "Overdue Follow-ups",
        header_row(&["Lead", "Phone", "Agent", "Follow-up", "Days"]),
        rows,
        &[
            Constraint::Percentage(26),
            Constraint::Percentage(18),
            Constraint::Percentage(20),
            Constraint::Percentage(24),
            Constraint::Percentage(12),
        ],
        Some(selected),
    );

    let agents: Vec<Row> = report
        .by_agent
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(a.name.clone()),
                Cell::from(a.due.to_string()),
                Cell::from(a.overdue.to_string()),
                Cell::from(fmt_pct(a.compliance_rate))
                    .style(Style::default().fg(rate_color(a.compliance_rate))),
            ])
        })
        .collect();
    render_table(
        frame,
        body[1],
        "By Agent",
        header_row(&["Agent", "Due", "Overdue", "Rate"]),
        agents,
        &[
            Constraint::Percentage(40),
            Constraint::Percentage(18),
            Constraint::Percentage(20),
            Constraint::Percentage(22),
        ],
        None,
    );
}
