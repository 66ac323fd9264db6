//! Agency health tab

use super::{Card, fmt_pct, header_row, render_card_row, render_table};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::{AgencyReport, HealthStatus};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Cell, Row},
};

fn health_color(health: HealthStatus) -> Color {
    match health {
        HealthStatus::Good => Color::Green,
        HealthStatus::Average => Color::Yellow,
        HealthStatus::Poor => Color::Red,
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    report: &AgencyReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    let cards = [
        Card::new("Good", report.good.to_string(), Color::Green).subtitle("active, staffed, >5 leads"),
        Card::new("Average", report.average.to_string(), Color::Yellow),
        Card::new("Poor", report.poor.to_string(), Color::Red),
        Card::new("Inactive", report.inactive.to_string(), Color::DarkGray),
    ];
    render_card_row(frame, chunks[0], &cards);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(chunks[1]);

    let rows: Vec<Row> = filter
        .apply(&report.agencies)
        .into_iter()
        .map(|a| {
            let last_seen = a
                .days_since_activity
                .map(|d| format!("{}d ago", d))
                .unwrap_or_else(|| "never".to_string());
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&a.name, filter.search()))),
                Cell::from(if a.is_active { "active" } else { "inactive" }),
                Cell::from(a.agents.to_string()),
                Cell::from(a.properties.to_string()),
                Cell::from(a.leads.to_string()),
                Cell::from(fmt_pct(a.conversion_rate)),
                Cell::from(a.health.label()).style(
                    Style::default()
                        .fg(health_color(a.health))
                        .add_modifier(Modifier::BOLD),
                ),
                Cell::from(last_seen),
            ])
        })
        .collect();
    render_table(
        frame,
        body[0],
        "Agencies",
        header_row(&[
            "Agency", "Status", "Agents", "Listings", "Leads", "Conv.", "Health", "Last Activity",
        ]),
        rows,
        &[
            Constraint::Percentage(24),
            Constraint::Percentage(10),
            Constraint::Percentage(9),
            Constraint::Percentage(10),
            Constraint::Percentage(9),
            Constraint::Percentage(10),
            Constraint::Percentage(12),
            Constraint::Percentage(16),
        ],
        Some(selected),
    );

    let ranking: Vec<Row> = report
        .activity_ranking
        .iter()
        .enumerate()
        .map(|(i, a)| {
            Row::new(vec![
                format!("{}.", i + 1),
                a.name.clone(),
                a.activity().to_string(),
            ])
        })
        .collect();
    render_table(
        frame,
        body[1],
        "Most Active",
        header_row(&["#", "Agency", "Activity"]),
        ranking,
        &[
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(9),
        ],
        None,
    );
}
