//! Campaign performance tab

use super::{
    Card, fmt_money, fmt_pct, header_row, rate_color, render_card_row, render_count_bars,
    render_table,
};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::CampaignReport;
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
    report: &CampaignReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(10),
        ])
        .split(area);

    let cards = [
        Card::new("Campaigns", report.campaigns.len().to_string(), Color::Cyan),
        Card::new("Leads", report.total_leads.to_string(), Color::Magenta),
        Card::new("Revenue", fmt_money(report.total_revenue), Color::Green)
            .subtitle("budgets of won leads"),
        Card::new(
            "Best Campaign",
            report.best_campaign.clone().unwrap_or_else(|| "-".to_string()),
            Color::Yellow,
        ),
    ];
    render_card_row(frame, chunks[0], &cards);

    let rows: Vec<Row> = filter
        .apply(&report.campaigns)
        .into_iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&c.campaign, filter.search()))),
                Cell::from(c.leads.to_string()),
                Cell::from(c.site_visits.to_string()),
                Cell::from(c.converted.to_string()),
                Cell::from(c.lost.to_string()),
                Cell::from(fmt_pct(c.conversion_rate))
                    .style(Style::default().fg(rate_color(c.conversion_rate))),
                Cell::from(fmt_money(c.revenue)),
                Cell::from(fmt_money(c.revenue_per_lead)),
            ])
        })
        .collect();
    render_table(
        frame,
        chunks[1],
        "Campaigns",
        header_row(&[
            "Campaign", "Leads", "Visits", "Won", "Lost", "Conv.", "Revenue", "Per Lead",
        ]),
        rows,
        &[
            Constraint::Percentage(24),
            Constraint::Percentage(9),
            Constraint::Percentage(9),
            Constraint::Percentage(9),
            Constraint::Percentage(9),
            Constraint::Percentage(10),
            Constraint::Percentage(16),
            Constraint::Percentage(14),
        ],
        Some(selected),
    );

    let leads: Vec<(String, usize)> = report
        .campaigns
        .iter()
        .take(8)
        .map(|c| (c.campaign.clone(), c.leads))
        .collect();
    render_count_bars(frame, chunks[2], "Leads per Campaign", &leads, Color::Magenta);
}
