//! Revenue tab

use super::{
    Card, fmt_money, header_row, render_card_row, render_count_bars, render_table, render_trend,
};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::RevenueReport;
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
    report: &RevenueReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Min(6),
        ])
        .split(area);

    let cards = [
        Card::new("Revenue", fmt_money(report.total_revenue), Color::Green)
            .subtitle(format!("{} settled", report.settled)),
        Card::new("Pending", fmt_money(report.pending_amount), Color::Yellow)
            .subtitle(format!("{} open", report.pending)),
        Card::new("Commission", fmt_money(report.total_commission), Color::Cyan),
        Card::new("Average Deal", fmt_money(report.average_deal), Color::Magenta),
        Card::new("Payments", report.payments_count.to_string(), Color::Blue)
            .subtitle(fmt_money(report.payments_total)),
    ];
    render_card_row(frame, chunks[0], &cards);

    let revenue: Vec<u64> = report
        .series
        .values
        .iter()
        .map(|v| v.max(0.0).round() as u64)
        .collect();
    render_trend(frame, chunks[1], "Settled Revenue", &revenue, Color::Green);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);

    let series = report.series_rows();
    let rows: Vec<Row> = filter
        .apply(&series)
        .into_iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&r.period, filter.search()))),
                Cell::from(r.transactions.to_string()),
                Cell::from(fmt_money(r.revenue)),
            ])
        })
        .collect();
    render_table(
        frame,
        body[0],
        "By Period",
        header_row(&["Period", "Deals", "Revenue"]),
        rows,
        &[
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ],
        Some(selected),
    );

    let by_status: Vec<(String, usize)> = report
        .by_status
        .iter()
        .map(|(status, count)| (status.clone(), *count))
        .collect();
    render_count_bars(frame, body[1], "Transactions by Status", &by_status, Color::Yellow);
}
