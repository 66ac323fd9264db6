//! Overview tab: headline figures, activity trends and key metrics

use super::{
    Card, fmt_money, fmt_pct, header_row, panel, rate_color, render_card_row, render_count_bars,
    render_empty, render_table, render_trend,
};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::OverviewReport;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Cell, Paragraph, Row},
};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    report: &OverviewReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Min(8),
        ])
        .split(area);

    let cards = [
        Card::new("Properties", report.total_properties.to_string(), Color::Cyan)
            .subtitle(format!("{} new", report.new_properties)),
        Card::new("Portfolio Value", fmt_money(report.total_property_value), Color::Green)
            .subtitle(format!("{} listed in period", fmt_money(report.period_property_value))),
        Card::new("Leads", report.period_leads.to_string(), Color::Magenta)
            .subtitle(format!("{} all time", report.total_leads)),
        Card::new(
            "Conversion",
            fmt_pct(report.conversion_rate),
            rate_color(report.conversion_rate),
        )
        .subtitle(format!("{} converted", report.converted_leads)),
        Card::new("Revenue", fmt_money(report.revenue), Color::Yellow)
            .subtitle(format!("{} commission", fmt_money(report.total_commission))),
    ];
    render_card_row(frame, chunks[0], &cards);

    let trends = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_trend(
        frame,
        trends[0],
        &format!("New Leads ({})", report.leads_series.total()),
        &report.leads_series.counts_u64(),
        Color::Magenta,
    );
    render_trend(
        frame,
        trends[1],
        &format!("New Listings ({})", report.listings_series.total()),
        &report.listings_series.counts_u64(),
        Color::Cyan,
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);

    let metrics = report.metric_rows();
    let rows: Vec<Row> = filter
        .apply(&metrics)
        .into_iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&m.metric, filter.search()))),
                Cell::from(m.value.clone()),
            ])
        })
        .collect();
    render_table(
        frame,
        bottom[0],
        "Key Figures",
        header_row(&["Metric", "Value"]),
        rows,
        &[Constraint::Percentage(60), Constraint::Percentage(40)],
        Some(selected),
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(bottom[1]);

    let cities: Vec<(String, usize)> = report
        .top_cities
        .iter()
        .map(|c| (c.label.clone(), c.count))
        .collect();
    if cities.is_empty() {
        render_empty(frame, right[0], "Top Cities", "No listings yet");
    } else {
        render_count_bars(frame, right[0], "Top Cities", &cities, Color::Cyan);
    }

    render_server_stats(frame, right[1], report);
}

/// Figures reported by the backend itself, when it exposes them
fn render_server_stats(frame: &mut Frame, area: Rect, report: &OverviewReport) {
    let Some(stats) = &report.server_stats else {
        let by_status: Vec<(String, usize)> = report
            .properties_by_status
            .iter()
            .map(|(status, count)| (status.clone(), *count))
            .collect();
        render_count_bars(frame, area, "Listings by Status", &by_status, Color::Green);
        return;
    };

    let lines: Vec<Line> = stats
        .iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Line::from(format!("{}: {}", key, value))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(Color::White))
            .block(panel("Server Stats", Color::Blue)),
        area,
    );
}
