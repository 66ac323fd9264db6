//! Lead funnel tab

use super::{
    Card, fmt_pct, header_row, rate_color, render_card_row, render_count_bars, render_table,
};
use crate::components::filter_bar::highlight_matches;
use estatedash_core::ReportFilter;
use estatedash_core::analytics::FunnelReport;
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
    report: &FunnelReport,
    filter: &ReportFilter,
    selected: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Percentage(45),
            Constraint::Min(6),
        ])
        .split(area);

    let cards = [
        Card::new("Leads", report.total.to_string(), Color::Cyan).subtitle("in period"),
        Card::new("Converted", report.converted.to_string(), Color::Green),
        Card::new("Lost", report.lost.to_string(), Color::Red),
        Card::new(
            "Conversion",
            fmt_pct(report.conversion_rate),
            rate_color(report.conversion_rate),
        ),
        Card::new("Loss Rate", fmt_pct(report.loss_rate), Color::Yellow),
    ];
    render_card_row(frame, chunks[0], &cards);

    let stage_counts: Vec<(String, usize)> = report
        .stages
        .iter()
        .map(|s| (s.label.clone(), s.count))
        .collect();
    render_count_bars(frame, chunks[1], "Pipeline", &stage_counts, Color::Magenta);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    let rows: Vec<Row> = filter
        .apply(&report.stages)
        .into_iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(Line::from(highlight_matches(&s.label, filter.search()))),
                Cell::from(s.count.to_string()),
                Cell::from(fmt_pct(s.share)),
            ])
        })
        .collect();
    render_table(
        frame,
        bottom[0],
        "Stages",
        header_row(&["Stage", "Leads", "Share"]),
        rows,
        &[
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ],
        Some(selected),
    );

    let sources: Vec<Row> = report
        .top_sources
        .iter()
        .map(|s| Row::new(vec![s.label.clone(), s.count.to_string()]))
        .chain(report.lost_reasons.iter().map(|(reason, count)| {
            Row::new(vec![format!("lost: {}", reason), count.to_string()])
        }))
        .collect();
    render_table(
        frame,
        bottom[1],
        "Sources & Loss Reasons",
        header_row(&["Source", "Leads"]),
        sources,
        &[Constraint::Percentage(70), Constraint::Percentage(30)],
        None,
    );
}
