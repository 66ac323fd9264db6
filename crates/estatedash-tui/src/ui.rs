//! Main UI rendering

use crate::app::App;
use crate::components::FilterBar;
use crate::tabs;
use estatedash_core::{DegradedState, Period, ReportData, ReportKind};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
};

/// Stateless renderer; all state lives in [`App`]
#[derive(Debug, Default)]
pub struct Ui;

impl Ui {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&mut self, frame: &mut Frame, app: &mut App) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header: logo, tabs, period
                Constraint::Length(3), // Filter bar
                Constraint::Min(0),    // Report
                Constraint::Length(1), // Status bar
            ])
            .split(size);

        self.render_header(frame, chunks[0], app);
        FilterBar::new(&app.view.filter)
            .editing(app.search_mode)
            .matches(app.row_counts())
            .render(frame, chunks[1]);

        let content = self.render_degraded_banner(frame, chunks[2], &app.store.degraded_state());
        if app.is_loading() || app.current_report().is_none() {
            self.render_loading(frame, content, app);
        } else {
            self.render_report(frame, content, app);
        }

        self.render_status_bar(frame, chunks[3], app);
        app.toasts.render(frame, size);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, app: &App) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(14), // Logo
                Constraint::Min(0),     // Tabs
                Constraint::Length(34), // Period selector
            ])
            .split(inner);

        let logo = Paragraph::new(Line::from(vec![
            Span::styled("◈ ", Style::default().fg(Color::Cyan)),
            Span::styled(
                "estatedash",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        frame.render_widget(logo, columns[0]);

        let titles: Vec<Line> = ReportKind::all()
            .iter()
            .map(|kind| {
                let style = if *kind == app.view.tab {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Line::from(vec![
                    Span::styled(
                        format!("{} ", kind.index() + 1),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(kind.name(), style),
                ])
            })
            .collect();
        let tabs = Tabs::new(titles)
            .select(app.view.tab.index())
            .divider(Span::styled("│", Style::default().fg(Color::DarkGray)));
        frame.render_widget(tabs, columns[1]);

        frame.render_widget(
            Paragraph::new(period_line(app.view.period)).alignment(Alignment::Right),
            columns[2],
        );
    }

    /// Yellow line for partial data, red for an unavailable API.
    /// Returns the area left for content.
    fn render_degraded_banner(&self, frame: &mut Frame, area: Rect, state: &DegradedState) -> Rect {
        let (icon, reason, color) = match state {
            DegradedState::Healthy => return area,
            DegradedState::PartialData { reason, .. } => (" ⚠ ", reason, Color::Yellow),
            DegradedState::Unavailable { reason } => (" ✗ API UNAVAILABLE ", reason, Color::Red),
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let banner = Paragraph::new(Line::from(vec![
            Span::styled(
                icon,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(reason.as_str(), Style::default().fg(color)),
        ]))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(banner, chunks[0]);
        chunks[1]
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect, app: &mut App) {
        app.spinner.tick();

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Length(6),
                Constraint::Min(0),
            ])
            .split(area);
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(vertical[1]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Span::styled(
                format!(" {} ", app.view.tab.name()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));

        let lines = vec![
            Line::from(""),
            Line::from(vec![
                app.spinner.render(),
                Span::raw("  "),
                Span::styled(
                    format!("Loading {}...", app.view.period.display().to_lowercase()),
                    Style::default().fg(Color::White),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Press 'q' to quit",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .alignment(Alignment::Center),
            horizontal[1],
        );
    }

    fn render_report(&self, frame: &mut Frame, area: Rect, app: &App) {
        let Some(report) = app.current_report() else {
            return;
        };
        let filter = &app.view.filter;
        let selected = app.selected;

        match report {
            ReportData::Overview(r) => tabs::overview::render(frame, area, r, filter, selected),
            ReportData::Funnel(r) => tabs::funnel::render(frame, area, r, filter, selected),
            ReportData::Agents(r) => tabs::agents::render(frame, area, r, filter, selected),
            ReportData::Agencies(r) => tabs::agencies::render(frame, area, r, filter, selected),
            ReportData::Campaigns(r) => tabs::campaigns::render(frame, area, r, filter, selected),
            ReportData::FollowUps(r) => tabs::followups::render(frame, area, r, filter, selected),
            ReportData::SiteVisits(r) => {
                tabs::site_visits::render(frame, area, r, filter, selected)
            }
            ReportData::Revenue(r) => tabs::revenue::render(frame, area, r, filter, selected),
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, app: &App) {
        let hints = if app.search_mode {
            "type to search │ enter keep │ esc clear"
        } else {
            "q quit │ 1-8/tab switch │ F1-F4 period │ / search │ c category │ esc reset │ x export │ r refresh"
        };

        let updated = app
            .store
            .snapshot()
            .map(|s| {
                format!(
                    "updated {}",
                    s.fetched_at.with_timezone(&chrono::Local).format("%H:%M:%S")
                )
            })
            .unwrap_or_default();
        let scope = app
            .view
            .scope
            .agency_id
            .as_deref()
            .map(|id| format!("agency {} │ ", id))
            .unwrap_or_default();

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(40)])
            .split(area);

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {}", hints),
                Style::default().fg(Color::DarkGray),
            )),
            columns[0],
        );
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{}{} ", scope, updated),
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(Alignment::Right),
            columns[1],
        );
    }
}

/// `F1 7d  F2 30d  ...` with the active period highlighted
fn period_line(active: Period) -> Line<'static> {
    let spans: Vec<Span> = Period::all()
        .iter()
        .enumerate()
        .flat_map(|(i, period)| {
            let style = if *period == active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            [
                Span::styled(format!(" F{} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!(" {} ", period.label()), style),
            ]
        })
        .collect();
    Line::from(spans)
}
