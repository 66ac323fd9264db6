//! Toast notifications for export results and fetch failures

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn color(&self) -> Color {
        match self {
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
        }
    }

    /// Errors stay up longer so they can be read
    fn lifetime(&self) -> Duration {
        match self {
            Self::Error => Duration::from_secs(6),
            _ => Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    created_at: Instant,
    duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
            duration: kind.lifetime(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Error)
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.duration
    }
}

/// Stack of live toasts, newest at the bottom
#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: Vec<Toast>,
}

impl ToastManager {
    const MAX_VISIBLE: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a toast; a repeat of the newest live message only restarts its timer
    pub fn push(&mut self, toast: Toast) {
        if let Some(last) = self.toasts.last_mut() {
            if last.message == toast.message && last.kind == toast.kind && !last.is_expired() {
                last.created_at = toast.created_at;
                return;
            }
        }
        self.toasts.push(toast);
    }

    pub fn clear_expired(&mut self) {
        self.toasts.retain(|t| !t.is_expired());
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    /// Draw live toasts in the bottom-right corner of `area`
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.clear_expired();

        let visible: Vec<&Toast> = self
            .toasts
            .iter()
            .rev()
            .take(Self::MAX_VISIBLE)
            .rev()
            .collect();
        if visible.is_empty() {
            return;
        }

        let height: u16 = 3;
        let mut y = area
            .height
            .saturating_sub(visible.len() as u16 * height + 1);

        for toast in visible {
            let width = (toast.message.chars().count() + 6).min(area.width as usize) as u16;
            let rect = Rect {
                x: area.x + area.width.saturating_sub(width + 1),
                y: area.y + y,
                width,
                height,
            };
            render_single_toast(frame, rect, toast);
            y += height;
        }
    }
}

fn render_single_toast(frame: &mut Frame, area: Rect, toast: &Toast) {
    let color = toast.kind.color();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let content = Line::from(vec![
        Span::styled(
            format!("{} ", toast.kind.icon()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(toast.message.as_str(), Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(content).alignment(Alignment::Center), inner);
}
