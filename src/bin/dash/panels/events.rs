//! Output log panel
//!
//! Holds the rendered agent output, most recent entry at the bottom.
//! Scrolling moves a window back through history.

use crate::colors::DashboardColors;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};
use slamon_core::OutputEvent;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct LogEntry {
    text: String,
    color: Color,
    bold: bool,
    timestamp: String,
}

pub struct OutputLogPanel {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
    /// Lines scrolled up from the bottom
    scroll_offset: usize,
}

impl OutputLogPanel {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: 2000,
            scroll_offset: 0,
        }
    }

    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Append a delivered event
    pub fn push(&mut self, event: &OutputEvent) {
        let (color, bold) = event_style(event);
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();

        if let OutputEvent::Section { .. } = event {
            // blank separator before each section, like the CLI prints it
            self.push_entry(LogEntry {
                text: String::new(),
                color,
                bold: false,
                timestamp: timestamp.clone(),
            });
        }

        self.push_entry(LogEntry {
            text: event.render(),
            color,
            bold,
            timestamp,
        });
    }

    fn push_entry(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.scroll_offset = 0;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max_offset = self.entries.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max_offset);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let end = self.entries.len().saturating_sub(self.scroll_offset);
        let start = end.saturating_sub(height);

        let items: Vec<ListItem> = if self.entries.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No output yet. Select an action and press Enter.",
                Style::default().fg(DashboardColors::SECONDARY),
            )))]
        } else {
            self.entries
                .range(start..end)
                .map(|entry| {
                    let mut style = Style::default().fg(entry.color);
                    if entry.bold {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("[{}] ", entry.timestamp),
                            Style::default().fg(DashboardColors::SECONDARY),
                        ),
                        Span::styled(entry.text.as_str(), style),
                    ]))
                })
                .collect()
        };

        let title = if self.scroll_offset > 0 {
            format!("Output (↓ {} newer lines)", self.scroll_offset)
        } else {
            format!("Output ({} lines)", self.entries.len())
        };

        let list = List::new(items).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DashboardColors::BORDER)),
        );
        frame.render_widget(list, area);
    }
}

impl Default for OutputLogPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn event_style(event: &OutputEvent) -> (Color, bool) {
    match event {
        OutputEvent::Section { .. } => (DashboardColors::HEADER, true),
        OutputEvent::Progress { .. } => (DashboardColors::IN_PROGRESS, false),
        OutputEvent::Completed { .. } => (DashboardColors::SUCCESS, true),
        OutputEvent::Failed { .. } => (DashboardColors::ERROR, true),
        OutputEvent::Line { text } => (line_color(text), false),
    }
}

fn line_color(text: &str) -> Color {
    if text.contains("🚨") || text.contains("CRITICAL") || text.contains('❌') {
        DashboardColors::ERROR
    } else if text.contains("⚠️") || text.contains("AT RISK") || text.contains("🔶") {
        DashboardColors::WARNING
    } else if text.contains('✅') {
        DashboardColors::SUCCESS
    } else {
        DashboardColors::TEXT
    }
}
