//! Action menu panel

use crate::colors::DashboardColors;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};
use slamon_core::{DashboardAction, DashboardShell, ShellState};

pub struct MenuPanel;

impl MenuPanel {
    pub fn render(frame: &mut Frame, area: Rect, shell: &DashboardShell) {
        let running = match shell.state() {
            ShellState::Running(action) => Some(*action),
            ShellState::Idle { .. } => None,
        };

        let items: Vec<ListItem> = DashboardAction::ALL
            .iter()
            .enumerate()
            .map(|(idx, action)| {
                let selected = idx == shell.selected_index();
                let marker = if selected { "▶ " } else { "  " };
                let mut style = if selected {
                    Style::default()
                        .fg(DashboardColors::HEADER)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(DashboardColors::TEXT)
                };
                if running.is_some() && running != Some(*action) {
                    style = style.fg(DashboardColors::SECONDARY);
                }

                let mut spans = vec![Span::styled(format!("{}{}", marker, action.label()), style)];
                if running == Some(*action) {
                    spans.push(Span::styled(
                        " (running)",
                        Style::default().fg(DashboardColors::IN_PROGRESS),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title("Actions")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DashboardColors::BORDER)),
        );
        frame.render_widget(list, area);
    }
}
