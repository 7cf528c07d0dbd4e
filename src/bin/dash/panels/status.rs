//! Status bar: current shell state plus key help

use crate::colors::DashboardColors;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use slamon_core::{RunResult, ShellState};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame, area: Rect, state: &ShellState, tick: usize) {
        let (text, color) = status_text(state, tick);
        let line = Line::from(vec![
            Span::styled(text, Style::default().fg(color)),
            Span::styled(
                "  |  ↑/↓ select  Enter/r run  PgUp/PgDn scroll  c clear  q quit",
                Style::default().fg(DashboardColors::SECONDARY),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn status_text(state: &ShellState, tick: usize) -> (String, Color) {
    match state {
        ShellState::Running(action) => (
            format!("{} Running: {}", SPINNER[tick % SPINNER.len()], action.label()),
            DashboardColors::IN_PROGRESS,
        ),
        ShellState::Idle { last: None } => ("Idle".to_string(), DashboardColors::IDLE),
        ShellState::Idle {
            last: Some(RunResult::Succeeded(action)),
        } => (
            format!("Idle | last: {} succeeded", action.label()),
            DashboardColors::SUCCESS,
        ),
        ShellState::Idle {
            last: Some(RunResult::Failed(action, error)),
        } => (
            format!("Idle | last: {} failed: {}", action.label(), error),
            DashboardColors::ERROR,
        ),
    }
}
