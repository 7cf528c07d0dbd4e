//! Color palette shared by the dashboard panels

use ratatui::style::Color;

pub struct DashboardColors;

impl DashboardColors {
    /// Completed run, tickets within SLA
    pub const SUCCESS: Color = Color::Green;

    /// At-risk tickets, warnings
    pub const WARNING: Color = Color::Yellow;

    /// Breaches, failed runs
    pub const ERROR: Color = Color::Red;

    /// A run in progress, batch progress lines
    pub const IN_PROGRESS: Color = Color::Blue;

    pub const IDLE: Color = Color::Gray;

    pub const BORDER: Color = Color::Cyan;

    /// Section headings and the selected menu entry
    pub const HEADER: Color = Color::Yellow;

    pub const SECONDARY: Color = Color::DarkGray;

    pub const TEXT: Color = Color::White;
}
