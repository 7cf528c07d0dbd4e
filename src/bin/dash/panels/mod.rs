//! Dashboard panels

pub mod events;
pub mod menu;
pub mod status;

pub use events::OutputLogPanel;
pub use menu::MenuPanel;
pub use status::StatusBar;
