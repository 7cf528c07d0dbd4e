//! Output channel between the agent and whatever presents its progress
//!
//! The agent never prints directly. It emits [`OutputEvent`]s into an
//! [`OutputSink`] handed to it at construction; the CLI prints them, the
//! dashboard drains them from a channel into its log panel.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A single unit of agent output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    /// Section heading (e.g. "Building analysis context")
    Section { title: String },
    /// One line of text
    Line { text: String },
    /// Progress through a batch
    Progress { done: usize, total: usize },
    /// The hosting shell finished the call successfully
    Completed { action: String },
    /// The hosting shell saw the call fail
    Failed { action: String, error: String },
}

impl OutputEvent {
    /// Render the event as a single display line
    pub fn render(&self) -> String {
        match self {
            OutputEvent::Section { title } => format!("== {} ==", title),
            OutputEvent::Line { text } => text.clone(),
            OutputEvent::Progress { done, total } => {
                format!("  Analyzed {}/{} tickets", done, total)
            }
            OutputEvent::Completed { action } => format!("✅ {} completed", action),
            OutputEvent::Failed { action, error } => format!("❌ {} failed: {}", action, error),
        }
    }
}

/// Destination for agent output
pub trait OutputSink: Send + Sync {
    fn emit(&self, event: OutputEvent);

    fn line(&self, text: &str) {
        self.emit(OutputEvent::Line {
            text: text.to_string(),
        });
    }

    fn section(&self, title: &str) {
        self.emit(OutputEvent::Section {
            title: title.to_string(),
        });
    }
}

/// Prints rendered events to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&self, event: OutputEvent) {
        if let OutputEvent::Section { title } = &event {
            println!();
            println!("{}", title);
            println!("{}", "-".repeat(40));
        } else {
            println!("{}", event.render());
        }
    }
}

/// Forwards events over an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutputEvent>,
}

impl ChannelSink {
    /// Create a sink together with the receiving half
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutputSink for ChannelSink {
    fn emit(&self, event: OutputEvent) {
        // Receiver gone means the display was torn down; nothing to do.
        let _ = self.tx.send(event);
    }
}

/// Collects events in memory
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    events: Arc<Mutex<Vec<OutputEvent>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<OutputEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Rendered lines, in emission order
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(OutputEvent::render).collect()
    }
}

impl OutputSink for BufferSink {
    fn emit(&self, event: OutputEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_preserves_order() {
        let sink = BufferSink::new();
        sink.section("Fetching tickets");
        sink.line("Retrieved 3 tickets");
        sink.emit(OutputEvent::Progress { done: 3, total: 3 });

        let lines = sink.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "== Fetching tickets ==");
        assert_eq!(lines[1], "Retrieved 3 tickets");
        assert_eq!(lines[2], "  Analyzed 3/3 tickets");
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelSink::new();
        sink.line("first");
        sink.emit(OutputEvent::Completed {
            action: "Daily Analysis".to_string(),
        });
        drop(sink);

        assert_eq!(
            rx.recv().await,
            Some(OutputEvent::Line {
                text: "first".to_string()
            })
        );
        assert!(matches!(rx.recv().await, Some(OutputEvent::Completed { .. })));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.line("nobody listening");
    }
}
