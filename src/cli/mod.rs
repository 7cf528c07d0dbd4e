//! CLI command handlers
//!
//! Each subcommand is implemented in its own module; shared setup lives in
//! [`helpers`].

pub mod analyze;
pub mod assess;
pub mod escalate;
pub mod helpers;
pub mod report;
pub mod setup;
pub mod tickets;
