//! Console application support.
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing

mod commands;
mod config;

pub use crate::render::TerminalRenderer;
pub use commands::{ConsoleCommand, help_text, parse_command};
pub use config::{ConsoleArgs, ConsoleConfig, IdentityBackend};
