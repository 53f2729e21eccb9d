//! Chat UI components

pub mod commands;
pub mod composer;
pub mod history;
pub mod indicator;

pub use commands::{get_help_text, parse_slash_command, SlashCommand};
pub use composer::{Composer, ComposerAction, ComposerView};
pub use history::{ChatHistory, HistoryView};
