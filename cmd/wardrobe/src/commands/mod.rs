//! CLI commands module.

mod build;
mod config;
mod replay;
mod search;
mod util;

pub use build::BuildCommand;
pub use config::ConfigCommand;
pub use replay::ReplayCommand;
pub use search::SearchCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
