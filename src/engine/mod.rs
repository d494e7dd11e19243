pub mod feeds;
pub mod input;
pub mod runner;

pub use input::{spawn_line_reader, stdin_lines};
pub use runner::{RunSummary, VibeRuntime};
