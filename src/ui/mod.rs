//! User interface and interaction
//!
//! This module contains all components related to user interaction,
//! including CLI parsing, output formatting and shell completion
//! generation.

pub mod cli;
pub mod color;
pub mod completion;
pub mod output;

// Re-export commonly used items
pub use cli::{Cli, Commands, cli_to_config, parse_params};
pub use completion::{completion_script, print_completions};
pub use output::{display_result, render_json_report, render_summary};
