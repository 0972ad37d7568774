//! Shell completion generation for grafana2jsonnet

use clap::{Command, CommandFactory};
use clap_complete::{Generator, Shell, generate};
use std::io::Write;

use crate::core::error::{Result, TransformError};
use crate::ui::cli::Cli;

/// Write completions for `app` to `out`
pub fn write_completions<G: Generator>(generator: G, app: &mut Command, out: &mut dyn Write) {
    let name = app.get_name().to_string();
    generate(generator, app, name, out);
}

/// Generate shell completions for the given shell on stdout
pub fn print_completions(shell: Shell) {
    write_completions(shell, &mut Cli::command(), &mut std::io::stdout());
}

/// Render the completion script for `shell` into a string
pub fn completion_script(shell: Shell) -> Result<String> {
    let mut buffer = Vec::new();
    write_completions(shell, &mut Cli::command(), &mut buffer);
    String::from_utf8(buffer).map_err(|e| {
        TransformError::InvalidArgument(format!("Completion script for {shell} is not UTF-8: {e}"))
    })
}
