//! Output formatting and display logic for grafana2jsonnet

use serde::Serialize;
use std::path::Path;

use crate::analysis::{PatternMatch, extraction_suggestions, template_suggestions};
use crate::core::constants::output_formats;
use crate::core::error::Result;
use crate::pipeline::TransformResult;
use crate::ui::color::{Colors, colorize};

/// Machine-readable report printed with `--format json`
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub success: bool,
    pub errors: &'a [String],
    pub warnings: &'a [String],
    pub patterns: &'a [PatternMatch],
    pub output_file: Option<&'a Path>,
    pub jsonnet: &'a str,
}

impl<'a> From<&'a TransformResult> for JsonReport<'a> {
    fn from(result: &'a TransformResult) -> Self {
        Self {
            success: result.success,
            errors: &result.errors,
            warnings: &result.warnings,
            patterns: &result.patterns,
            output_file: result.output_file.as_deref(),
            jsonnet: &result.jsonnet,
        }
    }
}

/// Display a transformation result based on output format
pub fn display_result(result: &TransformResult, output_format: &str, quiet: bool) -> Result<()> {
    match output_format {
        output_formats::JSON => println!("{}", render_json_report(result)?),
        output_formats::MINIMAL => display_minimal_output(result),
        _ => display_text_output(result, quiet),
    }
    Ok(())
}

pub fn render_json_report(result: &TransformResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::from(result))?)
}

/// Only the Jsonnet, or nothing when it went to a file. Errors still reach stderr.
fn display_minimal_output(result: &TransformResult) {
    if result.output_file.is_none() && !result.jsonnet.is_empty() {
        print!("{}", result.jsonnet);
    }
    for error in &result.errors {
        eprintln!("{error}");
    }
}

fn display_text_output(result: &TransformResult, quiet: bool) {
    if result.output_file.is_none() && !result.jsonnet.is_empty() {
        print!("{}", result.jsonnet);
    }

    if quiet {
        for error in &result.errors {
            eprintln!("{} {error}", colorize("error:", Colors::RED));
        }
    } else {
        eprint!("{}", render_summary(result));
    }
}

/// Human-readable summary of a run, one section per non-empty list
pub fn render_summary(result: &TransformResult) -> String {
    let mut out = String::new();

    match &result.analysis {
        Some(analysis) if result.success => {
            out.push_str(&format!(
                "{} {}: {} panel(s), {} data source(s), {} pattern(s)\n",
                colorize("✓", Colors::GREEN),
                colorize(&format!("Transformed \"{}\"", analysis.title), Colors::BOLD),
                analysis.panels.len(),
                analysis.data_sources.len(),
                result.patterns.len()
            ));
        }
        _ => out.push_str(&format!(
            "{} {}\n",
            colorize("✗", Colors::RED),
            colorize("Transformation failed", Colors::BOLD)
        )),
    }

    if let Some(path) = &result.output_file {
        out.push_str(&format!(
            "   Written to {}\n",
            colorize(&path.display().to_string(), Colors::CYAN)
        ));
    }

    push_section(&mut out, "Errors", Colors::RED, &result.errors);
    push_section(&mut out, "Warnings", Colors::YELLOW, &result.warnings);

    let patterns: Vec<String> = result
        .patterns
        .iter()
        .map(|m| format!("{} x{} at {}", m.pattern_type, m.occurrences, m.path))
        .collect();
    push_section(&mut out, "Patterns", Colors::MAGENTA, &patterns);

    let mut suggestions = template_suggestions(&result.patterns);
    suggestions.extend(extraction_suggestions(&result.patterns));
    push_section(&mut out, "Suggestions", Colors::BLUE, &suggestions);

    out
}

fn push_section(out: &mut String, title: &str, color: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("{}:\n", colorize(title, color)));
    for line in lines {
        out.push_str(&format!("   - {line}\n"));
    }
}
