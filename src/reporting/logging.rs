use crate::analysis::PatternMatch;
use crate::config::Config;
use crate::core::types::DashboardAnalysis;
use log::{debug, error, info, warn};
use std::path::Path;

/// Initialize the logger with appropriate level based on verbosity
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Off
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Off // Only show structured logs in verbose mode
    };

    // A second initialization in the same process is ignored
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .try_init();

    debug!("Logger initialized with level: {level:?}");
}

/// Log the effective generation settings
pub fn log_config_info(config: &Config) {
    let options = config.generator_options();
    info!(
        "Configuration: indent={}, max_line_length={}, min_occurrences={}",
        options.indent_size,
        options.max_line_length,
        config.min_pattern_occurrences.unwrap_or_default()
    );
    info!(
        "Generation: extract_repeated={}, templates={}, comments={}",
        options.extract_repeated, options.create_templates, options.add_comments
    );
}

/// Log what the analyzer found
pub fn log_analysis_summary(analysis: &DashboardAnalysis) {
    info!("Dashboard: {analysis}");
    for (kind, count) in &analysis.panel_type_counts {
        debug!("  {kind}: {count} panel(s)");
    }
    if !analysis.repeated_panels.is_empty() {
        debug!("Repeated panels: {}", analysis.repeated_panels.join(", "));
    }
}

/// Log detected patterns
pub fn log_patterns(patterns: &[PatternMatch]) {
    info!("Detected {} pattern(s)", patterns.len());
    for pattern in patterns {
        debug!(
            "  {} x{} at {}",
            pattern.pattern_type, pattern.occurrences, pattern.path
        );
    }
}

/// Log a completed output write
pub fn log_output_written(path: &Path, bytes: usize) {
    info!("Wrote {bytes} bytes to {}", path.display());
}

/// Log error information
pub fn log_error(message: &str, source: Option<&dyn std::error::Error>) {
    match source {
        Some(err) => error!("{message}: {err}"),
        None => error!("{message}"),
    }
}

/// Log warning information
pub fn log_warning(message: &str) {
    warn!("{message}");
}
