//! Reporting
//!
//! This module handles structured logging for the application.

pub mod logging;

// Re-export commonly used items
pub use logging::{
    init_logger, log_analysis_summary, log_config_info, log_error, log_output_written,
    log_patterns, log_warning,
};
