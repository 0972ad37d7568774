//! Dashboard analysis
//!
//! This module turns a loaded dashboard tree into a `DashboardAnalysis`
//! and finds value patterns that recur across panels.

pub mod analyzer;
pub mod patterns;

// Re-export commonly used items
pub use analyzer::{analyze, analyze_panel};
pub use patterns::{
    PatternDetector, PatternMatch, PatternType, canonical_json, extraction_suggestions,
    template_suggestions,
};
