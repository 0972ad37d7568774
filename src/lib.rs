//! Transform Grafana dashboard JSON into structured, deduplicated Jsonnet.
//!
//! The pipeline runs strictly forward: the loader parses and unwraps the
//! document, the analyzer normalizes panels and aggregates statistics, the
//! pattern detector finds values repeated across panels, and the generator
//! renders Jsonnet with extracted locals and per-type template functions.

pub mod analysis;
pub mod codegen;
pub mod config;
pub mod core;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod ui;

// Re-export commonly used items
pub use analysis::{PatternDetector, PatternMatch, PatternType, analyze};
pub use codegen::{GeneratorOptions, JsonnetGenerator, generate};
pub use config::{CliConfig, Config};
pub use core::{DashboardAnalysis, PanelRecord, Result, TransformError};
pub use pipeline::{TransformOptions, TransformResult, transform_file, transform_str};
