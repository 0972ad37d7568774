//! Transformation pipeline
//!
//! This module wires loading, analysis, pattern detection and generation
//! together and writes the result to disk when asked.

pub mod transform;
pub mod writer;

// Re-export commonly used items
pub use transform::{
    TransformOptions, TransformResult, transform_file, transform_str, transform_tree,
};
pub use writer::{WriteToFile, Writer, write_output};
