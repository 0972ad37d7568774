//! Document loading
//!
//! This module reads dashboard JSON from files or strings, classifies
//! the document shape and extracts the dashboard sub-tree.

pub mod document;

// Re-export commonly used items
pub use document::{
    DocumentShape, LoadDashboard, LoadedDocument, Loader, classify, extract_dashboard, parse_str,
    validate,
};
