//! Core types and foundational components
//!
//! This module contains the dashboard data model, error handling,
//! and constants used throughout the application.

pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items for convenience
pub use error::{Result, TransformError};
pub use types::{DashboardAnalysis, DatasourceRef, GridPos, PanelRecord, QuerySpec};
