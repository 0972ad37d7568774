//! Jsonnet code generation
//!
//! This module holds the expression emitter, the per-type panel default
//! tables, the dashboard generator and the starter-dashboard scaffolds.

pub mod emitter;
pub mod generator;
pub mod scaffold;
pub mod templates;

// Re-export commonly used items
pub use emitter::{Emitter, Expr};
pub use generator::{GeneratorOptions, JsonnetGenerator, generate};
pub use scaffold::{ScaffoldTemplate, scaffold};
pub use templates::{defaults_for, template_name};
