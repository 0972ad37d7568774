use log::{debug, warn};
use serde_json::Value;

use crate::core::constants::{dashboard, messages};
use crate::core::error::{Result, TransformError};

use std::fs;
use std::path::{Path, PathBuf};

/// How the dashboard sits inside the parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentShape {
    /// `{"dashboard": {...}}`
    Wrapped,
    /// `{"panels": [...], ...}`
    Flat,
    /// One of the above under a `grafana`, `spec` or `resource` key
    Nested {
        key: &'static str,
        inner: Box<DocumentShape>,
    },
    /// Anything else; passed to the analyzer untouched
    Unrecognized,
}

/// A parsed input document with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub tree: Value,
    pub source: PathBuf,
    /// Non-fatal notes raised while loading
    pub warnings: Vec<String>,
}

pub trait LoadDashboard {
    fn load(&self, path: &Path) -> Result<LoadedDocument>;
}

#[derive(Default, Debug)]
pub struct Loader {}

impl LoadDashboard for Loader {
    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        if !path.exists() {
            return Err(TransformError::FileNotFound(path.display().to_string()));
        }

        let mut warnings = Vec::new();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            let message = format!("{}{}", messages::NON_JSON_EXTENSION, path.display());
            warn!("{message}");
            warnings.push(message);
        }

        let content = fs::read_to_string(path)?;
        debug!("Read {} bytes from {}", content.len(), path.display());

        Ok(LoadedDocument {
            tree: parse_str(&content)?,
            source: path.to_path_buf(),
            warnings,
        })
    }
}

/// Parse JSON text into a generic tree.
pub fn parse_str(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(TransformError::Parse)
}

/// Determine where the dashboard lives in `tree`.
pub fn classify(tree: &Value) -> DocumentShape {
    let Some(map) = tree.as_object() else {
        return DocumentShape::Unrecognized;
    };

    if map.contains_key("dashboard") {
        return DocumentShape::Wrapped;
    }
    if map.contains_key("panels") {
        return DocumentShape::Flat;
    }

    for key in dashboard::NESTING_KEYS {
        if let Some(inner) = map.get(key).and_then(Value::as_object) {
            let inner_shape = if inner.contains_key("dashboard") {
                Some(DocumentShape::Wrapped)
            } else if inner.contains_key("panels") {
                Some(DocumentShape::Flat)
            } else {
                None
            };

            if let Some(shape) = inner_shape {
                return DocumentShape::Nested {
                    key,
                    inner: Box::new(shape),
                };
            }
        }
    }

    DocumentShape::Unrecognized
}

/// Extract the canonical dashboard sub-tree. Unrecognized shapes are
/// returned as-is so the analyzer can apply its defaults.
pub fn extract_dashboard(tree: &Value) -> Value {
    let shape = classify(tree);
    debug!("Document shape: {shape:?}");

    match shape {
        DocumentShape::Wrapped => tree["dashboard"].clone(),
        DocumentShape::Flat | DocumentShape::Unrecognized => tree.clone(),
        DocumentShape::Nested { key, inner } => match *inner {
            DocumentShape::Wrapped => tree[key]["dashboard"].clone(),
            _ => tree[key].clone(),
        },
    }
}

/// Superficial structural checks. Problems are returned as messages and
/// never stop the transformation.
pub fn validate(tree: &Value) -> Vec<String> {
    let mut problems = Vec::new();

    let Some(map) = tree.as_object() else {
        problems.push("Data is not an object".to_string());
        return problems;
    };

    if !map.contains_key("dashboard") && !map.contains_key("panels") {
        problems.push("Missing 'dashboard' or 'panels' field".to_string());
    }

    if let Some(dashboard) = map.get("dashboard") {
        match dashboard.as_object() {
            None => problems.push("'dashboard' field is not an object".to_string()),
            Some(inner) => {
                if let Some(panels) = inner.get("panels")
                    && !panels.is_array()
                {
                    problems.push("'panels' field is not an array".to_string());
                }
            }
        }
    }

    problems
}
