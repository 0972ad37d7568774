use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::core::constants::dashboard;

/// A single query attached to a panel. No schema is imposed beyond
/// what datasource extraction needs.
pub type QuerySpec = Map<String, Value>;

/// Grid placement of a panel on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPos {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl Default for GridPos {
    fn default() -> Self {
        let (x, y, w, h) = dashboard::DEFAULT_GRID;
        Self { x, y, w, h }
    }
}

impl GridPos {
    /// Read a grid position from a JSON map. Missing or non-integer
    /// coordinates fall back to the default grid individually.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let default = Self::default();
        let coord = |key: &str, fallback: i64| map.get(key).and_then(Value::as_i64).unwrap_or(fallback);

        Self {
            x: coord("x", default.x),
            y: coord("y", default.y),
            w: coord("w", default.w),
            h: coord("h", default.h),
        }
    }

    /// Render back into a JSON map with keys in `x, y, w, h` order.
    pub fn to_value(self) -> Value {
        let mut map = Map::new();
        map.insert("x".to_string(), Value::from(self.x));
        map.insert("y".to_string(), Value::from(self.y));
        map.insert("w".to_string(), Value::from(self.w));
        map.insert("h".to_string(), Value::from(self.h));
        Value::Object(map)
    }
}

/// The two shapes a Grafana `datasource` reference can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasourceRef {
    /// `"datasource": "prometheus"`
    StringRef(String),
    /// `"datasource": {"type": "loki", "uid": "abc"}`
    ObjectRef {
        kind: Option<String>,
        uid: Option<String>,
    },
}

impl DatasourceRef {
    /// Classify a raw JSON value. Anything other than a string or a map
    /// (null, numbers, arrays) is not a datasource reference.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::StringRef(s.clone())),
            Value::Object(map) => Some(Self::ObjectRef {
                kind: map.get("type").and_then(non_empty_str),
                uid: map.get("uid").and_then(non_empty_str),
            }),
            _ => None,
        }
    }

    /// Resolve to a single identifier: the string itself, or the object's
    /// `type` falling back to its `uid`. Empty results resolve to `None`.
    pub fn resolve(&self) -> Option<&str> {
        match self {
            Self::StringRef(s) if s.is_empty() => None,
            Self::StringRef(s) => Some(s),
            Self::ObjectRef { kind, uid } => kind.as_deref().or(uid.as_deref()),
        }
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(String::from)
}

/// Resolve a raw datasource value in one step.
pub fn resolve_datasource(value: &Value) -> Option<String> {
    DatasourceRef::from_value(value).and_then(|ds| ds.resolve().map(String::from))
}

/// Normalized view of one panel entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub grid_pos: GridPos,
    pub targets: Vec<QuerySpec>,
    pub datasource: Option<String>,
    pub options: Map<String, Value>,
    pub field_config: Map<String, Value>,
    pub transformations: Vec<Map<String, Value>>,
    /// Allow-listed keys beyond the core fields, kept verbatim
    pub known_properties: Map<String, Value>,
    /// Keys outside the allow-list, kept verbatim
    pub custom_properties: Map<String, Value>,
    /// Source keys consumed by the fields above (core and known), in source order
    pub named_keys: Vec<String>,
    /// Core fields exactly as the source wrote them
    #[serde(skip)]
    pub source_fields: Map<String, Value>,
}

impl PanelRecord {
    /// Whether the source panel carried `key` as a named (non-custom) field.
    pub fn has_named(&self, key: &str) -> bool {
        self.named_keys.iter().any(|k| k == key)
    }

    /// Look up a non-core property, known properties first.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.known_properties
            .get(key)
            .or_else(|| self.custom_properties.get(key))
    }

    /// All source keys of this panel: named keys followed by custom keys.
    pub fn source_keys(&self) -> impl Iterator<Item = &str> {
        self.named_keys
            .iter()
            .map(String::as_str)
            .chain(self.custom_properties.keys().map(String::as_str))
    }
}

/// Aggregate result of analyzing one dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalysis {
    pub title: String,
    pub uid: Option<String>,
    pub tags: Vec<String>,
    pub timezone: String,
    pub panels: Vec<PanelRecord>,
    pub repeated_panels: Vec<String>,
    pub repeated_values: Map<String, Value>,
    pub data_sources: BTreeSet<String>,
    pub panel_type_counts: BTreeMap<String, usize>,
    pub common_targets: Vec<QuerySpec>,
    pub dashboard_config: Map<String, Value>,
}

impl DashboardAnalysis {
    /// Panel types in order of first appearance.
    pub fn panel_types_in_order(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for panel in &self.panels {
            if !seen.contains(&panel.kind.as_str()) {
                seen.push(&panel.kind);
            }
        }
        seen
    }

    /// Number of panels of `kind`.
    pub fn panel_type_count(&self, kind: &str) -> usize {
        self.panel_type_counts.get(kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for DashboardAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} panels, {} datasources, {} repeated values)",
            self.title,
            self.panels.len(),
            self.data_sources.len(),
            self.repeated_values.len()
        )
    }
}

/// Python-style truthiness used by the detector and analyzer: null, false,
/// zero, and empty strings/collections are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
