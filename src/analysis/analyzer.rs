use log::debug;
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::constants::{dashboard, panel_keys};
use crate::core::types::{
    DashboardAnalysis, GridPos, PanelRecord, QuerySpec, is_truthy, resolve_datasource,
};

static KNOWN_PANEL_KEYS: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| panel_keys::KNOWN.iter().copied().collect());

static CORE_PANEL_KEYS: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| panel_keys::CORE.iter().copied().collect());

/// Sorted `(key, stringified value)` pairs identifying a target's shape.
type TargetFingerprint = Vec<(String, String)>;

/// Analyze a dashboard tree. Never fails: anything missing falls back to
/// a default, and a non-object tree is treated as an empty dashboard.
pub fn analyze(tree: &Value) -> DashboardAnalysis {
    let empty = Map::new();
    let root = tree.as_object().unwrap_or(&empty);
    let board = root
        .get("dashboard")
        .and_then(Value::as_object)
        .unwrap_or(root);

    let title = board
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(dashboard::UNTITLED)
        .to_string();
    let uid = board.get("uid").and_then(Value::as_str).map(String::from);
    let tags = board
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    let timezone = board
        .get("timezone")
        .and_then(Value::as_str)
        .unwrap_or(dashboard::DEFAULT_TIMEZONE)
        .to_string();

    let panels: Vec<PanelRecord> = board
        .get("panels")
        .and_then(Value::as_array)
        .map(|raw| raw.iter().filter_map(Value::as_object).map(analyze_panel).collect())
        .unwrap_or_default();
    debug!("Analyzed {} panel(s) of dashboard '{title}'", panels.len());

    let mut panel_type_counts = BTreeMap::new();
    for panel in &panels {
        *panel_type_counts.entry(panel.kind.clone()).or_insert(0) += 1;
    }

    DashboardAnalysis {
        repeated_panels: find_repeated_panels(&panels),
        repeated_values: find_repeated_values(&panels),
        data_sources: find_data_sources(&panels),
        common_targets: find_common_targets(&panels),
        dashboard_config: extract_dashboard_config(board),
        panel_type_counts,
        title,
        uid,
        tags,
        timezone,
        panels,
    }
}

/// Normalize one panel object into a `PanelRecord`.
pub fn analyze_panel(panel: &Map<String, Value>) -> PanelRecord {
    let mut known_properties = Map::new();
    let mut custom_properties = Map::new();
    let mut named_keys = Vec::new();
    let mut source_fields = Map::new();

    for (key, value) in panel {
        if !KNOWN_PANEL_KEYS.contains(key.as_str()) {
            custom_properties.insert(key.clone(), value.clone());
            continue;
        }
        named_keys.push(key.clone());
        if CORE_PANEL_KEYS.contains(key.as_str()) {
            source_fields.insert(key.clone(), value.clone());
        } else {
            known_properties.insert(key.clone(), value.clone());
        }
    }

    PanelRecord {
        id: panel.get("id").and_then(Value::as_i64).unwrap_or(0),
        kind: panel
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(dashboard::UNKNOWN_PANEL_TYPE)
            .to_string(),
        title: panel
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        grid_pos: panel
            .get("gridPos")
            .and_then(Value::as_object)
            .map(GridPos::from_map)
            .unwrap_or_default(),
        targets: object_list(panel.get("targets")),
        datasource: panel.get("datasource").and_then(resolve_datasource),
        options: object_map(panel.get("options")),
        field_config: object_map(panel.get("fieldConfig")),
        transformations: object_list(panel.get("transformations")),
        known_properties,
        custom_properties,
        named_keys,
        source_fields,
    }
}

fn object_list(value: Option<&Value>) -> Vec<Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).cloned().collect())
        .unwrap_or_default()
}

fn object_map(value: Option<&Value>) -> Map<String, Value> {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Scalar custom properties present on two or more panels with the same
/// value everywhere they occur, keyed as `panels.<key>`.
pub fn find_repeated_values(panels: &[PanelRecord]) -> Map<String, Value> {
    let mut order: Vec<String> = Vec::new();
    let mut occurrences: FxHashMap<String, Vec<&Value>> = FxHashMap::default();
    for panel in panels {
        for (key, value) in &panel.custom_properties {
            if !is_scalar(value) {
                continue;
            }
            let key_path = format!("panels.{key}");
            occurrences
                .entry(key_path.clone())
                .or_insert_with(|| {
                    order.push(key_path);
                    Vec::new()
                })
                .push(value);
        }
    }

    let mut repeated = Map::new();
    for key_path in order {
        let values = &occurrences[&key_path];
        if values.len() > 1 && values.iter().all(|v| *v == values[0]) {
            repeated.insert(key_path, values[0].clone());
        }
    }
    repeated
}

/// Every resolved datasource used by panels and their targets.
pub fn find_data_sources(panels: &[PanelRecord]) -> BTreeSet<String> {
    let mut sources = BTreeSet::new();
    for panel in panels {
        if let Some(ds) = &panel.datasource {
            sources.insert(ds.clone());
        }
        for target in &panel.targets {
            if let Some(ds) = target.get("datasource").and_then(resolve_datasource) {
                sources.insert(ds);
            }
        }
    }
    sources
}

/// Titles of panels configured to repeat over a template variable.
pub fn find_repeated_panels(panels: &[PanelRecord]) -> Vec<String> {
    panels
        .iter()
        .filter(|panel| panel.property("repeat").is_some_and(is_truthy))
        .map(|panel| panel.title.clone())
        .collect()
}

fn fingerprint(target: &QuerySpec) -> TargetFingerprint {
    let mut pairs: TargetFingerprint = target
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect();
    pairs.sort();
    pairs
}

/// Targets whose shape occurs at least twice across the dashboard, once
/// each, in first-seen order.
pub fn find_common_targets(panels: &[PanelRecord]) -> Vec<QuerySpec> {
    let all: Vec<(TargetFingerprint, &QuerySpec)> = panels
        .iter()
        .flat_map(|panel| panel.targets.iter())
        .map(|target| (fingerprint(target), target))
        .collect();

    let mut counts: FxHashMap<&TargetFingerprint, usize> = FxHashMap::default();
    for (print, _) in &all {
        *counts.entry(print).or_insert(0) += 1;
    }

    let mut common: Vec<QuerySpec> = Vec::new();
    for (print, target) in &all {
        if counts.get(print).copied().unwrap_or(0) > 1 && !common.contains(*target) {
            common.push((*target).clone());
        }
    }
    common
}

/// Copy the recognized dashboard-level keys that are present.
pub fn extract_dashboard_config(board: &Map<String, Value>) -> Map<String, Value> {
    dashboard::CONFIG_KEYS
        .iter()
        .filter_map(|key| board.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}
