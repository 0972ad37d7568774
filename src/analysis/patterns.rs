use log::debug;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::core::constants::{dashboard, defaults};
use crate::core::types::{DatasourceRef, is_truthy};

/// Families of recurring values the detector looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Colors,
    Thresholds,
    Legend,
    Tooltip,
    Axis,
    Datasource,
    PanelType,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colors => "colors",
            Self::Thresholds => "thresholds",
            Self::Legend => "legend",
            Self::Tooltip => "tooltip",
            Self::Axis => "axis",
            Self::Datasource => "datasource",
            Self::PanelType => "panel_type",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One group of identical values found on at least `min_occurrences` panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMatch {
    pub pattern_type: PatternType,
    pub value: Value,
    pub occurrences: usize,
    /// Locator template such as `panels[].colors`
    pub path: String,
    pub suggestion: String,
}

impl PatternMatch {
    /// The panel key this match was collected from (`colors` for `panels[].colors`).
    pub fn field(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// Groups values by structural equality while remembering first-seen order.
struct Grouper {
    index: FxHashMap<String, usize>,
    groups: Vec<(Value, usize)>,
}

impl Grouper {
    fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            groups: Vec::new(),
        }
    }

    fn add(&mut self, value: &Value) {
        let key = canonical_json(value);
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1 += 1,
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push((value.clone(), 1));
            }
        }
    }

    fn qualifying(self, min_occurrences: usize) -> impl Iterator<Item = (Value, usize)> {
        self.groups
            .into_iter()
            .filter(move |(_, count)| *count >= min_occurrences)
    }
}

/// Serialize with object keys sorted at every level so that maps differing
/// only in key order share a key.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .into_iter()
                .map(|(key, value)| format!("{}:{}", Value::from(key.as_str()), canonical_json(value)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        scalar => scalar.to_string(),
    }
}

/// Finds values repeated across panels that are worth extracting.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    min_occurrences: usize,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(defaults::MIN_PATTERN_OCCURRENCES)
    }
}

impl PatternDetector {
    pub fn new(min_occurrences: usize) -> Self {
        Self { min_occurrences }
    }

    pub fn min_occurrences(&self) -> usize {
        self.min_occurrences
    }

    /// Scan the panels of `tree` and return every qualifying group, family
    /// by family, groups in first-seen order.
    pub fn detect(&self, tree: &Value) -> Vec<PatternMatch> {
        let panels = panels_of(tree);
        let mut matches = Vec::new();

        self.detect_colors(&panels, &mut matches);
        self.detect_thresholds(&panels, &mut matches);
        self.detect_legends(&panels, &mut matches);
        self.detect_axes(&panels, &mut matches);
        self.detect_tooltips(&panels, &mut matches);
        self.detect_datasources(&panels, &mut matches);
        self.detect_panel_types(&panels, &mut matches);

        debug!(
            "Detected {} pattern(s) across {} panel(s) (min occurrences: {})",
            matches.len(),
            panels.len(),
            self.min_occurrences
        );
        matches
    }

    fn collect<'a, F>(&self, panels: &[&'a Map<String, Value>], pick: F) -> Vec<(Value, usize)>
    where
        F: Fn(&'a Map<String, Value>) -> Option<Value>,
    {
        let mut grouper = Grouper::new();
        for value in panels.iter().filter_map(|panel| pick(panel)) {
            grouper.add(&value);
        }
        grouper.qualifying(self.min_occurrences).collect()
    }

    fn detect_colors(&self, panels: &[&Map<String, Value>], out: &mut Vec<PatternMatch>) {
        let groups = self.collect(panels, |panel| {
            panel
                .get("colors")
                .filter(|colors| colors.as_array().is_some_and(|items| !items.is_empty()))
                .cloned()
        });
        for (value, occurrences) in groups {
            let suggestion = format!("Extract to local variable: local colors = {value};");
            out.push(PatternMatch {
                pattern_type: PatternType::Colors,
                value,
                occurrences,
                path: "panels[].colors".to_string(),
                suggestion,
            });
        }
    }

    fn detect_thresholds(&self, panels: &[&Map<String, Value>], out: &mut Vec<PatternMatch>) {
        let groups = self.collect(panels, |panel| truthy_field(panel, "thresholds"));
        for (value, occurrences) in groups {
            out.push(PatternMatch {
                pattern_type: PatternType::Thresholds,
                value,
                occurrences,
                path: "panels[].thresholds".to_string(),
                suggestion: "Extract to local variable for consistent threshold styling"
                    .to_string(),
            });
        }
    }

    fn detect_legends(&self, panels: &[&Map<String, Value>], out: &mut Vec<PatternMatch>) {
        let groups = self.collect(panels, |panel| {
            panel
                .get("legend")
                .filter(|legend| legend.as_object().is_some_and(|map| !map.is_empty()))
                .cloned()
        });
        for (value, occurrences) in groups {
            out.push(PatternMatch {
                pattern_type: PatternType::Legend,
                value,
                occurrences,
                path: "panels[].legend".to_string(),
                suggestion: "Extract to local variable for consistent legend configuration"
                    .to_string(),
            });
        }
    }

    fn detect_axes(&self, panels: &[&Map<String, Value>], out: &mut Vec<PatternMatch>) {
        // Grouped on (axis kind, value) so xaxis and yaxes never merge.
        let mut grouper = Grouper::new();
        for panel in panels {
            for axis in ["xaxis", "yaxes"] {
                if let Some(value) = truthy_field(panel, axis) {
                    grouper.add(&Value::Array(vec![Value::from(axis), value]));
                }
            }
        }

        for (tagged, occurrences) in grouper.qualifying(self.min_occurrences) {
            let Value::Array(mut pair) = tagged else {
                continue;
            };
            let value = pair.pop().unwrap_or(Value::Null);
            let axis = pair.pop().and_then(|v| v.as_str().map(String::from)).unwrap_or_default();
            out.push(PatternMatch {
                pattern_type: PatternType::Axis,
                value,
                occurrences,
                path: format!("panels[].{axis}"),
                suggestion: format!("Extract {axis} configuration to local variable"),
            });
        }
    }

    fn detect_tooltips(&self, panels: &[&Map<String, Value>], out: &mut Vec<PatternMatch>) {
        let groups = self.collect(panels, |panel| truthy_field(panel, "tooltip"));
        for (value, occurrences) in groups {
            out.push(PatternMatch {
                pattern_type: PatternType::Tooltip,
                value,
                occurrences,
                path: "panels[].tooltip".to_string(),
                suggestion: "Extract tooltip configuration to local variable".to_string(),
            });
        }
    }

    fn detect_datasources(&self, panels: &[&Map<String, Value>], out: &mut Vec<PatternMatch>) {
        let groups = self.collect(panels, |panel| {
            let raw = panel.get("datasource").filter(|ds| is_truthy(ds))?;
            let resolved = match DatasourceRef::from_value(raw)? {
                DatasourceRef::StringRef(name) => name,
                object => object
                    .resolve()
                    .unwrap_or(dashboard::UNKNOWN_DATASOURCE)
                    .to_string(),
            };
            Some(Value::String(resolved))
        });
        for (value, occurrences) in groups {
            let suggestion = format!(
                "Extract {} to datasources local variable",
                value.as_str().unwrap_or_default()
            );
            out.push(PatternMatch {
                pattern_type: PatternType::Datasource,
                value,
                occurrences,
                path: "panels[].datasource".to_string(),
                suggestion,
            });
        }
    }

    fn detect_panel_types(&self, panels: &[&Map<String, Value>], out: &mut Vec<PatternMatch>) {
        let groups = self.collect(panels, |panel| {
            let kind = panel
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(dashboard::UNKNOWN_PANEL_TYPE);
            Some(Value::from(kind))
        });
        for (value, occurrences) in groups {
            let suggestion = format!(
                "Create template function for {} panels",
                value.as_str().unwrap_or_default()
            );
            out.push(PatternMatch {
                pattern_type: PatternType::PanelType,
                value,
                occurrences,
                path: "panels[].type".to_string(),
                suggestion,
            });
        }
    }
}

fn panels_of(tree: &Value) -> Vec<&Map<String, Value>> {
    let board = tree.get("dashboard").filter(|d| d.is_object()).unwrap_or(tree);
    board
        .get("panels")
        .and_then(Value::as_array)
        .map(|panels| panels.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

fn truthy_field(panel: &Map<String, Value>, key: &str) -> Option<Value> {
    panel.get(key).filter(|value| is_truthy(value)).cloned()
}

/// One line per panel-type match suggesting a template function.
pub fn template_suggestions(matches: &[PatternMatch]) -> Vec<String> {
    matches
        .iter()
        .filter(|m| m.pattern_type == PatternType::PanelType)
        .map(|m| {
            format!(
                "Create {}Panel template function for {} panels",
                m.value.as_str().unwrap_or_default(),
                m.occurrences
            )
        })
        .collect()
}

/// Suggestions for every match that would become a local binding.
pub fn extraction_suggestions(matches: &[PatternMatch]) -> Vec<String> {
    matches
        .iter()
        .filter(|m| m.pattern_type != PatternType::PanelType)
        .map(|m| m.suggestion.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dashboard_with(panels: Value) -> Value {
        json!({"dashboard": {"title": "Patterns", "panels": panels}})
    }

    fn of_type(matches: &[PatternMatch], kind: PatternType) -> Vec<&PatternMatch> {
        matches.iter().filter(|m| m.pattern_type == kind).collect()
    }

    #[test]
    fn test_colors_above_threshold() {
        let colors = json!(["#5794f2", "#b877d9"]);
        let tree = dashboard_with(json!([
            {"type": "graph", "colors": colors},
            {"type": "stat", "colors": colors},
            {"type": "table", "colors": colors}
        ]));

        let matches = PatternDetector::new(2).detect(&tree);
        let colors_matches = of_type(&matches, PatternType::Colors);
        assert_eq!(colors_matches.len(), 1);
        assert_eq!(colors_matches[0].occurrences, 3);
        assert_eq!(colors_matches[0].value, colors);
        assert_eq!(colors_matches[0].path, "panels[].colors");
    }

    #[test]
    fn test_colors_below_threshold() {
        let tree = dashboard_with(json!([{"type": "graph", "colors": ["#5794f2", "#b877d9"]}]));
        let matches = PatternDetector::new(2).detect(&tree);
        assert!(of_type(&matches, PatternType::Colors).is_empty());
    }

    #[test]
    fn test_empty_colors_ignored() {
        let tree = dashboard_with(json!([{"colors": []}, {"colors": []}]));
        let matches = PatternDetector::default().detect(&tree);
        assert!(of_type(&matches, PatternType::Colors).is_empty());
    }

    #[test]
    fn test_threshold_groups_ignore_key_order() {
        let tree = dashboard_with(json!([
            {"thresholds": {"mode": "absolute", "steps": [1, 2]}},
            {"thresholds": {"steps": [1, 2], "mode": "absolute"}}
        ]));
        let matches = PatternDetector::default().detect(&tree);
        let thresholds = of_type(&matches, PatternType::Thresholds);
        assert_eq!(thresholds.len(), 1);
        assert_eq!(thresholds[0].occurrences, 2);
        // First-seen instance is kept as the representative value
        assert_eq!(
            canonical_json(&thresholds[0].value),
            canonical_json(&json!({"mode": "absolute", "steps": [1, 2]}))
        );
    }

    #[test]
    fn test_legend_requires_map() {
        let tree = dashboard_with(json!([
            {"legend": true},
            {"legend": true},
            {"legend": {"show": true}},
            {"legend": {"show": true}}
        ]));
        let matches = PatternDetector::default().detect(&tree);
        let legends = of_type(&matches, PatternType::Legend);
        assert_eq!(legends.len(), 1);
        assert_eq!(legends[0].value, json!({"show": true}));
    }

    #[test]
    fn test_axis_kinds_are_kept_apart() {
        let axis = json!({"show": true});
        let tree = dashboard_with(json!([
            {"xaxis": axis, "yaxes": axis},
            {"xaxis": axis},
            {"yaxes": axis}
        ]));
        let matches = PatternDetector::default().detect(&tree);
        let axes = of_type(&matches, PatternType::Axis);
        assert_eq!(axes.len(), 2);
        assert_eq!(axes[0].path, "panels[].xaxis");
        assert_eq!(axes[0].field(), "xaxis");
        assert_eq!(axes[1].path, "panels[].yaxes");
        assert_eq!(axes[1].occurrences, 2);
    }

    #[test]
    fn test_datasource_resolution() {
        let tree = dashboard_with(json!([
            {"datasource": "prometheus"},
            {"datasource": {"type": "prometheus", "uid": "abc"}},
            {"datasource": {"name": "mystery"}},
            {"datasource": {"name": "other"}}
        ]));
        let matches = PatternDetector::default().detect(&tree);
        let sources = of_type(&matches, PatternType::Datasource);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].value, "prometheus");
        assert_eq!(sources[0].occurrences, 2);
        assert_eq!(sources[1].value, "unknown");
    }

    #[test]
    fn test_panel_types_first_seen_order() {
        let tree = json!({"panels": [
            {"type": "stat"},
            {"type": "graph"},
            {"type": "graph"},
            {"type": "stat"},
            {}
        ]});
        let matches = PatternDetector::default().detect(&tree);
        let kinds: Vec<&Value> = of_type(&matches, PatternType::PanelType)
            .into_iter()
            .map(|m| &m.value)
            .collect();
        assert_eq!(kinds, vec![&json!("stat"), &json!("graph")]);
    }

    #[test]
    fn test_family_order() {
        let tree = dashboard_with(json!([
            {"type": "graph", "datasource": "loki", "tooltip": {"shared": true}, "colors": ["#fff"]},
            {"type": "graph", "datasource": "loki", "tooltip": {"shared": true}, "colors": ["#fff"]}
        ]));
        let kinds: Vec<PatternType> = PatternDetector::default()
            .detect(&tree)
            .into_iter()
            .map(|m| m.pattern_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                PatternType::Colors,
                PatternType::Tooltip,
                PatternType::Datasource,
                PatternType::PanelType
            ]
        );
    }

    #[test]
    fn test_detect_is_repeatable() {
        let tree = dashboard_with(json!([
            {"type": "graph", "colors": ["#fff"]},
            {"type": "graph", "colors": ["#fff"]}
        ]));
        let detector = PatternDetector::default();
        assert_eq!(detector.detect(&tree), detector.detect(&tree));
    }

    #[test]
    fn test_detect_on_non_dashboard() {
        assert!(PatternDetector::default().detect(&json!("text")).is_empty());
        assert!(PatternDetector::default().detect(&json!({})).is_empty());
    }

    #[test]
    fn test_suggestion_helpers() {
        let tree = dashboard_with(json!([
            {"type": "graph", "colors": ["#fff"]},
            {"type": "graph", "colors": ["#fff"]}
        ]));
        let matches = PatternDetector::default().detect(&tree);

        assert_eq!(
            template_suggestions(&matches),
            vec!["Create graphPanel template function for 2 panels"]
        );
        let extraction = extraction_suggestions(&matches);
        assert_eq!(extraction.len(), 1);
        assert!(extraction[0].contains("local colors"));
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let a = json!({"b": {"y": 1, "x": 2}, "a": [1, {"d": 0, "c": 1}]});
        let b = json!({"a": [1, {"c": 1, "d": 0}], "b": {"x": 2, "y": 1}});
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_ne!(canonical_json(&json!([1, 2])), canonical_json(&json!([2, 1])));
    }

    #[test]
    fn test_pattern_type_display() {
        assert_eq!(PatternType::PanelType.to_string(), "panel_type");
        assert_eq!(
            serde_json::to_value(PatternType::PanelType).unwrap(),
            json!("panel_type")
        );
    }
}
