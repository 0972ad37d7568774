use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value, json};

use crate::core::constants::jsonnet;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("Failed to compile type name pattern"));

/// Ordered default field tables keyed by panel type.
static PANEL_DEFAULTS: Lazy<FxHashMap<&'static str, Map<String, Value>>> = Lazy::new(|| {
    let tables = [
        (
            "graph",
            json!({
                "legend": {
                    "show": true,
                    "values": false,
                    "min": false,
                    "max": false,
                    "current": false,
                    "total": false,
                    "avg": false
                },
                "tooltip": {"shared": true, "sort": 0, "include_null": false},
                "colors": ["#5794f2", "#b877d9", "#f2495c"],
                "thresholds": threshold_steps(),
                "lines": true,
                "fill": 1,
                "linewidth": 1,
                "pointradius": 2,
                "bars": false,
                "percentage": false,
                "steppedLine": false
            }),
        ),
        (
            "timeseries",
            json!({
                "transparent": false,
                "legend": {
                    "show": true,
                    "displayMode": "list",
                    "placement": "bottom",
                    "calcs": []
                },
                "fillOpacity": 80,
                "showPoints": "auto",
                "unit": "short"
            }),
        ),
        (
            "stat",
            json!({
                "colorMode": "value",
                "graphMode": "area",
                "justifyMode": "auto",
                "textMode": "auto",
                "unit": "short"
            }),
        ),
        (
            "gauge",
            json!({
                "min": 0,
                "max": 100,
                "thresholds": threshold_steps(),
                "showThresholdLabels": false,
                "showThresholdMarkers": true
            }),
        ),
        (
            "table",
            json!({
                "showHeader": true,
                "sortBy": null,
                "columnStyles": []
            }),
        ),
        (
            "piechart",
            json!({
                "pieType": "pie",
                "displayLabels": ["name", "percent"],
                "legend": {
                    "displayMode": "list",
                    "placement": "right",
                    "values": ["value"]
                }
            }),
        ),
        (
            "barchart",
            json!({
                "orientation": "auto",
                "barWidth": 0.97,
                "groupWidth": 0.7,
                "lineWidth": 1,
                "fillOpacity": 80,
                "gradientMode": "none"
            }),
        ),
        (
            "heatmap",
            json!({
                "colorScale": "spectral",
                "cards": {"padding": 1, "spacing": 1},
                "colorScheme": "interpolateSpectral"
            }),
        ),
        (
            "logs",
            json!({
                "showLabels": false,
                "showCommonLabels": false,
                "wrapLogMessage": false,
                "prettifyLogMessage": false
            }),
        ),
        (
            "text",
            json!({
                "content": "",
                "mode": "markdown"
            }),
        ),
    ];

    tables
        .into_iter()
        .filter_map(|(kind, table)| match table {
            Value::Object(map) => Some((kind, map)),
            _ => None,
        })
        .collect()
});

static GENERIC_DEFAULTS: Lazy<Map<String, Value>> = Lazy::new(|| {
    let mut map = Map::new();
    map.insert("transparent".to_string(), Value::Bool(false));
    map.insert("links".to_string(), Value::Array(Vec::new()));
    map
});

fn threshold_steps() -> Value {
    json!({
        "mode": "absolute",
        "steps": [
            {"color": "green", "value": null},
            {"color": "green", "value": 80},
            {"color": "red", "value": 90}
        ]
    })
}

/// Default fields for `kind`, falling back to the generic table.
pub fn defaults_for(kind: &str) -> &'static Map<String, Value> {
    PANEL_DEFAULTS.get(kind).unwrap_or(&GENERIC_DEFAULTS)
}

/// Whether `kind` has a dedicated default table.
pub fn has_dedicated_defaults(kind: &str) -> bool {
    PANEL_DEFAULTS.contains_key(kind)
}

/// Name of the template function generated for `kind`, e.g. `graphPanel`.
pub fn template_name(kind: &str) -> String {
    let base = NON_ALPHANUMERIC.replace_all(kind, "_");
    let base = if base.is_empty() { "panel".into() } else { base };
    let prefix = if base.starts_with(|c: char| c.is_ascii_digit()) {
        "_"
    } else {
        ""
    };
    format!("{prefix}{base}{}", jsonnet::TEMPLATE_SUFFIX)
}
