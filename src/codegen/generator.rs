use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::analysis::patterns::{PatternMatch, PatternType};
use crate::codegen::emitter::{Arg, Element, Emitter, Expr, Field, Local, Param};
use crate::codegen::templates::{defaults_for, has_dedicated_defaults, template_name};
use crate::core::constants::{defaults, jsonnet, messages};
use crate::core::types::{DashboardAnalysis, PanelRecord, is_truthy};

/// Knobs for the code generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorOptions {
    pub extract_repeated: bool,
    pub create_templates: bool,
    pub add_comments: bool,
    /// Reserved; generated documents are always standalone
    pub include_imports: bool,
    pub indent_size: usize,
    pub max_line_length: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            extract_repeated: true,
            create_templates: true,
            add_comments: true,
            include_imports: false,
            indent_size: defaults::INDENT_SIZE,
            max_line_length: defaults::MAX_LINE_LENGTH,
        }
    }
}

/// What a binding replaces.
#[derive(Debug, Clone, PartialEq)]
enum Site {
    /// Map entries under this key holding the bound value
    Field(String),
    /// Elements of a `targets` sequence equal to the bound query
    Target,
}

#[derive(Debug, Clone)]
struct Binding {
    name: String,
    site: Site,
    value: Value,
}

/// Bindings in declaration order. The first binding matching a site wins.
#[derive(Debug, Default)]
struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    fn push(&mut self, name: &str, site: Site, value: Value) {
        let duplicate = self
            .entries
            .iter()
            .any(|b| b.site == site && b.value == value);
        if !duplicate {
            self.entries.push(Binding {
                name: name.to_string(),
                site,
                value,
            });
        }
    }

    fn field_match(&self, key: &str, value: &Value) -> Option<usize> {
        self.entries.iter().position(|b| match &b.site {
            Site::Field(field) => field == key && b.value == *value,
            Site::Target => false,
        })
    }

    fn target_match(&self, value: &Value) -> Option<usize> {
        self.entries
            .iter()
            .position(|b| b.site == Site::Target && b.value == *value)
    }

    /// Lower a map entry, replacing it with a reference when bound.
    fn lower_entry(&self, key: &str, value: &Value, hits: &mut [usize]) -> Expr {
        if let Some(index) = self.field_match(key, value) {
            hits[index] += 1;
            return Expr::reference(&self.entries[index].name);
        }

        match value {
            Value::Array(items) if key == "targets" => Expr::Array(
                items
                    .iter()
                    .map(|item| {
                        let value = match self.target_match(item) {
                            Some(index) => {
                                hits[index] += 1;
                                Expr::reference(&self.entries[index].name)
                            }
                            None => self.lower_value(item, hits),
                        };
                        Element {
                            comment: None,
                            value,
                        }
                    })
                    .collect(),
            ),
            _ => self.lower_value(value, hits),
        }
    }

    fn lower_value(&self, value: &Value, hits: &mut [usize]) -> Expr {
        match value {
            Value::Object(map) => Expr::Object(
                map.iter()
                    .map(|(key, value)| Field {
                        key: key.clone(),
                        value: self.lower_entry(key, value, hits),
                    })
                    .collect(),
            ),
            Value::Array(items) => Expr::array(items.iter().map(|item| self.lower_value(item, hits))),
            scalar => Expr::from(scalar),
        }
    }

    /// Drop bindings with no site and give the rest unique names.
    fn finalize(self, hits: &[usize], taken: &mut FxHashSet<String>) -> Self {
        let entries = self
            .entries
            .into_iter()
            .zip(hits)
            .filter(|(_, count)| **count > 0)
            .map(|(binding, _)| Binding {
                name: allocate_name(&binding.name, taken),
                ..binding
            })
            .collect();
        Self { entries }
    }
}

/// Make `base` a usable local name that is not yet in `taken`, numbering
/// repeats as `name`, `name2`, `name3`.
fn allocate_name(base: &str, taken: &mut FxHashSet<String>) -> String {
    let mut name: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push_str("value");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if jsonnet::KEYWORDS.contains(&name.as_str()) || jsonnet::RESERVED_NAMES.contains(&name.as_str())
    {
        name.push('_');
    }

    let mut candidate = name.clone();
    let mut counter = 2;
    while taken.contains(&candidate) {
        candidate = format!("{name}{counter}");
        counter += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// How one panel is written out before substitution.
enum PanelPlan<'a> {
    Literal {
        panel: &'a PanelRecord,
        fields: Vec<(String, Value)>,
    },
    Call {
        panel: &'a PanelRecord,
        function: String,
        named: Vec<(String, Value)>,
        overrides: Vec<(String, Value)>,
    },
}

impl PanelPlan<'_> {
    fn panel(&self) -> &PanelRecord {
        match self {
            Self::Literal { panel, .. } | Self::Call { panel, .. } => *panel,
        }
    }
}

struct Template {
    kind: String,
    name: String,
}

/// Renders a `DashboardAnalysis` and its detected patterns as Jsonnet.
#[derive(Debug, Clone, Default)]
pub struct JsonnetGenerator {
    options: GeneratorOptions,
}

impl JsonnetGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    fn emitter(&self) -> Emitter {
        Emitter::new(
            self.options.indent_size,
            self.options.max_line_length,
            self.options.add_comments,
        )
    }

    pub fn generate(&self, analysis: &DashboardAnalysis, patterns: &[PatternMatch]) -> String {
        if self.options.include_imports {
            debug!("Imports requested; generated output stays standalone");
        }

        let emitter = self.emitter();
        let mut taken: FxHashSet<String> = FxHashSet::default();

        let templates = self.plan_templates(analysis, &mut taken);
        let plans: Vec<PanelPlan> = analysis
            .panels
            .iter()
            .map(|panel| match templates.iter().find(|t| t.kind == panel.kind) {
                Some(template) => plan_call(panel, &template.name),
                None => PanelPlan::Literal {
                    panel,
                    fields: panel_fields(panel),
                },
            })
            .collect();

        let bindings = if self.options.extract_repeated {
            let candidates = collect_candidates(analysis, patterns);
            let mut hits = vec![0; candidates.entries.len()];
            for plan in &plans {
                lower_panel(plan, &candidates, &mut hits);
            }
            candidates.finalize(&hits, &mut taken)
        } else {
            Bindings::default()
        };

        let mut hits = vec![0; bindings.entries.len()];
        let panels: Vec<Element> = plans
            .iter()
            .map(|plan| Element {
                comment: repeat_comment(plan.panel()),
                value: lower_panel(plan, &bindings, &mut hits),
            })
            .collect();

        let mut sections: Vec<String> = Vec::new();
        let mut header = Vec::new();
        header.extend(emitter.comment(&analysis.title, 0));
        header.extend(emitter.comment(messages::GENERATED_BY, 0));
        if !header.is_empty() {
            sections.push(header.join("\n"));
        }

        if !bindings.entries.is_empty() {
            let mut lines = Vec::new();
            lines.extend(emitter.comment("Extracted values", 0));
            for binding in &bindings.entries {
                lines.push(emitter.render_local(&Local {
                    name: binding.name.clone(),
                    params: None,
                    body: Expr::from(&binding.value),
                }));
            }
            sections.push(lines.join("\n"));
        }

        if !templates.is_empty() {
            let functions: Vec<String> = templates
                .iter()
                .map(|template| emitter.render_local(&template_function(template)))
                .collect();
            let mut block = functions.join("\n\n");
            if let Some(comment) = emitter.comment("Panel templates", 0) {
                block = format!("{comment}\n{block}");
            }
            sections.push(block);
        }

        sections.push(emitter.render(&dashboard_literal(analysis, panels), 0, 0));

        info!(
            "Generated Jsonnet for '{}': {} local(s), {} template(s), {} panel(s)",
            analysis.title,
            bindings.entries.len(),
            templates.len(),
            analysis.panels.len()
        );

        let mut output = sections.join("\n\n");
        output.push('\n');
        output
    }

    fn plan_templates(
        &self,
        analysis: &DashboardAnalysis,
        taken: &mut FxHashSet<String>,
    ) -> Vec<Template> {
        if !self.options.create_templates {
            return Vec::new();
        }

        analysis
            .panel_types_in_order()
            .into_iter()
            .filter(|kind| analysis.panel_type_count(kind) >= defaults::MIN_TEMPLATE_PANELS)
            .map(|kind| {
                if !has_dedicated_defaults(kind) {
                    debug!("No default table for '{kind}'; template uses the generic one");
                }
                Template {
                    kind: kind.to_string(),
                    name: allocate_name(&template_name(kind), taken),
                }
            })
            .collect()
    }
}

/// One-shot form of `JsonnetGenerator::generate`.
pub fn generate(
    analysis: &DashboardAnalysis,
    patterns: &[PatternMatch],
    options: &GeneratorOptions,
) -> String {
    JsonnetGenerator::new(options.clone()).generate(analysis, patterns)
}

/// Every value worth a local, in declaration order: repeated custom
/// values, then detected patterns, then common targets.
fn collect_candidates(analysis: &DashboardAnalysis, patterns: &[PatternMatch]) -> Bindings {
    let mut bindings = Bindings::default();

    for (key_path, value) in &analysis.repeated_values {
        let field = key_path.strip_prefix("panels.").unwrap_or(key_path);
        bindings.push(field, Site::Field(field.to_string()), value.clone());
    }

    for pattern in patterns {
        if pattern.pattern_type == PatternType::PanelType {
            continue;
        }
        let field = pattern.field();
        bindings.push(field, Site::Field(field.to_string()), pattern.value.clone());
    }

    for target in &analysis.common_targets {
        bindings.push(
            jsonnet::COMMON_TARGET_NAME,
            Site::Target,
            Value::Object(target.clone()),
        );
    }

    debug!("Collected {} binding candidate(s)", bindings.entries.len());
    bindings
}

const PAYLOAD_KEYS: [&str; 5] = [
    "datasource",
    "targets",
    "options",
    "fieldConfig",
    "transformations",
];

/// The panel as an ordered list of fields: identity and layout first,
/// then the named fields, then known and custom properties.
fn panel_fields(panel: &PanelRecord) -> Vec<(String, Value)> {
    let mut fields = vec![
        ("id".to_string(), Value::from(panel.id)),
        ("type".to_string(), Value::from(panel.kind.as_str())),
        ("title".to_string(), Value::from(panel.title.as_str())),
        ("gridPos".to_string(), panel.grid_pos.to_value()),
    ];

    // Payload fields go out verbatim; the normalized copies only feed analysis
    for key in PAYLOAD_KEYS {
        if let Some(value) = panel.source_fields.get(key) {
            fields.push((key.to_string(), value.clone()));
        }
    }

    let extra = panel
        .known_properties
        .iter()
        .chain(panel.custom_properties.iter());
    fields.extend(extra.map(|(key, value)| (key.clone(), value.clone())));
    fields
}

/// Split a panel's fields into template call arguments.
fn plan_call<'a>(panel: &'a PanelRecord, function: &str) -> PanelPlan<'a> {
    let table = defaults_for(&panel.kind);
    let fields: Map<String, Value> = panel_fields(panel).into_iter().collect();

    let named = table
        .iter()
        .filter_map(|(key, default)| {
            fields
                .get(key)
                .filter(|value| *value != default)
                .map(|value| (key.clone(), value.clone()))
        })
        .collect();

    let overrides = fields
        .into_iter()
        .filter(|(key, _)| {
            !matches!(key.as_str(), "type" | "title" | "gridPos") && !table.contains_key(key)
        })
        .collect();

    PanelPlan::Call {
        panel,
        function: function.to_string(),
        named,
        overrides,
    }
}

fn lower_panel(plan: &PanelPlan, bindings: &Bindings, hits: &mut [usize]) -> Expr {
    let lower_fields = |fields: &[(String, Value)], hits: &mut [usize]| -> Vec<Field> {
        fields
            .iter()
            .map(|(key, value)| Field {
                key: key.clone(),
                value: bindings.lower_entry(key, value, hits),
            })
            .collect()
    };

    match plan {
        PanelPlan::Literal { fields, .. } => Expr::Object(lower_fields(fields, hits)),
        PanelPlan::Call {
            panel,
            function,
            named,
            overrides,
        } => {
            let mut args = vec![
                Arg::positional(bindings.lower_entry(
                    "title",
                    &Value::from(panel.title.as_str()),
                    hits,
                )),
                Arg::positional(bindings.lower_entry("gridPos", &panel.grid_pos.to_value(), hits)),
            ];
            args.extend(
                named
                    .iter()
                    .map(|(key, value)| Arg::named(key, bindings.lower_entry(key, value, hits))),
            );
            if !overrides.is_empty() {
                args.push(Arg::named(
                    jsonnet::OVERRIDES_PARAM,
                    Expr::Object(lower_fields(overrides, hits)),
                ));
            }
            Expr::Call {
                function: function.clone(),
                args,
            }
        }
    }
}

fn repeat_comment(panel: &PanelRecord) -> Option<String> {
    let variable = panel.property("repeat").filter(|v| is_truthy(v))?;
    let name = match variable {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(format!("Repeated by variable \"{name}\""))
}

fn template_function(template: &Template) -> Local {
    let table = defaults_for(&template.kind);

    let mut params = vec![
        Param {
            name: "title".to_string(),
            default: None,
        },
        Param {
            name: "gridPos".to_string(),
            default: None,
        },
    ];
    params.extend(table.iter().map(|(key, default)| Param {
        name: key.clone(),
        default: Some(Expr::from(default)),
    }));
    params.push(Param {
        name: jsonnet::OVERRIDES_PARAM.to_string(),
        default: Some(Expr::Object(Vec::new())),
    });

    let mut body = vec![
        ("type".to_string(), Expr::string(template.kind.as_str())),
        ("title".to_string(), Expr::reference("title")),
        ("gridPos".to_string(), Expr::reference("gridPos")),
    ];
    body.extend(
        table
            .keys()
            .map(|key| (key.clone(), Expr::reference(key.as_str()))),
    );

    Local {
        name: template.name.clone(),
        params: Some(params),
        body: Expr::Plus(
            Box::new(Expr::object(body)),
            Box::new(Expr::reference(jsonnet::OVERRIDES_PARAM)),
        ),
    }
}

/// The dashboard object: identity, remaining config keys, then panels.
fn dashboard_literal(analysis: &DashboardAnalysis, panels: Vec<Element>) -> Expr {
    let mut fields = vec![("title".to_string(), Expr::string(analysis.title.as_str()))];
    if let Some(uid) = &analysis.uid {
        fields.push(("uid".to_string(), Expr::string(uid.as_str())));
    }
    fields.push((
        "tags".to_string(),
        Expr::array(analysis.tags.iter().map(|tag| Expr::string(tag.as_str()))),
    ));
    fields.push((
        "timezone".to_string(),
        Expr::string(analysis.timezone.as_str()),
    ));

    for (key, value) in &analysis.dashboard_config {
        if matches!(key.as_str(), "title" | "uid" | "tags" | "timezone") {
            continue;
        }
        fields.push((key.clone(), Expr::from(value)));
    }

    fields.push(("panels".to_string(), Expr::Array(panels)));
    Expr::object(fields)
}
