use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::codegen::emitter::{Emitter, Expr};
use crate::core::constants::{dashboard, messages};
use crate::core::error::{Result, TransformError};

/// Starter dashboards that can be generated without an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldTemplate {
    Kubernetes,
    Prometheus,
    Empty,
}

impl ScaffoldTemplate {
    pub const ALL: [ScaffoldTemplate; 3] = [Self::Kubernetes, Self::Prometheus, Self::Empty];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Prometheus => "prometheus",
            Self::Empty => "empty",
        }
    }

    /// Parameters understood by the template with their defaults.
    pub fn parameters(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Kubernetes => &[("cluster_name", "my-cluster"), ("namespace", "default")],
            Self::Prometheus => &[("job_name", "prometheus")],
            Self::Empty => &[("title", "New Dashboard")],
        }
    }
}

impl fmt::Display for ScaffoldTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaffoldTemplate {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|template| template.name() == s)
            .ok_or_else(|| TransformError::InvalidArgument(format!("Unknown template: {s}")))
    }
}

/// Render the starter dashboard `name` with `params` filled in.
pub fn scaffold(name: &str, params: &BTreeMap<String, String>, emitter: &Emitter) -> Result<String> {
    let template: ScaffoldTemplate = name.parse()?;

    for key in params.keys() {
        if !template.parameters().iter().any(|(known, _)| *known == key.as_str()) {
            debug!("Ignoring parameter '{key}' for template '{template}'");
        }
    }

    let param = |key: &str| -> String {
        params.get(key).cloned().unwrap_or_else(|| {
            template
                .parameters()
                .iter()
                .find(|(known, _)| *known == key)
                .map(|(_, default)| default.to_string())
                .unwrap_or_default()
        })
    };

    let (heading, body) = match template {
        ScaffoldTemplate::Kubernetes => {
            let cluster = param("cluster_name");
            let namespace = param("namespace");
            (
                format!("Kubernetes Dashboard for {cluster}"),
                starter(
                    format!("Kubernetes Cluster - {cluster}"),
                    Some(format!("kubernetes-{cluster}")),
                    vec!["kubernetes".to_string(), "cluster".to_string(), namespace],
                    "now-6h",
                    Some("5s"),
                ),
            )
        }
        ScaffoldTemplate::Prometheus => {
            let job = param("job_name");
            (
                format!("Prometheus Dashboard for {job}"),
                starter(
                    format!("Prometheus - {job}"),
                    Some(format!("prometheus-{job}")),
                    vec!["prometheus".to_string(), "metrics".to_string()],
                    "now-1h",
                    Some("15s"),
                ),
            )
        }
        ScaffoldTemplate::Empty => {
            let title = param("title");
            (title.clone(), starter(title, None, Vec::new(), "now-6h", None))
        }
    };

    let mut lines: Vec<String> = Vec::new();
    lines.extend(emitter.comment(&heading, 0));
    lines.extend(emitter.comment(messages::GENERATED_BY, 0));
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(emitter.render(&body, 0, 0));

    let mut output = lines.join("\n");
    output.push('\n');
    Ok(output)
}

fn starter(
    title: String,
    uid: Option<String>,
    tags: Vec<String>,
    from: &str,
    refresh: Option<&str>,
) -> Expr {
    let mut fields = vec![("title", Expr::string(title))];
    if let Some(uid) = uid {
        fields.push(("uid", Expr::string(uid)));
    }
    fields.push(("tags", Expr::array(tags.into_iter().map(Expr::string))));
    fields.push(("timezone", Expr::string(dashboard::DEFAULT_TIMEZONE)));
    fields.push(("schemaVersion", Expr::Number(38.into())));
    fields.push(("version", Expr::Number(1.into())));
    fields.push(("panels", Expr::array([])));
    fields.push((
        "time",
        Expr::object([("from", Expr::string(from)), ("to", Expr::string("now"))]),
    ));
    if let Some(refresh) = refresh {
        fields.push(("refresh", Expr::string(refresh)));
    }
    Expr::object(fields)
}
