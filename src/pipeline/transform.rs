use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::analysis::{PatternDetector, PatternMatch, analyze};
use crate::codegen::{GeneratorOptions, JsonnetGenerator};
use crate::core::constants::{defaults, messages};
use crate::core::error::TransformError;
use crate::core::types::DashboardAnalysis;
use crate::loader::{DocumentShape, LoadDashboard, Loader, classify, extract_dashboard, parse_str};
use crate::pipeline::writer::{WriteToFile, Writer, write_output};

/// Settings for one transformation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOptions {
    /// Run the structural checks and report problems as warnings
    pub validate: bool,
    pub min_pattern_occurrences: usize,
    pub generator: GeneratorOptions,
    /// Where to write the generated Jsonnet, if anywhere
    pub output_file: Option<PathBuf>,
    pub overwrite: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            validate: true,
            min_pattern_occurrences: defaults::MIN_PATTERN_OCCURRENCES,
            generator: GeneratorOptions::default(),
            output_file: None,
            overwrite: false,
        }
    }
}

/// Outcome of a transformation. `success` holds exactly when `errors` is empty.
#[derive(Debug, Clone, Serialize)]
pub struct TransformResult {
    pub success: bool,
    pub jsonnet: String,
    pub analysis: Option<DashboardAnalysis>,
    pub patterns: Vec<PatternMatch>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub output_file: Option<PathBuf>,
}

impl TransformResult {
    fn failed(error: TransformError, warnings: Vec<String>) -> Self {
        warn!("Transformation failed: {error}");
        Self {
            success: false,
            jsonnet: String::new(),
            analysis: None,
            patterns: Vec::new(),
            errors: vec![error.to_string()],
            warnings,
            output_file: None,
        }
    }
}

/// Transform the dashboard stored at `path`.
pub fn transform_file(path: &Path, options: &TransformOptions) -> TransformResult {
    debug!("Transforming {}", path.display());
    match Loader::default().load(path) {
        Ok(document) => transform_tree(document.tree, document.warnings, options, &Writer),
        Err(err) => TransformResult::failed(err, Vec::new()),
    }
}

/// Transform dashboard JSON held in memory.
pub fn transform_str(text: &str, options: &TransformOptions) -> TransformResult {
    match parse_str(text) {
        Ok(tree) => transform_tree(tree, Vec::new(), options, &Writer),
        Err(err) => TransformResult::failed(err, Vec::new()),
    }
}

/// Run validation, analysis, detection and generation over a parsed tree,
/// then write the output file if one was requested.
pub fn transform_tree(
    tree: Value,
    mut warnings: Vec<String>,
    options: &TransformOptions,
    writer: &dyn WriteToFile,
) -> TransformResult {
    let mut errors = Vec::new();

    if options.validate {
        // Nested documents are checked one level down, where the dashboard lives
        let subject = match classify(&tree) {
            DocumentShape::Nested { key, .. } => &tree[key],
            _ => &tree,
        };
        for problem in crate::loader::validate(subject) {
            let message = format!("{}{problem}", messages::VALIDATION_WARNING_PREFIX);
            warn!("{message}");
            warnings.push(message);
        }
    }

    let board = extract_dashboard(&tree);
    let analysis = analyze(&board);
    let patterns = PatternDetector::new(options.min_pattern_occurrences).detect(&board);
    info!("Analyzed {analysis}; {} pattern(s) detected", patterns.len());

    let jsonnet = JsonnetGenerator::new(options.generator.clone()).generate(&analysis, &patterns);

    let mut output_file = None;
    if let Some(path) = &options.output_file {
        match write_output(writer, path, &jsonnet, options.overwrite) {
            Ok(()) => {
                info!("Jsonnet written to {}", path.display());
                output_file = Some(path.clone());
            }
            Err(err @ TransformError::OutputExists(_)) => warnings.push(err.to_string()),
            Err(err) => errors.push(format!("Failed to write {}: {err}", path.display())),
        }
    }

    TransformResult {
        success: errors.is_empty(),
        jsonnet,
        analysis: Some(analysis),
        patterns,
        errors,
        warnings,
        output_file,
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    struct FailingWriter;

    impl WriteToFile for FailingWriter {
        fn write_to_file(&self, _path: &Path, _data: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    const SIMPLE: &str = r#"{
        "dashboard": {
            "title": "Simple Dashboard",
            "panels": [
                {"id": 1, "type": "graph", "title": "CPU Usage", "datasource": "prometheus"},
                {"id": 2, "type": "graph", "title": "Memory", "datasource": "prometheus"}
            ]
        }
    }"#;

    #[test]
    fn test_transform_str__success() {
        let result = transform_str(SIMPLE, &TransformOptions::default());

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert!(result.jsonnet.contains("Simple Dashboard"));
        assert!(result.jsonnet.contains("local graphPanel("));
        let analysis = result.analysis.expect("analysis present");
        assert_eq!(analysis.panels.len(), 2);
        assert!(!result.patterns.is_empty());
    }

    #[test]
    fn test_transform_str__invalid_json() {
        let result = transform_str("{invalid json}", &TransformOptions::default());

        assert!(!result.success);
        assert!(result.jsonnet.is_empty());
        assert!(result.analysis.is_none());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Failed to parse JSON"));
    }

    #[test]
    fn test_transform_str__validation_problems_are_warnings() {
        let result = transform_str(r#"{"title": "No panels"}"#, &TransformOptions::default());

        assert!(result.success);
        assert_eq!(
            result.warnings,
            vec!["Validation warning: Missing 'dashboard' or 'panels' field"]
        );
        assert!(result.jsonnet.contains("title: \"No panels\""));
    }

    #[test]
    fn test_transform_str__validation_disabled() {
        let options = TransformOptions {
            validate: false,
            ..TransformOptions::default()
        };
        let result = transform_str(r#"{"title": "No panels"}"#, &options);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_transform_str__nested_document() {
        let text = r#"{"spec": {"dashboard": {"title": "Nested", "panels": []}}}"#;
        let result = transform_str(text, &TransformOptions::default());

        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert_eq!(result.analysis.map(|a| a.title), Some("Nested".to_string()));
    }

    #[test]
    fn test_transform_file__missing() {
        let result = transform_file(Path::new("/nonexistent/board.json"), &TransformOptions::default());

        assert!(!result.success);
        assert!(result.errors[0].starts_with("File not found"));
        assert!(result.jsonnet.is_empty());
    }

    #[test]
    fn test_transform_file__writes_output() -> TestResult {
        let dir = TempDir::new()?;
        let input = dir.path().join("board.json");
        fs::write(&input, SIMPLE)?;
        let output = dir.path().join("out").join("board.jsonnet");

        let options = TransformOptions {
            output_file: Some(output.clone()),
            ..TransformOptions::default()
        };
        let result = transform_file(&input, &options);

        assert!(result.success);
        assert_eq!(result.output_file.as_deref(), Some(output.as_path()));
        assert_eq!(fs::read_to_string(&output)?, result.jsonnet);
        Ok(())
    }

    #[test]
    fn test_transform_file__existing_output_is_warning() -> TestResult {
        let dir = TempDir::new()?;
        let input = dir.path().join("board.json");
        fs::write(&input, SIMPLE)?;
        let output = dir.path().join("board.jsonnet");
        fs::write(&output, "keep me")?;

        let options = TransformOptions {
            output_file: Some(output.clone()),
            ..TransformOptions::default()
        };
        let result = transform_file(&input, &options);

        assert!(result.success);
        assert!(result.output_file.is_none());
        assert!(result.warnings.iter().any(|w| w.starts_with("Output file exists")));
        assert_eq!(fs::read_to_string(&output)?, "keep me");
        assert!(!result.jsonnet.is_empty());
        Ok(())
    }

    #[test]
    fn test_transform_tree__write_failure_keeps_text() -> TestResult {
        let dir = TempDir::new()?;
        let options = TransformOptions {
            output_file: Some(dir.path().join("out.jsonnet")),
            ..TransformOptions::default()
        };
        let tree = parse_str(SIMPLE)?;
        let result = transform_tree(tree, Vec::new(), &options, &FailingWriter);

        assert!(!result.success);
        assert!(result.errors[0].contains("read-only"));
        assert!(result.jsonnet.contains("Simple Dashboard"));
        Ok(())
    }

    #[test]
    fn test_transform_file__non_json_extension_warns() -> TestResult {
        let dir = TempDir::new()?;
        let input = dir.path().join("board.txt");
        fs::write(&input, SIMPLE)?;

        let result = transform_file(&input, &TransformOptions::default());
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        Ok(())
    }
}
