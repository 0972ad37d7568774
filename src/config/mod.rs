//! Configuration management
//!
//! This module handles loading and managing configuration from
//! TOML files and CLI arguments.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::GeneratorOptions;
use crate::core::constants::{defaults, limits, output_formats};
use crate::core::error::{Result, TransformError};
use crate::pipeline::TransformOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum identical values before a pattern is reported
    pub min_pattern_occurrences: Option<usize>,

    /// Extract repeated values into local bindings
    pub extract_repeated: Option<bool>,

    /// Synthesize per-type panel template functions
    pub create_templates: Option<bool>,

    /// Emit header and section comments
    pub add_comments: Option<bool>,

    /// Reserved for library imports
    pub include_imports: Option<bool>,

    /// Spaces per nesting level
    pub indent_size: Option<usize>,

    /// Width at which inline sequences wrap
    pub max_line_length: Option<usize>,

    /// Run structural checks on the input
    pub validate: Option<bool>,

    /// Replace an existing output file
    pub overwrite: Option<bool>,

    /// Output format (text, json, minimal)
    pub output_format: Option<String>,

    /// Enable verbose logging
    pub verbose: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_pattern_occurrences: Some(defaults::MIN_PATTERN_OCCURRENCES),
            extract_repeated: Some(true),
            create_templates: Some(true),
            add_comments: Some(true),
            include_imports: Some(false),
            indent_size: Some(defaults::INDENT_SIZE),
            max_line_length: Some(defaults::MAX_LINE_LENGTH),
            validate: Some(true),
            overwrite: Some(false),
            output_format: Some(output_formats::DEFAULT.to_string()),
            verbose: Some(false),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TransformError::Config(format!(
                "Could not read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            TransformError::Config(format!(
                "Invalid TOML in config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Try to find and load a config file in standard locations
    pub fn load_from_standard_locations() -> Self {
        for path in Self::candidate_paths() {
            if let Ok(config) = Self::load_from_file(&path) {
                return config;
            }
        }

        Self::default()
    }

    /// The current directory followed by its parents, up to the search depth
    fn candidate_paths() -> Vec<PathBuf> {
        (0..=defaults::CONFIG_SEARCH_DEPTH)
            .map(|depth| {
                let mut path = PathBuf::from("../".repeat(depth));
                path.push(defaults::CONFIG_FILE_NAME);
                path
            })
            .collect()
    }

    /// Merge this config with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli_config: &CliConfig) {
        // Analysis
        if let Some(min) = cli_config.min_pattern_occurrences {
            self.min_pattern_occurrences = Some(min);
        }
        if cli_config.no_validate {
            self.validate = Some(false);
        }

        // Generation
        if cli_config.no_extract_repeated {
            self.extract_repeated = Some(false);
        }
        if cli_config.no_templates {
            self.create_templates = Some(false);
        }
        if cli_config.no_comments {
            self.add_comments = Some(false);
        }
        if cli_config.include_imports {
            self.include_imports = Some(true);
        }
        if let Some(indent) = cli_config.indent_size {
            self.indent_size = Some(indent);
        }
        if let Some(width) = cli_config.max_line_length {
            self.max_line_length = Some(width);
        }

        // Output & format
        if cli_config.overwrite {
            self.overwrite = Some(true);
        }
        if cli_config.verbose {
            self.verbose = Some(true);
        }
        if let Some(ref output_format) = cli_config.output_format {
            self.output_format = Some(output_format.clone());
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Some(indent) = self.indent_size
            && !(limits::MIN_INDENT_SIZE..=limits::MAX_INDENT_SIZE).contains(&indent)
        {
            return Err(TransformError::Config(format!(
                "Indent size {indent} is out of range. Expected a value between {}-{}.",
                limits::MIN_INDENT_SIZE,
                limits::MAX_INDENT_SIZE
            )));
        }

        if let Some(width) = self.max_line_length
            && width < limits::MIN_LINE_LENGTH
        {
            return Err(TransformError::Config(format!(
                "Max line length {width} is too small. Expected at least {}.",
                limits::MIN_LINE_LENGTH
            )));
        }

        if let Some(min) = self.min_pattern_occurrences
            && min < limits::MIN_PATTERN_OCCURRENCES
        {
            return Err(TransformError::Config(
                "Minimum pattern occurrences cannot be 0. Expected a positive integer.".to_string(),
            ));
        }

        if let Some(ref format) = self.output_format
            && !output_formats::ALL.contains(&format.as_str())
        {
            return Err(TransformError::Config(format!(
                "Invalid output format '{format}'. Expected one of: {}.",
                output_formats::ALL.join(", ")
            )));
        }

        Ok(())
    }

    pub fn output_format(&self) -> &str {
        self.output_format
            .as_deref()
            .unwrap_or(output_formats::DEFAULT)
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        let defaults = GeneratorOptions::default();
        GeneratorOptions {
            extract_repeated: self.extract_repeated.unwrap_or(defaults.extract_repeated),
            create_templates: self.create_templates.unwrap_or(defaults.create_templates),
            add_comments: self.add_comments.unwrap_or(defaults.add_comments),
            include_imports: self.include_imports.unwrap_or(defaults.include_imports),
            indent_size: self.indent_size.unwrap_or(defaults.indent_size),
            max_line_length: self.max_line_length.unwrap_or(defaults.max_line_length),
        }
    }

    /// Options for one transformation writing to `output_file`, if given
    pub fn to_transform_options(&self, output_file: Option<PathBuf>) -> TransformOptions {
        TransformOptions {
            validate: self.validate.unwrap_or(true),
            min_pattern_occurrences: self
                .min_pattern_occurrences
                .unwrap_or(defaults::MIN_PATTERN_OCCURRENCES),
            generator: self.generator_options(),
            output_file,
            overwrite: self.overwrite.unwrap_or(false),
        }
    }
}

/// Configuration options that can come from CLI
#[derive(Debug, Default)]
pub struct CliConfig {
    // Analysis
    pub min_pattern_occurrences: Option<usize>, // --min-occurrences
    pub no_validate: bool,                      // --no-validate

    // Generation
    pub no_extract_repeated: bool,      // --no-extract-repeated
    pub no_templates: bool,             // --no-templates
    pub no_comments: bool,              // --no-comments
    pub include_imports: bool,          // --include-imports
    pub indent_size: Option<usize>,     // --indent-size
    pub max_line_length: Option<usize>, // --max-line-length

    // Output & format
    pub overwrite: bool,               // --overwrite
    pub quiet: bool,                   // --quiet
    pub verbose: bool,                 // --verbose
    pub output_format: Option<String>, // --format

    // Configuration
    pub config_file: Option<String>, // --config
    pub no_config: bool,             // --no-config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.indent_size, Some(4));
        assert_eq!(config.max_line_length, Some(120));
        assert_eq!(config.min_pattern_occurrences, Some(2));
        assert_eq!(config.extract_repeated, Some(true));
        assert_eq!(
            config.output_format,
            Some(output_formats::DEFAULT.to_string())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"indent_size = 2\nadd_comments = false\noutput_format = \"json\"")?;

        let config = Config::load_from_file(file.path())?;
        assert_eq!(config.indent_size, Some(2));
        assert_eq!(config.add_comments, Some(false));
        assert_eq!(config.output_format(), "json");
        // Keys absent from the file stay unset
        assert_eq!(config.max_line_length, None);

        Ok(())
    }

    #[test]
    fn test_config_load_from_file_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"indent_size = \"four").unwrap();

        match Config::load_from_file(file.path()) {
            Err(TransformError::Config(message)) => assert!(message.contains("Invalid TOML")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_load_from_file_nonexistent() {
        let result = Config::load_from_file("/nonexistent/.grafana2jsonnet.toml");
        assert!(matches!(result, Err(TransformError::Config(_))));
    }

    #[test]
    fn test_config_load_from_file_with_validation() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"indent_size = 0")?;

        assert!(Config::load_from_file(file.path()).is_err());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_config_load_from_standard_locations() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested)?;
        fs::write(
            dir.path().join("a").join(defaults::CONFIG_FILE_NAME),
            "max_line_length = 80\n",
        )?;

        let original = std::env::current_dir()?;
        std::env::set_current_dir(&nested)?;
        let config = Config::load_from_standard_locations();
        std::env::set_current_dir(original)?;

        assert_eq!(config.max_line_length, Some(80));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_config_load_from_standard_locations_falls_back() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let original = std::env::current_dir()?;
        std::env::set_current_dir(dir.path())?;
        let config = Config::load_from_standard_locations();
        std::env::set_current_dir(original)?;

        // Tempdir parents may hold a config on a developer machine; only
        // assert the result is usable.
        assert!(config.validate().is_ok());
        Ok(())
    }

    #[test]
    fn test_config_merge_with_cli() {
        let mut config = Config::default();
        let cli_config = CliConfig {
            min_pattern_occurrences: Some(3),
            no_comments: true,
            no_templates: true,
            indent_size: Some(2),
            verbose: true,
            ..Default::default()
        };

        config.merge_with_cli(&cli_config);

        assert_eq!(config.min_pattern_occurrences, Some(3));
        assert_eq!(config.add_comments, Some(false));
        assert_eq!(config.create_templates, Some(false));
        assert_eq!(config.indent_size, Some(2));
        assert_eq!(config.verbose, Some(true));
    }

    #[test]
    fn test_config_merge_preserves_unset_values() {
        let mut config = Config {
            indent_size: Some(8),
            add_comments: Some(false),
            ..Config::default()
        };
        config.merge_with_cli(&CliConfig::default());

        assert_eq!(config.indent_size, Some(8));
        assert_eq!(config.add_comments, Some(false));
        assert_eq!(config.extract_repeated, Some(true));
    }

    #[test]
    fn test_config_validation_invalid_indent() {
        for indent in [0, 17] {
            let config = Config {
                indent_size: Some(indent),
                ..Config::default()
            };
            assert!(config.validate().is_err(), "indent {indent} accepted");
        }
    }

    #[test]
    fn test_config_validation_invalid_line_length() {
        let config = Config {
            max_line_length: Some(19),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_min_occurrences() {
        let config = Config {
            min_pattern_occurrences: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_output_format() {
        let config = Config {
            output_format: Some("yaml".to_string()),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("text, json, minimal"));
    }

    #[test]
    fn test_config_validation_edge_case_values() -> Result<()> {
        let config = Config {
            indent_size: Some(16),
            max_line_length: Some(20),
            min_pattern_occurrences: Some(1),
            ..Config::default()
        };
        config.validate()
    }

    #[test]
    fn test_to_transform_options() {
        let config = Config {
            add_comments: Some(false),
            overwrite: Some(true),
            min_pattern_occurrences: None,
            ..Config::default()
        };
        let options = config.to_transform_options(Some(PathBuf::from("out.jsonnet")));

        assert!(!options.generator.add_comments);
        assert!(options.generator.extract_repeated);
        assert!(options.overwrite);
        assert_eq!(options.min_pattern_occurrences, 2);
        assert_eq!(options.output_file, Some(PathBuf::from("out.jsonnet")));
    }
}
