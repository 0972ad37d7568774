// Command-line interface definitions and parsing for grafana2jsonnet

use crate::config::CliConfig;
use crate::core::constants::output_formats;
use crate::core::error::{Result, TransformError};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Grafana dashboard JSON file to transform
    pub input: Option<String>,

    // Input & Output
    /// Input file (alternative to the positional argument)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        conflicts_with = "input",
        help_heading = "Input & Output"
    )]
    pub input_file: Option<String>,

    /// Dashboard JSON passed as a string
    #[arg(
        short = 's',
        long = "string",
        value_name = "JSON",
        conflicts_with_all = ["input", "input_file"],
        help_heading = "Input & Output"
    )]
    pub json_string: Option<String>,

    /// Write the generated Jsonnet to this file
    #[arg(short = 'o', long, value_name = "FILE", help_heading = "Input & Output")]
    pub output: Option<String>,

    /// Replace the output file if it exists
    #[arg(long, help_heading = "Input & Output")]
    pub overwrite: bool,

    // Generation
    /// Do not emit comments
    #[arg(long, help_heading = "Generation")]
    pub no_comments: bool,

    /// Do not extract repeated values into locals
    #[arg(long, help_heading = "Generation")]
    pub no_extract_repeated: bool,

    /// Do not create panel template functions
    #[arg(long, help_heading = "Generation")]
    pub no_templates: bool,

    /// Reserved for library imports
    #[arg(long, help_heading = "Generation")]
    pub include_imports: bool,

    /// Spaces per indentation level (default: 4)
    #[arg(long, value_name = "SPACES", help_heading = "Generation")]
    pub indent_size: Option<usize>,

    /// Wrap inline arrays past this width (default: 120)
    #[arg(long, value_name = "COLUMNS", help_heading = "Generation")]
    pub max_line_length: Option<usize>,

    // Analysis
    /// Occurrences needed before a value counts as a pattern (default: 2)
    #[arg(long = "min-occurrences", value_name = "COUNT", help_heading = "Analysis")]
    pub min_occurrences: Option<usize>,

    /// Skip structural validation of the input
    #[arg(long, help_heading = "Analysis")]
    pub no_validate: bool,

    // Output & Verbosity
    /// Suppress the summary output
    #[arg(short = 'q', long, help_heading = "Output & Verbosity")]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long, help_heading = "Output & Verbosity")]
    pub verbose: bool,

    /// Output format (default: text)
    #[arg(long, value_name = "FORMAT", value_parser = output_formats::ALL, help_heading = "Output & Verbosity")]
    pub format: Option<String>,

    // Configuration
    /// Use specific config file
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Ignore config files
    #[arg(long, help_heading = "Configuration")]
    pub no_config: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a starter Jsonnet dashboard
    #[command(arg_required_else_help = true)]
    Scaffold {
        /// Template to start from (kubernetes, prometheus, empty)
        template: String,

        /// Template parameter as key=value, may be repeated
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Generate shell completions
    #[command(name = "completion-generate", arg_required_else_help = true)]
    CompletionGenerate {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    /// The input file, from either the positional argument or `--input`
    pub fn input_path(&self) -> Option<&str> {
        self.input.as_deref().or(self.input_file.as_deref())
    }
}

/// Convert parsed CLI arguments into a CliConfig
pub fn cli_to_config(cli: &Cli) -> CliConfig {
    CliConfig {
        min_pattern_occurrences: cli.min_occurrences,
        no_validate: cli.no_validate,
        no_extract_repeated: cli.no_extract_repeated,
        no_templates: cli.no_templates,
        no_comments: cli.no_comments,
        include_imports: cli.include_imports,
        indent_size: cli.indent_size,
        max_line_length: cli.max_line_length,
        overwrite: cli.overwrite,
        quiet: cli.quiet,
        verbose: cli.verbose,
        output_format: cli.format.clone(),
        config_file: cli.config.clone(),
        no_config: cli.no_config,
    }
}

/// Parse `key=value` scaffold parameters
pub fn parse_params(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for item in raw {
        let Some((key, value)) = item.split_once('=') else {
            return Err(TransformError::InvalidArgument(format!(
                "Parameter '{item}' is not in key=value form"
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(TransformError::InvalidArgument(format!(
                "Parameter '{item}' has an empty key"
            )));
        }
        params.insert(key.to_string(), value.trim().to_string());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["grafana2jsonnet"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_to_config_default() {
        let config = cli_to_config(&parse(&["board.json"]));

        assert_eq!(config.min_pattern_occurrences, None);
        assert_eq!(config.indent_size, None);
        assert_eq!(config.max_line_length, None);
        assert_eq!(config.output_format, None);
        assert!(!config.no_comments);
        assert!(!config.no_templates);
        assert!(!config.overwrite);
        assert!(!config.no_config);
    }

    #[test]
    fn test_cli_to_config_all_options() {
        let cli = parse(&[
            "board.json",
            "-o",
            "out.jsonnet",
            "--overwrite",
            "--no-comments",
            "--no-extract-repeated",
            "--no-templates",
            "--include-imports",
            "--indent-size",
            "2",
            "--max-line-length",
            "80",
            "--min-occurrences",
            "3",
            "--no-validate",
            "--format",
            "json",
            "--config",
            "custom.toml",
            "-v",
        ]);
        let config = cli_to_config(&cli);

        assert_eq!(cli.output.as_deref(), Some("out.jsonnet"));
        assert!(config.overwrite);
        assert!(config.no_comments);
        assert!(config.no_extract_repeated);
        assert!(config.no_templates);
        assert!(config.include_imports);
        assert_eq!(config.indent_size, Some(2));
        assert_eq!(config.max_line_length, Some(80));
        assert_eq!(config.min_pattern_occurrences, Some(3));
        assert!(config.no_validate);
        assert_eq!(config.output_format, Some("json".to_string()));
        assert_eq!(config.config_file, Some("custom.toml".to_string()));
        assert!(config.verbose);
    }

    #[test]
    fn test_input_sources() {
        assert_eq!(parse(&["a.json"]).input_path(), Some("a.json"));
        assert_eq!(parse(&["-i", "b.json"]).input_path(), Some("b.json"));

        let cli = parse(&["-s", r#"{"panels": []}"#]);
        assert_eq!(cli.input_path(), None);
        assert!(cli.json_string.is_some());
    }

    #[test]
    fn test_conflicting_inputs_rejected() {
        let result = Cli::try_parse_from(["grafana2jsonnet", "a.json", "-s", "{}"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_format_rejected() {
        let result = Cli::try_parse_from(["grafana2jsonnet", "a.json", "--format", "yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_scaffold_subcommand() {
        let cli = parse(&["scaffold", "kubernetes", "--param", "cluster_name=prod"]);
        match cli.command {
            Some(Commands::Scaffold { template, params }) => {
                assert_eq!(template, "kubernetes");
                assert_eq!(params, vec!["cluster_name=prod"]);
            }
            _ => panic!("Expected scaffold subcommand"),
        }
    }

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["a=1".to_string(), " b = two ".to_string()]).unwrap();
        assert_eq!(params.get("a"), Some(&"1".to_string()));
        assert_eq!(params.get("b"), Some(&"two".to_string()));

        let params = parse_params(&["url=http://x?a=b".to_string()]).unwrap();
        assert_eq!(params.get("url"), Some(&"http://x?a=b".to_string()));
    }

    #[test]
    fn test_parse_params_invalid() {
        assert!(parse_params(&["novalue".to_string()]).is_err());
        assert!(parse_params(&["=value".to_string()]).is_err());
    }
}
