use clap::Parser;
use grafana2jsonnet::codegen::{Emitter, scaffold};
use grafana2jsonnet::config::{CliConfig, Config};
use grafana2jsonnet::core::TransformError;
use grafana2jsonnet::pipeline::{TransformResult, transform_file, transform_str};
use grafana2jsonnet::reporting::logging;
use grafana2jsonnet::ui::completion::print_completions;
use grafana2jsonnet::ui::output;
use grafana2jsonnet::ui::{Cli, Commands, cli_to_config, parse_params};

use std::path::{Path, PathBuf};

fn main() {
    let cli = Cli::parse();

    // Handle subcommands first
    if let Some(exit_code) = handle_subcommands(&cli) {
        std::process::exit(exit_code);
    }

    if cli.input_path().is_none() && cli.json_string.is_none() {
        eprintln!("Error: No input provided");
        eprintln!("\nFor more information, try '--help'.");
        std::process::exit(1);
    }

    match run_transform(&cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Run a subcommand if one was given and return its exit code
pub fn handle_subcommands(cli: &Cli) -> Option<i32> {
    match &cli.command {
        Some(Commands::CompletionGenerate { shell }) => {
            print_completions(*shell);
            Some(0)
        }
        Some(Commands::Scaffold { template, params }) => {
            let result = parse_params(params).and_then(|params| {
                let config = load_and_merge_config(&cli_to_config(cli))?;
                let options = config.generator_options();
                let emitter = Emitter::new(
                    options.indent_size,
                    options.max_line_length,
                    options.add_comments,
                );
                scaffold(template, &params, &emitter)
            });
            match result {
                Ok(text) => {
                    print!("{text}");
                    Some(0)
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    Some(1)
                }
            }
        }
        None => None,
    }
}

/// Main transformation logic extracted from main() for testing
pub fn run_transform(cli: &Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let cli_config = cli_to_config(cli);
    let config = load_and_merge_config(&cli_config)?;

    let verbose = config.verbose.unwrap_or(false);
    logging::init_logger(verbose, cli_config.quiet);
    logging::log_config_info(&config);

    let options = config.to_transform_options(cli.output.as_ref().map(PathBuf::from));
    let result = match (&cli.json_string, cli.input_path()) {
        (Some(text), _) => transform_str(text, &options),
        (None, Some(path)) => transform_file(Path::new(path), &options),
        (None, None) => {
            return Err(TransformError::InvalidArgument("No input provided".to_string()).into());
        }
    };

    log_result(&result);
    output::display_result(&result, config.output_format(), cli_config.quiet)?;

    Ok(if result.success { 0 } else { 1 })
}

fn log_result(result: &TransformResult) {
    if let Some(analysis) = &result.analysis {
        logging::log_analysis_summary(analysis);
    }
    logging::log_patterns(&result.patterns);
    if let Some(path) = &result.output_file {
        logging::log_output_written(path, result.jsonnet.len());
    }
    for warning in &result.warnings {
        logging::log_warning(warning);
    }
    for error in &result.errors {
        logging::log_error(error, None);
    }
}

/// Load configuration from file or standard locations and merge with CLI config
pub fn load_and_merge_config(cli_config: &CliConfig) -> grafana2jsonnet::Result<Config> {
    let mut config = if cli_config.no_config {
        Config::default()
    } else if let Some(ref config_file) = cli_config.config_file {
        Config::load_from_file(config_file).inspect_err(|e| {
            logging::log_error(
                &format!("Could not load config file '{config_file}'"),
                Some(e),
            );
        })?
    } else {
        Config::load_from_standard_locations()
    };

    // Merge CLI arguments with configuration (CLI takes precedence)
    config.merge_with_cli(cli_config);
    config.validate()?;
    Ok(config)
}
