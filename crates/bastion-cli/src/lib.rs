//! CLI logic for the Bastion threat-model analyzer.
//!
//! This module contains the core CLI logic: loading configuration, running
//! the requested pipeline stage, and writing its output.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::fs;

use log::{info, warn};
use serde::Serialize;

use bastion::{
    Analyzer, BastionError, Extraction, checker::ProcessChecker, model::IntermediateModel,
};

use error_adapter::warning_reportable;

/// JSON form of an extraction.
#[derive(Serialize)]
struct ExtractOutput<'a> {
    model: &'a IntermediateModel,
    warnings: Vec<String>,
}

/// Run the Bastion CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `BastionError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed diagram documents
/// - Checker failures
/// - Unreadable results in strict mode
pub fn run(args: &Args) -> Result<(), BastionError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let analyzer = Analyzer::new(app_config);

    match &args.command {
        Command::Extract { input, output } => {
            info!(input_path = input; "Extracting model");
            let extraction = extract(&analyzer, input)?;

            let json = serde_json::to_string_pretty(&ExtractOutput {
                model: extraction.model(),
                warnings: warning_lines(&extraction),
            })?;
            emit(output.as_deref(), &json)
        }
        Command::Render {
            input,
            template,
            output,
        } => {
            info!(input_path = input, template_path = template; "Rendering specification");
            let extraction = extract(&analyzer, input)?;
            let specification = analyzer.render_file(template, extraction.model())?;

            fs::write(output, specification)?;
            info!(output_file = output; "Specification written");
            Ok(())
        }
        Command::Interpret {
            input,
            strict,
            output,
        } => {
            info!(input_path = input; "Interpreting checker result");
            let result = fs::read_to_string(input)?;

            let json = if *strict {
                serde_json::to_string_pretty(&analyzer.interpret(&result)?)?
            } else {
                serde_json::to_string_pretty(&analyzer.findings(&result))?
            };
            emit(output.as_deref(), &json)
        }
        Command::Analyze {
            input,
            template,
            output,
        } => {
            info!(input_path = input, template_path = template; "Analyzing diagram");
            let diagram = fs::read_to_string(input)?;
            let checker = ProcessChecker::new(analyzer.config().checker().clone());

            let report = analyzer.analyze(&diagram, template, &checker)?;
            emit(output.as_deref(), &report.to_json()?)
        }
    }
}

/// Extract the model of the diagram at `path`, logging its warnings.
fn extract(analyzer: &Analyzer, path: &str) -> Result<Extraction, BastionError> {
    let source = fs::read_to_string(path)?;
    let extraction = analyzer.extract(&source)?;
    report_warnings(&extraction);
    Ok(extraction)
}

fn report_warnings(extraction: &Extraction) {
    let reporter = miette::GraphicalReportHandler::new();
    for warning in extraction.warnings() {
        let mut writer = String::new();
        match reporter.render_report(&mut writer, &warning_reportable(warning)) {
            Ok(()) => warn!("{writer}"),
            Err(_) => warn!("{warning}"),
        }
    }
}

fn warning_lines(extraction: &Extraction) -> Vec<String> {
    extraction
        .warnings()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Write `content` to `output`, or to stdout when no path is given.
fn emit(output: Option<&str>, content: &str) -> Result<(), BastionError> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            info!(output_file = path; "Output written");
        }
        None => println!("{content}"),
    }
    Ok(())
}
