//! Bastion - threat-model diagrams to formal specifications.
//!
//! Extracts assets, data and flows from a threat-model diagram, renders them
//! into a specification template for an external model checker, and reads
//! the unmitigated threats back out of the checker's result.

pub mod checker;
pub mod config;
pub mod interpret;
pub mod render;

mod error;

pub use bastion_core::{defaults, identifier, model};
pub use bastion_parser::{Extraction, ModelWarning};

pub use error::BastionError;

use std::{io::Write as _, path::Path};

use log::{debug, info, trace};
use serde::Serialize;

use bastion_parser::ModelBuilder;

use checker::Checker;
use config::AppConfig;
use interpret::{Finding, InterpretError, Interpreter, Violation};
use model::IntermediateModel;
use render::Renderer;

/// Value of [`AnalysisReport::status`] for a completed analysis.
const STATUS_SUCCESS: &str = "success";

/// Facade over the extraction, rendering and interpretation stages.
///
/// # Examples
///
/// ```rust,no_run
/// use bastion::{Analyzer, checker::ProcessChecker, config::AppConfig};
///
/// let diagram = std::fs::read_to_string("threat-model.json").expect("Failed to read diagram");
///
/// let config = AppConfig::default();
/// let analyzer = Analyzer::new(config.clone());
/// let checker = ProcessChecker::new(config.checker().clone());
///
/// let report = analyzer
///     .analyze(&diagram, "template.als", &checker)
///     .expect("Failed to analyze");
///
/// for finding in report.violations() {
///     println!("{finding:?}");
/// }
/// ```
#[derive(Debug, Default)]
pub struct Analyzer {
    config: AppConfig,
}

impl Analyzer {
    /// Create an analyzer with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the Intermediate Model of a diagram document.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Parse`] when `source` is not a JSON document.
    /// Problems with individual cells are reported as warnings in the
    /// returned [`Extraction`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bastion::Analyzer;
    ///
    /// let extraction = Analyzer::default()
    ///     .extract(r#"{"detail": {"diagrams": []}}"#)
    ///     .expect("Failed to extract");
    /// assert!(extraction.model().is_empty());
    /// ```
    pub fn extract(&self, source: &str) -> Result<Extraction, BastionError> {
        info!("Extracting model");
        let extraction = ModelBuilder::new(self.config.defaults().clone())
            .build_str(source)
            .map_err(|err| BastionError::new_parse_error(err, source))?;

        for warning in extraction.warnings() {
            debug!(warning:% = warning; "Extraction warning");
        }
        trace!(model:? = extraction.model(); "Extracted model");
        Ok(extraction)
    }

    /// Render a model into an in-memory template.
    pub fn render(&self, template: &str, model: &IntermediateModel) -> String {
        self.renderer().render(template, model)
    }

    /// Render a model into the template stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Io`] when the template cannot be read.
    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        model: &IntermediateModel,
    ) -> Result<String, BastionError> {
        self.renderer().render_file(path, model)
    }

    /// Interpret a checker result document.
    ///
    /// # Errors
    ///
    /// See [`Interpreter::interpret`].
    pub fn interpret(&self, output: &str) -> Result<Vec<Violation>, InterpretError> {
        self.interpreter().interpret(output)
    }

    /// Interpret a checker result document, folding failures into a
    /// synthetic error record.
    pub fn findings(&self, output: &str) -> Vec<Finding> {
        self.interpreter().findings(output)
    }

    /// Run the whole pipeline: extract, render, check once, interpret.
    ///
    /// The rendered specification is written to a temporary file that lives
    /// for the duration of the check.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed diagram document, an unreadable
    /// template, or a failed checker run. An uninterpretable result is not
    /// an error; it becomes a [`Finding::Error`] in the report.
    pub fn analyze(
        &self,
        diagram: &str,
        template_path: impl AsRef<Path>,
        checker: &dyn Checker,
    ) -> Result<AnalysisReport, BastionError> {
        let (model, warnings) = self.extract(diagram)?.into_parts();
        let specification = self.render_file(template_path, &model)?;

        let mut spec_file = tempfile::Builder::new()
            .prefix("bastion-")
            .suffix(".als")
            .tempfile()?;
        spec_file.write_all(specification.as_bytes())?;
        spec_file.flush()?;
        debug!(path:? = spec_file.path(); "Specification written");

        let output = checker.check(spec_file.path())?;
        let violations = self.findings(&output);

        info!(
            violations = violations.len(),
            warnings = warnings.len();
            "Analysis complete"
        );

        Ok(AnalysisReport {
            status: STATUS_SUCCESS,
            violations,
            specification,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        })
    }

    fn renderer(&self) -> Renderer {
        Renderer::new(self.config.template().clone())
    }

    fn interpreter(&self) -> Interpreter {
        Interpreter::new(self.config.results().clone())
    }
}

/// Outcome of [`Analyzer::analyze`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    status: &'static str,
    violations: Vec<Finding>,
    specification: String,
    warnings: Vec<String>,
}

impl AnalysisReport {
    pub fn status(&self) -> &str {
        self.status
    }

    pub fn violations(&self) -> &[Finding] {
        &self.violations
    }

    /// The generated specification document.
    pub fn specification(&self) -> &str {
        &self.specification
    }

    /// Extraction warnings, one line each.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Serialize the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Report`] if serialization fails.
    pub fn to_json(&self) -> Result<String, BastionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
