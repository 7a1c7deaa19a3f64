//! Result Interpreter.
//!
//! Reads the checker's XML result document and reports every `(flow,
//! threat)` pair of the configured relation:
//!
//! ```xml
//! <alloy>
//!   <instance>
//!     <field label="has_threat">
//!       <tuple><atom label="Obj_f_1$0"/><atom label="catalog/TH_M2_21$0"/></tuple>
//!     </field>
//!   </instance>
//! </alloy>
//! ```
//!
//! Atom labels are reduced to their domain identifiers: a module path
//! prefix and a trailing `$<digits>` instance suffix are dropped.

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::config::ResultsConfig;

/// Marker the checker boundary embeds in its output when it failed.
const ERROR_MARKER: &str = "<error>";

/// Why a result document could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// The document is empty or carries the checker's error marker. Holds
    /// the upstream output.
    #[error("Invalid XML output or execution error")]
    Upstream(String),

    /// The document is not well-formed XML.
    #[error("XML Parse Error: {0}")]
    Malformed(String),
}

/// One unmitigated threat found by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    flow: String,
    threat: String,
    description: String,
}

impl Violation {
    pub fn new(flow: impl Into<String>, threat: impl Into<String>) -> Self {
        let flow = flow.into();
        let threat = threat.into();
        let description = format!("Flow {flow} has unmitigated threat {threat}");
        Self {
            flow,
            threat,
            description,
        }
    }

    pub fn flow(&self) -> &str {
        &self.flow
    }

    pub fn threat(&self) -> &str {
        &self.threat
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A record of the pipeline's response: a violation, or the synthetic
/// error record that stands in for an uninterpretable result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Finding {
    Violation(Violation),
    Error { error: String },
}

impl From<Violation> for Finding {
    fn from(violation: Violation) -> Self {
        Finding::Violation(violation)
    }
}

impl From<InterpretError> for Finding {
    fn from(err: InterpretError) -> Self {
        Finding::Error {
            error: err.to_string(),
        }
    }
}

/// Interprets checker result documents.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: ResultsConfig,
}

impl Interpreter {
    pub fn new(config: ResultsConfig) -> Self {
        Self { config }
    }

    /// Extract the violations of the configured relation, in document
    /// order and without deduplication.
    ///
    /// A document without the relation has no violations.
    ///
    /// # Errors
    ///
    /// - [`InterpretError::Upstream`] for empty output or output carrying
    ///   the error marker.
    /// - [`InterpretError::Malformed`] when the output is not XML.
    pub fn interpret(&self, output: &str) -> Result<Vec<Violation>, InterpretError> {
        if output.trim().is_empty() || output.contains(ERROR_MARKER) {
            debug!(output = output; "Checker reported an error");
            return Err(InterpretError::Upstream(output.to_string()));
        }

        let doc = roxmltree::Document::parse(output)
            .map_err(|err| InterpretError::Malformed(err.to_string()))?;

        let relation = self.config.relation();
        let Some(field) = doc.descendants().find(|node| {
            node.has_tag_name("field") && node.attribute("label") == Some(relation)
        }) else {
            info!(relation = relation; "Relation not in result, no violations");
            return Ok(Vec::new());
        };

        let violations: Vec<Violation> = field
            .children()
            .filter(|node| node.has_tag_name("tuple"))
            .filter_map(|tuple| {
                let mut labels = tuple
                    .children()
                    .filter(|node| node.has_tag_name("atom"))
                    .filter_map(|atom| atom.attribute("label"));
                match (labels.next(), labels.next()) {
                    (Some(flow), Some(threat)) => {
                        Some(Violation::new(atom_name(flow), atom_name(threat)))
                    }
                    _ => {
                        warn!(relation = relation; "Skipping tuple with fewer than two atoms");
                        None
                    }
                }
            })
            .collect();

        info!(relation = relation, violations = violations.len(); "Result interpreted");
        Ok(violations)
    }

    /// Like [`interpret`](Self::interpret), but folds a failure into a
    /// single [`Finding::Error`] record.
    pub fn findings(&self, output: &str) -> Vec<Finding> {
        match self.interpret(output) {
            Ok(violations) => violations.into_iter().map(Finding::from).collect(),
            Err(err) => vec![Finding::from(err)],
        }
    }
}

/// Domain identifier of an atom label.
fn atom_name(label: &str) -> &str {
    let name = label.rsplit('/').next().unwrap_or(label);
    match name.rsplit_once('$') {
        Some((prefix, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => {
            prefix
        }
        _ => name,
    }
}
