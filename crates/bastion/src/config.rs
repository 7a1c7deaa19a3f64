//! Configuration types for the Bastion pipeline.
//!
//! All types implement [`serde::Deserialize`] with per-field defaults, so a
//! configuration file only needs to name what it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`ModelDefaults`] - Attribute values used when a diagram leaves them untagged.
//! - [`TemplateConfig`] - Anchor markers and the catalog reference swapped during rendering.
//! - [`ResultsConfig`] - Which relation of the checker's result holds violations.
//! - [`CheckerConfig`] - How the external checker is invoked.
//!
//! # Example
//!
//! ```
//! # use bastion::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.template().assets_anchor(), "// ASSETS_HERE");
//! assert_eq!(config.results().relation(), "has_threat");
//! ```

use serde::Deserialize;

pub use bastion_core::defaults::ModelDefaults;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Attribute defaults section.
    #[serde(default)]
    defaults: ModelDefaults,

    /// Template substitution section.
    #[serde(default)]
    template: TemplateConfig,

    /// Result interpretation section.
    #[serde(default)]
    results: ResultsConfig,

    /// External checker section.
    #[serde(default)]
    checker: CheckerConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        defaults: ModelDefaults,
        template: TemplateConfig,
        results: ResultsConfig,
        checker: CheckerConfig,
    ) -> Self {
        Self {
            defaults,
            template,
            results,
            checker,
        }
    }

    pub fn defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    pub fn template(&self) -> &TemplateConfig {
        &self.template
    }

    pub fn results(&self) -> &ResultsConfig {
        &self.results
    }

    pub fn checker(&self) -> &CheckerConfig {
        &self.checker
    }
}

/// Textual markers the renderer substitutes in a specification template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Marker replaced by the asset declarations.
    assets_anchor: String,

    /// Marker replaced by the data declarations.
    data_anchor: String,

    /// Marker replaced by the flow declarations.
    flows_anchor: String,

    /// Catalog reference found in the template.
    catalog_placeholder: String,

    /// Catalog reference written in its place.
    catalog: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            assets_anchor: "// ASSETS_HERE".to_string(),
            data_anchor: "// DATA_HERE".to_string(),
            flows_anchor: "// FLOWS_HERE".to_string(),
            catalog_placeholder: "open N2SF_ModelX_Catalog".to_string(),
            catalog: "open N2SF_Model2_Catalog".to_string(),
        }
    }
}

impl TemplateConfig {
    pub fn assets_anchor(&self) -> &str {
        &self.assets_anchor
    }

    pub fn data_anchor(&self) -> &str {
        &self.data_anchor
    }

    pub fn flows_anchor(&self) -> &str {
        &self.flows_anchor
    }

    pub fn catalog_placeholder(&self) -> &str {
        &self.catalog_placeholder
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Replace the catalog reference written into rendered documents.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = catalog.into();
        self
    }
}

/// Result interpretation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// Label of the field whose tuples are `(flow, threat)` pairs.
    relation: String,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            relation: "has_threat".to_string(),
        }
    }
}

impl ResultsConfig {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
        }
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }
}

/// Separator of Java classpath entries on this platform.
const CLASSPATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// External checker invocation settings.
///
/// `args` may contain the placeholders `{spec}` and `{output}`, expanded to
/// the generated specification path and the per-run result path. Relative
/// paths refer to the directory bastion is started from. The default runs
/// the `AlloyWrapper` class with `alloy.jar`, both in that directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    program: String,
    args: Vec<String>,

    /// Result file name, relative to the checker's working directory.
    output: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec![
                "-cp".to_string(),
                format!(".{CLASSPATH_SEPARATOR}alloy.jar"),
                "AlloyWrapper".to_string(),
                "{spec}".to_string(),
            ],
            output: "output.xml".to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn new(program: impl Into<String>, args: Vec<String>, output: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            output: output.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}
