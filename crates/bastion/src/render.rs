//! Specification Renderer.
//!
//! Fills a specification template with one declaration block per entity of
//! an [`IntermediateModel`]. The block layout is a textual contract with the
//! template's signatures, so attribute order and spelling are fixed:
//!
//! ```text
//! one sig Obj_a extends Asset {}
//! fact {
//!     Obj_a.level = Open
//!     Obj_a.zone = Internal
//!     Obj_a.status = Secure
//!     Obj_a.is_registered = True
//!     Obj_a.has_agent = True
//! }
//! ```
//!
//! Rendering is pure: the same model and template always produce the same
//! document.

use std::{fmt::Write as _, fs, path::Path};

use log::{debug, info, warn};

use bastion_core::{
    flag::flag_token,
    model::{Asset, DataObject, Flow, IntermediateModel},
};

use crate::{config::TemplateConfig, error::BastionError};

/// Renders models into specification documents.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: TemplateConfig,
}

impl Renderer {
    pub fn new(config: TemplateConfig) -> Self {
        Self { config }
    }

    /// Substitute the model's declarations into `template`.
    ///
    /// Each anchor is replaced by its block, and the catalog placeholder by
    /// the configured catalog. Everything else is passed through. A missing
    /// anchor is logged and its block is left out.
    pub fn render(&self, template: &str, model: &IntermediateModel) -> String {
        info!(
            assets = model.assets().len(),
            data = model.data_objects().len(),
            flows = model.flows().len();
            "Rendering specification"
        );

        let assets: String = model.assets().iter().map(asset_block).collect();
        let data: String = model.data_objects().iter().map(data_block).collect();
        let flows: String = model
            .flows()
            .iter()
            .map(|flow| flow_block(model, flow))
            .collect();

        let document = [
            (self.config.assets_anchor(), assets),
            (self.config.data_anchor(), data),
            (self.config.flows_anchor(), flows),
        ]
        .into_iter()
        .fold(template.to_string(), |document, (anchor, block)| {
            substitute(document, anchor, &block)
        });

        let document = document.replace(self.config.catalog_placeholder(), self.config.catalog());
        debug!(bytes = document.len(); "Specification rendered");
        document
    }

    /// Read the template at `path` and render the model into it.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Io`] when the template cannot be read.
    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        model: &IntermediateModel,
    ) -> Result<String, BastionError> {
        let path = path.as_ref();
        debug!(path:? = path; "Reading specification template");
        let template = fs::read_to_string(path)?;
        Ok(self.render(&template, model))
    }
}

fn substitute(document: String, anchor: &str, block: &str) -> String {
    if !document.contains(anchor) {
        warn!(anchor = anchor; "Template has no anchor, declarations left out");
        return document;
    }
    document.replace(anchor, block)
}

fn asset_block(asset: &Asset) -> String {
    let id = asset.id();
    let mut block = String::new();
    write!(
        block,
        "\none sig {id} extends {kind} {{}}\n\
         fact {{\n\
         \x20   {id}.level = {level}\n\
         \x20   {id}.zone = {zone}\n\
         \x20   {id}.status = {status}\n\
         \x20   {id}.is_registered = {registered}\n\
         \x20   {id}.has_agent = {agent}\n\
         }}\n",
        kind = asset.asset_type(),
        level = asset.level(),
        zone = asset.zone(),
        status = asset.status(),
        registered = flag_token(asset.is_registered()),
        agent = flag_token(asset.has_agent()),
    )
    .expect("Writing to String buffer is infallible");
    block
}

fn data_block(data: &DataObject) -> String {
    let id = data.id();
    let mut block = String::new();
    write!(
        block,
        "\none sig {id} extends Data {{}}\n\
         fact {{\n\
         \x20   {id}.classification = {classification}\n\
         \x20   {id}.content = {content}\n\
         \x20   {id}.is_sanitized = {sanitized}\n\
         }}\n",
        classification = data.classification(),
        content = data.content(),
        sanitized = flag_token(data.is_sanitized()),
    )
    .expect("Writing to String buffer is infallible");
    block
}

fn flow_block(model: &IntermediateModel, flow: &Flow) -> String {
    let id = flow.id();
    let mut block = String::new();
    write!(
        block,
        "\none sig {id} extends Flow {{}}\n\
         fact {{\n\
         \x20   {id}.from = {from}\n\
         \x20   {id}.to = {to}\n\
         \x20   {id}.data = {data}\n\
         \x20   {id}.via = none // Default to none for now, unless parsed\n\
         \x20   {id}.is_encrypted = {encrypted}\n\
         }}\n",
        from = model.asset(flow.from()).id(),
        to = model.asset(flow.to()).id(),
        data = model.data(flow.data()).id(),
        encrypted = flag_token(flow.is_encrypted()),
    )
    .expect("Writing to String buffer is infallible");
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    use bastion_core::{defaults::ModelDefaults, identifier::SanitizedId};

    const TEMPLATE: &str = "module threats\nopen N2SF_ModelX_Catalog\n\n// ASSETS_HERE\n// DATA_HERE\n// FLOWS_HERE\n\nrun {} for 5\n";

    fn sample_model() -> IntermediateModel {
        let defaults = ModelDefaults::default();
        let mut model = IntermediateModel::new();
        let web = model.add_asset(Asset::new(
            SanitizedId::from_external("web"),
            "Web",
            &defaults,
        ));
        let db = model.add_asset(
            Asset::new(SanitizedId::from_external("db"), "Db", &defaults)
                .with_level("Classified")
                .with_agent(false),
        );
        let flow_id = SanitizedId::from_external("q");
        let data = model.add_data(
            DataObject::new(SanitizedId::derived("Data_", &flow_id), "Query_Data", &defaults)
                .with_classification("Sensitive"),
        );
        model
            .add_flow(Flow::new(flow_id, web, db, data, true))
            .unwrap();
        model
    }

    #[test]
    fn test_asset_block_layout() {
        let model = sample_model();
        assert_eq!(
            asset_block(&model.assets()[1]),
            "\none sig Obj_db extends Asset {}\nfact {\n    Obj_db.level = Classified\n    Obj_db.zone = Internal\n    Obj_db.status = Secure\n    Obj_db.is_registered = True\n    Obj_db.has_agent = False\n}\n"
        );
    }

    #[test]
    fn test_data_block_layout() {
        let model = sample_model();
        assert_eq!(
            data_block(&model.data_objects()[0]),
            "\none sig Data_Obj_q extends Data {}\nfact {\n    Data_Obj_q.classification = Sensitive\n    Data_Obj_q.content = Clean\n    Data_Obj_q.is_sanitized = True\n}\n"
        );
    }

    #[test]
    fn test_flow_block_layout() {
        let model = sample_model();
        assert_eq!(
            flow_block(&model, &model.flows()[0]),
            "\none sig Obj_q extends Flow {}\nfact {\n    Obj_q.from = Obj_web\n    Obj_q.to = Obj_db\n    Obj_q.data = Data_Obj_q\n    Obj_q.via = none // Default to none for now, unless parsed\n    Obj_q.is_encrypted = True\n}\n"
        );
    }

    #[test]
    fn test_render_fills_anchors_and_swaps_catalog() {
        let document = Renderer::default().render(TEMPLATE, &sample_model());

        assert!(document.starts_with("module threats\nopen N2SF_Model2_Catalog\n"));
        assert!(!document.contains("// ASSETS_HERE"));
        assert!(!document.contains("// DATA_HERE"));
        assert!(!document.contains("// FLOWS_HERE"));
        assert!(document.ends_with("\nrun {} for 5\n"));

        let web = document.find("one sig Obj_web").unwrap();
        let db = document.find("one sig Obj_db").unwrap();
        let data = document.find("one sig Data_Obj_q").unwrap();
        let flow = document.find("one sig Obj_q").unwrap();
        assert!(web < db && db < data && data < flow);
    }

    #[test]
    fn test_render_is_idempotent() {
        let renderer = Renderer::default();
        let model = sample_model();
        assert_eq!(renderer.render(TEMPLATE, &model), renderer.render(TEMPLATE, &model));
    }

    #[test]
    fn test_empty_model_clears_anchors() {
        let document = Renderer::default().render(TEMPLATE, &IntermediateModel::new());
        assert_eq!(
            document,
            "module threats\nopen N2SF_Model2_Catalog\n\n\n\n\n\nrun {} for 5\n"
        );
    }

    #[test]
    fn test_missing_anchor_passes_template_through() {
        let template = "open N2SF_ModelX_Catalog\n// ASSETS_HERE\n";
        let document = Renderer::default().render(template, &sample_model());

        assert!(document.contains("one sig Obj_web"));
        assert!(!document.contains("one sig Obj_q"));
    }

    #[test]
    fn test_custom_catalog() {
        let renderer = Renderer::new(TemplateConfig::default().with_catalog("open Custom"));
        let document = renderer.render(TEMPLATE, &IntermediateModel::new());
        assert!(document.contains("open Custom\n"));
    }

    #[test]
    fn test_render_file_missing_template() {
        let result = Renderer::default().render_file("/nonexistent/template.als", &sample_model());
        assert!(matches!(result, Err(BastionError::Io(_))));
    }
}
