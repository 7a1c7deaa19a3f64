//! Diagram Model Builder.
//!
//! Converts the cells of a [`DiagramDocument`] into an
//! [`IntermediateModel`] in exactly two passes:
//!
//! 1. **Assets** - every store, process and actor cell becomes an
//!    [`Asset`]; its external id is recorded against the asset's handle.
//! 2. **Flows** - every flow cell whose source and target were recorded in
//!    pass 1 becomes a [`Flow`] plus the [`DataObject`] it carries.
//!
//! Resolving endpoints only after all assets are known means cell order in
//! the document does not matter. Problems with individual cells never fail
//! the build: they are returned as [`ModelWarning`]s next to the model.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use log::{debug, info, warn};

use bastion_core::{
    defaults::ModelDefaults,
    flag::parse_flag,
    identifier::SanitizedId,
    model::{Asset, AssetHandle, DataObject, Flow, IntermediateModel},
};

use crate::{
    diagram::{Cell, CellKind, DiagramDocument},
    error::{Diagnostic, ErrorCode, ParseError, Severity},
    tags::{self, Tags},
};

/// Prefix of the data object id derived from its flow's id.
const DATA_PREFIX: &str = "Data_";

/// Suffix appended to an edge label's name to name its data object.
const DATA_NAME_SUFFIX: &str = "_Data";

/// A non-fatal problem found while building the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelWarning {
    cell_id: Option<String>,
    text: Option<String>,
    diagnostic: Diagnostic,
}

impl ModelWarning {
    fn new(cell_id: Option<&str>, text: Option<&str>, diagnostic: Diagnostic) -> Self {
        Self {
            cell_id: cell_id.map(str::to_string),
            text: text.map(str::to_string),
            diagnostic: diagnostic.with_severity(Severity::Warning),
        }
    }

    /// External id of the offending cell, if it has one.
    pub fn cell_id(&self) -> Option<&str> {
        self.cell_id.as_deref()
    }

    /// Label text that the diagnostic's spans point into, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }
}

impl fmt::Display for ModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic)?;
        if let Some(cell_id) = &self.cell_id {
            write!(f, " (cell `{cell_id}`)")?;
        }
        Ok(())
    }
}

/// The result of building a model: the model and everything that was
/// defaulted or dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    model: IntermediateModel,
    warnings: Vec<ModelWarning>,
}

impl Extraction {
    pub fn model(&self) -> &IntermediateModel {
        &self.model
    }

    pub fn warnings(&self) -> &[ModelWarning] {
        &self.warnings
    }

    /// Split into the model and its warnings.
    pub fn into_parts(self) -> (IntermediateModel, Vec<ModelWarning>) {
        (self.model, self.warnings)
    }
}

/// Builds [`IntermediateModel`]s from diagram documents.
///
/// # Example
///
/// ```
/// # use bastion_parser::{ModelBuilder, ParseError};
/// # fn main() -> Result<(), ParseError> {
/// let source = r#"{"detail": {"diagrams": [{"diagramJson": {"cells": [
///     {"type": "tm.Actor", "id": "u-1", "attrs": {"text": {"text": "User [Zone: External]"}}}
/// ]}}]}}"#;
///
/// let extraction = ModelBuilder::default().build_str(source)?;
/// assert_eq!(extraction.model().assets()[0].zone(), "External");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    defaults: ModelDefaults,
}

impl ModelBuilder {
    /// Create a builder that applies the given attribute defaults.
    pub fn new(defaults: ModelDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    /// Parse a JSON document and build its model.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] only when the text is not a well-formed
    /// document. Missing sections produce an empty model.
    pub fn build_str(&self, source: &str) -> Result<Extraction, ParseError> {
        let document = DiagramDocument::from_json(source)?;
        Ok(self.build(&document))
    }

    /// Build the model of a parsed document.
    pub fn build(&self, document: &DiagramDocument) -> Extraction {
        let cells = document.cells();
        info!(cells = cells.len(); "Building intermediate model");
        if document.diagram_count() > 1 {
            debug!(
                diagrams = document.diagram_count();
                "Document holds several diagrams, only the first is analyzed"
            );
        }

        let mut pass = Passes::new(&self.defaults);
        pass.collect_assets(cells);
        pass.collect_flows(cells);

        info!(
            assets = pass.model.assets().len(),
            flows = pass.model.flows().len(),
            warnings = pass.warnings.len();
            "Intermediate model built"
        );

        Extraction {
            model: pass.model,
            warnings: pass.warnings,
        }
    }
}

/// State shared by the two extraction passes.
struct Passes<'d> {
    defaults: &'d ModelDefaults,
    model: IntermediateModel,
    /// External asset id to the handle assigned in pass 1.
    assets: HashMap<String, AssetHandle>,
    /// External ids of every cell accepted so far.
    seen: HashSet<String>,
    warnings: Vec<ModelWarning>,
}

impl<'d> Passes<'d> {
    fn new(defaults: &'d ModelDefaults) -> Self {
        Self {
            defaults,
            model: IntermediateModel::new(),
            assets: HashMap::new(),
            seen: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Pass 1: assets and the external id map.
    fn collect_assets(&mut self, cells: &[Cell]) {
        for cell in cells.iter().filter(|cell| cell.kind().is_asset()) {
            self.warn_mistyped(cell);
            let Some(external_id) = self.accept_id(cell) else {
                continue;
            };

            let text = cell.text().unwrap_or_default();
            let tags = self.scan_tags(external_id, text);

            let mut asset = Asset::new(
                SanitizedId::from_external(external_id),
                tags::display_name(text),
                self.defaults,
            );
            if let Some(asset_type) = tags.get("type") {
                asset = asset.with_asset_type(asset_type);
            }
            if let Some(level) = tags.get("level") {
                asset = asset.with_level(level);
            }
            if let Some(zone) = tags.get("zone") {
                asset = asset.with_zone(zone);
            }
            if let Some(status) = tags.get("status") {
                asset = asset.with_status(status);
            }
            if let Some(is_registered) = self.flag_tag(external_id, text, &tags, "reg") {
                asset = asset.with_registered(is_registered);
            }
            if let Some(has_agent) = self.flag_tag(external_id, text, &tags, "agent") {
                asset = asset.with_agent(has_agent);
            }

            let handle = self.model.add_asset(asset);
            self.assets.insert(external_id.to_string(), handle);
        }
    }

    /// Pass 2: flows and the data objects they carry.
    fn collect_flows(&mut self, cells: &[Cell]) {
        for cell in cells.iter().filter(|cell| cell.kind() == CellKind::Flow) {
            self.warn_mistyped(cell);
            let Some(external_id) = cell.id() else {
                self.warn_missing_id(cell);
                continue;
            };

            let (Some(from), Some(to)) = (
                self.resolve(external_id, "source", cell.source_id()),
                self.resolve(external_id, "target", cell.target_id()),
            ) else {
                continue;
            };

            if self.accept_id(cell).is_none() {
                continue;
            }

            let defaults = self.defaults;
            let text = cell.edge_label().unwrap_or(defaults.unlabeled_flow());
            let tags = self.scan_tags(external_id, text);

            let flow_id = SanitizedId::from_external(external_id);
            let mut data = DataObject::new(
                SanitizedId::derived(DATA_PREFIX, &flow_id),
                format!("{}{DATA_NAME_SUFFIX}", tags::display_name(text)),
                defaults,
            );
            if let Some(classification) = tags.get("class") {
                data = data.with_classification(classification);
            }
            if let Some(content) = tags.get("content") {
                data = data.with_content(content);
            }
            if let Some(is_sanitized) = self.flag_tag(external_id, text, &tags, "sanitized") {
                data = data.with_sanitized(is_sanitized);
            }

            let is_encrypted = self
                .flag_tag(external_id, text, &tags, "enc")
                .unwrap_or_else(|| cell.is_encrypted().unwrap_or(false));

            let data = self.model.add_data(data);
            if let Err(err) = self
                .model
                .add_flow(Flow::new(flow_id, from, to, data, is_encrypted))
            {
                warn!(cell = external_id; "Dropping flow: {err}");
            }
        }
    }

    /// Record the cell's id, rejecting missing and duplicate ids.
    fn accept_id<'c>(&mut self, cell: &'c Cell) -> Option<&'c str> {
        let Some(external_id) = cell.id() else {
            self.warn_missing_id(cell);
            return None;
        };

        if self.seen.contains(external_id) {
            debug!(cell = external_id; "Skipping cell with duplicate id");
            self.warnings.push(ModelWarning::new(
                Some(external_id),
                None,
                Diagnostic::warning(format!(
                    "`{}` cell `{external_id}` reuses an id that is already taken",
                    cell.cell_type()
                ))
                .with_code(ErrorCode::E203)
                .with_help("give every diagram element a unique id; the later cell was skipped"),
            ));
            return None;
        }

        self.seen.insert(external_id.to_string());
        Some(external_id)
    }

    /// Report fields that were ignored for holding the wrong type.
    fn warn_mistyped(&mut self, cell: &Cell) {
        for field in cell.mistyped_fields() {
            debug!(cell_type = cell.cell_type(), field = field.field(); "Ignoring mistyped field");
            self.warnings.push(ModelWarning::new(
                cell.id(),
                None,
                Diagnostic::warning(format!("`{}` cell field {field}", cell.cell_type()))
                    .with_code(ErrorCode::E204)
                    .with_help("the field was treated as absent"),
            ));
        }
    }

    fn warn_missing_id(&mut self, cell: &Cell) {
        debug!(cell_type = cell.cell_type(); "Skipping cell without id");
        self.warnings.push(ModelWarning::new(
            None,
            None,
            Diagnostic::warning(format!("`{}` cell has no id", cell.cell_type()))
                .with_code(ErrorCode::E202)
                .with_help("the cell was skipped"),
        ));
    }

    /// Resolve one flow endpoint through the pass 1 map.
    fn resolve(&mut self, flow_id: &str, end: &str, endpoint: Option<&str>) -> Option<AssetHandle> {
        if let Some(handle) = endpoint.and_then(|id| self.assets.get(id)) {
            return Some(*handle);
        }

        let message = match endpoint {
            Some(id) => format!("flow `{flow_id}` {end} `{id}` is not an asset"),
            None => format!("flow `{flow_id}` has no {end}"),
        };
        debug!(cell = flow_id, end = end; "Dropping flow with dangling endpoint");
        self.warnings.push(ModelWarning::new(
            Some(flow_id),
            None,
            Diagnostic::warning(message)
                .with_code(ErrorCode::E200)
                .with_help("connect both ends of the flow to a store, process or actor; the flow was dropped"),
        ));
        None
    }

    /// Scan a label, keeping malformed tags as warnings.
    fn scan_tags(&mut self, cell_id: &str, text: &str) -> Tags {
        let (tags, diagnostics) = tags::scan(text);
        self.warnings.extend(
            diagnostics
                .into_iter()
                .map(|diagnostic| ModelWarning::new(Some(cell_id), Some(text), diagnostic)),
        );
        tags
    }

    /// Read a boolean tag; invalid values fall back to the default.
    fn flag_tag(&mut self, cell_id: &str, text: &str, tags: &Tags, key: &str) -> Option<bool> {
        let entry = tags.entry(key)?;
        match parse_flag(entry.value()) {
            Ok(value) => Some(value),
            Err(err) => {
                self.warnings.push(ModelWarning::new(
                    Some(cell_id),
                    Some(text),
                    Diagnostic::warning(format!("invalid `{key}` tag"))
                        .with_code(ErrorCode::E201)
                        .with_label(entry.span(), err.to_string())
                        .with_help("use `true` or `false`; the default value was used"),
                ));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(cells: &str) -> String {
        format!(r#"{{"detail": {{"diagrams": [{{"diagramJson": {{"cells": [{cells}]}}}}]}}}}"#)
    }

    fn node(kind: &str, id: &str, text: &str) -> String {
        format!(r#"{{"type": "tm.{kind}", "id": "{id}", "attrs": {{"text": {{"text": "{text}"}}}}}}"#)
    }

    fn edge(id: &str, source: &str, target: &str, label: Option<&str>) -> String {
        let labels = match label {
            Some(text) => format!(r#"[{{"attrs": {{"text": {{"text": "{text}"}}}}}}]"#),
            None => "[]".to_string(),
        };
        format!(
            r#"{{"type": "tm.Flow", "id": "{id}", "source": {{"id": "{source}"}}, "target": {{"id": "{target}"}}, "labels": {labels}}}"#
        )
    }

    fn build(cells: &[String]) -> Extraction {
        ModelBuilder::default()
            .build_str(&document(&cells.join(",")))
            .expect("valid document")
    }

    #[test]
    fn test_empty_cells() {
        let extraction = build(&[]);
        assert!(extraction.model().is_empty());
        assert!(extraction.warnings().is_empty());
    }

    #[test]
    fn test_missing_sections_give_empty_model() {
        let extraction = ModelBuilder::default().build_str("{}").unwrap();
        assert!(extraction.model().is_empty());
    }

    #[test]
    fn test_asset_kinds() {
        let extraction = build(&[
            node("Store", "s", "Db"),
            node("Process", "p", "Api"),
            node("Actor", "a", "User"),
            node("Boundary", "b", "Trust"),
        ]);

        let ids: Vec<_> = extraction
            .model()
            .assets()
            .iter()
            .map(|asset| asset.id().as_str())
            .collect();
        assert_eq!(ids, vec!["Obj_s", "Obj_p", "Obj_a"]);
    }

    #[test]
    fn test_asset_tags_and_defaults() {
        let extraction = build(&[node(
            "Store",
            "db-1",
            "Customer DB [Level: Classified][Type: SecurityGW][Reg: false][Agent: FALSE]",
        )]);
        let asset = &extraction.model().assets()[0];

        assert_eq!(asset.id(), "Obj_db_1");
        assert_eq!(asset.display_name(), "Customer_DB");
        assert_eq!(asset.asset_type(), "SecurityGW");
        assert_eq!(asset.level(), "Classified");
        assert_eq!(asset.zone(), "Internal");
        assert_eq!(asset.status(), "Secure");
        assert!(!asset.is_registered());
        assert!(!asset.has_agent());
    }

    #[test]
    fn test_flow_before_endpoints_is_resolved() {
        let extraction = build(&[
            edge("f-1", "a-1", "a-2", Some("Query")),
            node("Process", "a-1", "Web"),
            node("Store", "a-2", "Db"),
        ]);
        let model = extraction.model();

        assert_eq!(model.flows().len(), 1);
        let flow = &model.flows()[0];
        assert_eq!(model.asset(flow.from()).id(), "Obj_a_1");
        assert_eq!(model.asset(flow.to()).id(), "Obj_a_2");
    }

    #[test]
    fn test_dangling_flow_is_dropped_with_warning() {
        let extraction = build(&[
            node("Process", "a-1", "Web"),
            edge("f-1", "a-1", "ghost", Some("Query")),
        ]);

        assert!(extraction.model().flows().is_empty());
        assert!(extraction.model().data_objects().is_empty());
        assert_eq!(extraction.warnings().len(), 1);

        let warning = &extraction.warnings()[0];
        assert_eq!(warning.cell_id(), Some("f-1"));
        assert_eq!(warning.diagnostic().code(), Some(ErrorCode::E200));
        assert!(warning.diagnostic().severity().is_warning());
    }

    #[test]
    fn test_flow_to_boundary_is_dropped() {
        let extraction = build(&[
            node("Process", "a", "Web"),
            node("Boundary", "b", "Trust"),
            edge("f", "a", "b", None),
        ]);
        assert!(extraction.model().flows().is_empty());
    }

    #[test]
    fn test_data_object_per_flow() {
        let extraction = build(&[
            node("Process", "a", "Web"),
            node("Store", "b", "Db"),
            edge("f-1", "a", "b", Some("SQL Query [Class: Sensitive][Content: Malware][Sanitized: false]")),
            edge("f-2", "a", "b", None),
        ]);
        let data = extraction.model().data_objects();

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].id(), "Data_Obj_f_1");
        assert_eq!(data[0].display_name(), "SQL_Query_Data");
        assert_eq!(data[0].classification(), "Sensitive");
        assert_eq!(data[0].content(), "Malware");
        assert!(!data[0].is_sanitized());

        assert_eq!(data[1].id(), "Data_Obj_f_2");
        assert_eq!(data[1].display_name(), "UnknownData_Data");
        assert_eq!(data[1].classification(), "Open");
        assert_eq!(data[1].content(), "Clean");
        assert!(data[1].is_sanitized());
    }

    #[test]
    fn test_native_encryption_and_tag_override() {
        let source = document(&[
            node("Process", "a", "Web"),
            node("Store", "b", "Db"),
            r#"{"type": "tm.Flow", "id": "f-1", "source": {"id": "a"}, "target": {"id": "b"}, "isEncrypted": true}"#.to_string(),
            r#"{"type": "tm.Flow", "id": "f-2", "source": {"id": "a"}, "target": {"id": "b"}, "isEncrypted": true,
                "labels": [{"attrs": {"text": {"text": "Raw [Enc: false]"}}}]}"#.to_string(),
        ]
        .join(","));
        let extraction = ModelBuilder::default().build_str(&source).unwrap();
        let flows = extraction.model().flows();

        assert!(flows[0].is_encrypted());
        assert!(!flows[1].is_encrypted());
    }

    #[test]
    fn test_invalid_flag_falls_back_with_warning() {
        let extraction = build(&[
            node("Process", "a", "Web"),
            node("Store", "b", "Db"),
            edge("f", "a", "b", Some("Q [Enc: maybe]")),
        ]);

        assert!(!extraction.model().flows()[0].is_encrypted());
        let warning = &extraction.warnings()[0];
        assert_eq!(warning.diagnostic().code(), Some(ErrorCode::E201));
        assert_eq!(warning.text(), Some("Q [Enc: maybe]"));
    }

    #[test]
    fn test_malformed_tag_is_warning() {
        let extraction = build(&[node("Store", "s", "Db [Level: Top Secret][Zone: DMZ]")]);
        let asset = &extraction.model().assets()[0];

        assert_eq!(asset.level(), "Open");
        assert_eq!(asset.zone(), "DMZ");
        assert_eq!(extraction.warnings().len(), 1);
        assert_eq!(
            extraction.warnings()[0].diagnostic().code(),
            Some(ErrorCode::E002)
        );
        assert!(extraction.warnings()[0].diagnostic().severity().is_warning());
    }

    #[test]
    fn test_duplicate_asset_id_skipped() {
        let extraction = build(&[node("Store", "s", "First"), node("Actor", "s", "Second")]);

        assert_eq!(extraction.model().assets().len(), 1);
        assert_eq!(extraction.model().assets()[0].display_name(), "First");
        assert_eq!(
            extraction.warnings()[0].diagnostic().code(),
            Some(ErrorCode::E203)
        );
    }

    #[test]
    fn test_cell_without_id_skipped() {
        let extraction = build(&[r#"{"type": "tm.Store"}"#.to_string()]);

        assert!(extraction.model().is_empty());
        assert_eq!(
            extraction.warnings()[0].diagnostic().code(),
            Some(ErrorCode::E202)
        );
        assert_eq!(extraction.warnings()[0].cell_id(), None);
    }

    #[test]
    fn test_mistyped_encryption_flag_keeps_flow() {
        let flow = r#"{"type": "tm.Flow", "id": "f", "source": {"id": "a"}, "target": {"id": "b"}, "isEncrypted": "true"}"#;
        let extraction = build(&[
            node("Process", "a", "Web"),
            node("Store", "b", "Db"),
            flow.to_string(),
        ]);

        let flows = extraction.model().flows();
        assert_eq!(flows.len(), 1);
        assert!(!flows[0].is_encrypted());

        let warning = &extraction.warnings()[0];
        assert_eq!(warning.diagnostic().code(), Some(ErrorCode::E204));
        assert_eq!(warning.cell_id(), Some("f"));
        assert!(warning.to_string().contains("`isEncrypted`"));
    }

    #[test]
    fn test_ignored_cell_fields_never_fail() {
        let text = r#"{"type": "tm.Text", "id": "t", "labels": "note", "attrs": "plain"}"#;
        let extraction = build(&[node("Store", "s", "Db"), text.to_string()]);

        assert_eq!(extraction.model().assets().len(), 1);
        assert!(extraction.warnings().is_empty());
    }

    #[test]
    fn test_non_array_diagrams_give_empty_model() {
        for source in [
            r#"{"detail": {"diagrams": {}}}"#,
            r#"{"detail": {"diagrams": [{"diagramJson": {"cells": {"0": {}}}}]}}"#,
            r#"{"detail": "none"}"#,
        ] {
            let extraction = ModelBuilder::default().build_str(source).unwrap();
            assert!(extraction.model().is_empty());
            assert!(extraction.warnings().is_empty());
        }
    }

    #[test]
    fn test_mistyped_labels_and_endpoints() {
        let flow = r#"{"type": "tm.Flow", "id": "f", "source": {"id": "a"}, "target": {"id": "b"}, "labels": "note"}"#;
        let dangling = r#"{"type": "tm.Flow", "id": "g", "source": {"id": "a"}, "target": ["b"]}"#;
        let extraction = build(&[
            r#"{"type": "tm.Actor", "id": "a", "attrs": {"text": 3}}"#.to_string(),
            node("Store", "b", "Db"),
            flow.to_string(),
            dangling.to_string(),
        ]);

        let model = extraction.model();
        assert_eq!(model.assets()[0].display_name(), "");
        assert_eq!(model.flows().len(), 1);
        assert_eq!(
            model.data(model.flows()[0].data()).display_name(),
            "UnknownData_Data"
        );

        let codes: Vec<_> = extraction
            .warnings()
            .iter()
            .filter_map(|warning| warning.diagnostic().code())
            .collect();
        assert_eq!(
            codes,
            vec![ErrorCode::E204, ErrorCode::E204, ErrorCode::E204, ErrorCode::E200]
        );
    }

    #[test]
    fn test_injected_defaults() {
        let defaults = ModelDefaults::default().with_zone("External");
        let source = document(&node("Actor", "u", "User"));
        let extraction = ModelBuilder::new(defaults).build_str(&source).unwrap();

        assert_eq!(extraction.model().assets()[0].zone(), "External");
    }

    #[test]
    fn test_build_is_deterministic() {
        let cells = [
            node("Process", "a", "Web [Level: Open]"),
            node("Store", "b", "Db"),
            edge("f", "a", "b", Some("Q")),
        ];
        assert_eq!(build(&cells), build(&cells));
    }

    #[test]
    fn test_warning_display() {
        let extraction = build(&[edge("f-9", "x", "y", None)]);
        assert_eq!(
            extraction.warnings()[0].to_string(),
            "warning[E200]: flow `f-9` source `x` is not an asset (cell `f-9`)"
        );
    }
}
