//! Diagram document types.
//!
//! A threat-model document nests its cells at
//! `detail.diagrams[0].diagramJson.cells`. Only invalid JSON is an error.
//! A missing or mistyped section reads as an empty cell list, and only the
//! fields of store, process, actor and flow cells are ever looked at. A
//! field with the wrong type is recorded on its cell as a
//! [`MistypedField`] and otherwise treated as absent.

use std::fmt;

use log::debug;
use serde_json::Value;

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
};

/// A complete threat-model document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramDocument {
    diagram_count: usize,
    cells: Vec<Cell>,
}

impl DiagramDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] with an `E100` diagnostic pointing at the
    /// offending position when the text is not valid JSON.
    pub fn from_json(source: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(source).map_err(|err| {
            let offset = byte_offset(source, err.line(), err.column());
            let span = Span::new(offset..(offset + 1).min(source.len()).max(offset));
            Diagnostic::error("malformed diagram document")
                .with_code(ErrorCode::E100)
                .with_label(span, err.to_string())
                .with_help("expected a threat-model document with `detail.diagrams[0].diagramJson.cells`")
        })?;
        Ok(Self::from_value(&value))
    }

    /// Read a document from an already parsed JSON value.
    pub fn from_value(value: &Value) -> Self {
        let diagrams = array_at(value, "/detail/diagrams");
        let cells = diagrams
            .first()
            .map(|diagram| array_at(diagram, "/diagramJson/cells"))
            .unwrap_or_default();

        Self {
            diagram_count: diagrams.len(),
            cells: cells.iter().map(Cell::from_value).collect(),
        }
    }

    /// Cells of the first diagram.
    ///
    /// Documents with several diagrams only have their first one analyzed.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of diagrams in the document.
    pub fn diagram_count(&self) -> usize {
        self.diagram_count
    }
}

/// The array at `pointer`, or nothing when it is missing or not an array.
fn array_at<'v>(value: &'v Value, pointer: &str) -> &'v [Value] {
    match value.pointer(pointer) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => &[],
        Some(other) => {
            debug!(section = pointer, found = json_kind(other); "Ignoring section that is not an array");
            &[]
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// What a cell stands for, derived from its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Store,
    Process,
    Actor,
    Flow,
    /// Boundaries, free text and anything else the analysis ignores.
    Other,
}

impl CellKind {
    /// Returns `true` for the kinds that become assets.
    pub fn is_asset(self) -> bool {
        matches!(self, CellKind::Store | CellKind::Process | CellKind::Actor)
    }
}

impl From<&str> for CellKind {
    fn from(value: &str) -> Self {
        match value {
            "tm.Store" => CellKind::Store,
            "tm.Process" => CellKind::Process,
            "tm.Actor" => CellKind::Actor,
            "tm.Flow" => CellKind::Flow,
            _ => CellKind::Other,
        }
    }
}

/// A cell field that held the wrong JSON type and was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MistypedField {
    field: String,
    expected: &'static str,
    found: &'static str,
}

impl MistypedField {
    /// Dotted path of the field, e.g. `labels` or `attrs.text.text`.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn expected(&self) -> &'static str {
        self.expected
    }

    pub fn found(&self) -> &'static str {
        self.found
    }
}

impl fmt::Display for MistypedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` should be {} but is {}",
            self.field, self.expected, self.found
        )
    }
}

/// One node or edge of the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    kind: CellKind,
    cell_type: String,
    id: Option<String>,
    text: Option<String>,
    source_id: Option<String>,
    target_id: Option<String>,
    edge_label: Option<String>,
    is_encrypted: Option<bool>,
    mistyped: Vec<MistypedField>,
}

impl Cell {
    /// Read a cell. Fields are only inspected for the kinds the analysis
    /// uses.
    fn from_value(value: &Value) -> Self {
        let cell_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let kind = CellKind::from(cell_type.as_str());

        let mut cell = Self {
            kind,
            cell_type,
            id: None,
            text: None,
            source_id: None,
            target_id: None,
            edge_label: None,
            is_encrypted: None,
            mistyped: Vec::new(),
        };
        if kind == CellKind::Other {
            return cell;
        }

        let mut fields = FieldReader::new(value);
        cell.id = fields.string("id");
        if kind == CellKind::Flow {
            cell.source_id = fields.string("source.id");
            cell.target_id = fields.string("target.id");
            cell.edge_label = fields.string("labels.0.attrs.text.text");
            cell.is_encrypted = fields.boolean("isEncrypted");
        } else {
            cell.text = fields.string("attrs.text.text");
        }
        cell.mistyped = fields.mistyped;
        cell
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// The raw `type` field.
    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Node label at `attrs.text.text`.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    /// Edge label at `labels[0].attrs.text.text`.
    pub fn edge_label(&self) -> Option<&str> {
        self.edge_label.as_deref()
    }

    /// The diagram-native encryption flag.
    pub fn is_encrypted(&self) -> Option<bool> {
        self.is_encrypted
    }

    /// Fields that held the wrong type and were read as absent.
    pub fn mistyped_fields(&self) -> &[MistypedField] {
        &self.mistyped
    }
}

/// Walks dotted field paths through a cell, recording type mismatches.
///
/// Numeric path segments index arrays. `null` anywhere along a path reads
/// as absent.
struct FieldReader<'v> {
    cell: &'v Value,
    mistyped: Vec<MistypedField>,
}

impl<'v> FieldReader<'v> {
    fn new(cell: &'v Value) -> Self {
        Self {
            cell,
            mistyped: Vec::new(),
        }
    }

    fn string(&mut self, path: &str) -> Option<String> {
        match self.lookup(path)? {
            Value::String(text) => Some(text.clone()),
            other => {
                self.mistype(path, "a string", other);
                None
            }
        }
    }

    fn boolean(&mut self, path: &str) -> Option<bool> {
        match self.lookup(path)? {
            Value::Bool(flag) => Some(*flag),
            other => {
                self.mistype(path, "a boolean", other);
                None
            }
        }
    }

    fn lookup(&mut self, path: &str) -> Option<&'v Value> {
        let mut current = self.cell;
        for (depth, segment) in path.split('.').enumerate() {
            let next = match (current, segment.parse::<usize>()) {
                (Value::Null, _) => None,
                (Value::Array(items), Ok(index)) => items.get(index),
                (Value::Object(map), Err(_)) => map.get(segment),
                (other, index) => {
                    let expected = if index.is_ok() { "an array" } else { "an object" };
                    let parent = path.split('.').take(depth).collect::<Vec<_>>().join(".");
                    self.mistype(&parent, expected, other);
                    None
                }
            };
            current = next?;
        }

        match current {
            Value::Null => None,
            value => Some(value),
        }
    }

    fn mistype(&mut self, field: &str, expected: &'static str, found: &Value) {
        self.mistyped.push(MistypedField {
            field: field.to_string(),
            expected,
            found: json_kind(found),
        });
    }
}

/// Convert a 1-based line/column pair reported by `serde_json` into a byte
/// offset.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}
