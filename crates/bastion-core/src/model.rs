//! The Intermediate Model produced by diagram extraction.
//!
//! The model holds three append-only tables: assets, data objects and
//! flows. Assets and data objects are addressed through typed handles
//! ([`AssetHandle`], [`DataHandle`]) handed out when they are added, so a
//! [`Flow`] refers to its endpoints and payload by index instead of by
//! re-parsed identifier strings.
//!
//! Tables preserve insertion order, which is the order the diagram
//! presented its cells in. Rendering relies on that order for
//! reproducible output.
//!
//! # Example
//!
//! ```
//! # use bastion_core::{defaults::ModelDefaults, identifier::SanitizedId};
//! # use bastion_core::model::{Asset, DataObject, Flow, IntermediateModel};
//! let defaults = ModelDefaults::default();
//! let mut model = IntermediateModel::new();
//!
//! let web = model.add_asset(Asset::new(SanitizedId::from_external("a-1"), "Web", &defaults));
//! let db = model.add_asset(Asset::new(SanitizedId::from_external("a-2"), "Db", &defaults));
//!
//! let flow_id = SanitizedId::from_external("f-1");
//! let data = model.add_data(DataObject::new(
//!     SanitizedId::derived("Data_", &flow_id),
//!     "Query_Data",
//!     &defaults,
//! ));
//! model.add_flow(Flow::new(flow_id, web, db, data, false)).unwrap();
//!
//! assert_eq!(model.flows().len(), 1);
//! assert_eq!(model.asset(model.flows()[0].from()).display_name(), "Web");
//! ```

use log::trace;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use thiserror::Error;

use crate::{defaults::ModelDefaults, identifier::SanitizedId};

/// Errors raised when assembling a model by hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("flow `{flow}` references asset #{index} which is not in the model")]
    UnknownAsset { flow: SanitizedId, index: usize },

    #[error("flow `{flow}` references data object #{index} which is not in the model")]
    UnknownData { flow: SanitizedId, index: usize },
}

/// Index of an [`Asset`] in an [`IntermediateModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(usize);

impl AssetHandle {
    /// Position of the asset in insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a [`DataObject`] in an [`IntermediateModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataHandle(usize);

impl DataHandle {
    /// Position of the data object in insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A system component drawn as a node in the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    id: SanitizedId,
    display_name: String,
    asset_type: String,
    level: String,
    zone: String,
    status: String,
    is_registered: bool,
    has_agent: bool,
}

impl Asset {
    /// Creates an asset with every classification attribute defaulted.
    pub fn new(id: SanitizedId, display_name: impl Into<String>, defaults: &ModelDefaults) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            asset_type: defaults.asset_type().to_string(),
            level: defaults.level().to_string(),
            zone: defaults.zone().to_string(),
            status: defaults.status().to_string(),
            is_registered: defaults.is_registered(),
            has_agent: defaults.has_agent(),
        }
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = asset_type.into();
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_registered(mut self, is_registered: bool) -> Self {
        self.is_registered = is_registered;
        self
    }

    pub fn with_agent(mut self, has_agent: bool) -> Self {
        self.has_agent = has_agent;
        self
    }

    pub fn id(&self) -> &SanitizedId {
        &self.id
    }

    /// Label text with annotation tags stripped.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Category the generated signature extends.
    pub fn asset_type(&self) -> &str {
        &self.asset_type
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_registered(&self) -> bool {
        self.is_registered
    }

    pub fn has_agent(&self) -> bool {
        self.has_agent
    }
}

/// The payload carried by exactly one [`Flow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataObject {
    id: SanitizedId,
    display_name: String,
    classification: String,
    content: String,
    is_sanitized: bool,
}

impl DataObject {
    /// Creates a data object with default classification attributes.
    pub fn new(id: SanitizedId, display_name: impl Into<String>, defaults: &ModelDefaults) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            classification: defaults.classification().to_string(),
            content: defaults.content().to_string(),
            is_sanitized: defaults.is_sanitized(),
        }
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = classification.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_sanitized(mut self, is_sanitized: bool) -> Self {
        self.is_sanitized = is_sanitized;
        self
    }

    pub fn id(&self) -> &SanitizedId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn classification(&self) -> &str {
        &self.classification
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_sanitized(&self) -> bool {
        self.is_sanitized
    }
}

/// A directed data flow between two assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    id: SanitizedId,
    from: AssetHandle,
    to: AssetHandle,
    data: DataHandle,
    is_encrypted: bool,
}

impl Flow {
    pub fn new(
        id: SanitizedId,
        from: AssetHandle,
        to: AssetHandle,
        data: DataHandle,
        is_encrypted: bool,
    ) -> Self {
        Self {
            id,
            from,
            to,
            data,
            is_encrypted,
        }
    }

    pub fn id(&self) -> &SanitizedId {
        &self.id
    }

    pub fn from(&self) -> AssetHandle {
        self.from
    }

    pub fn to(&self) -> AssetHandle {
        self.to
    }

    pub fn data(&self) -> DataHandle {
        self.data
    }

    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }
}

/// Ordered assets, data objects and flows extracted from one diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntermediateModel {
    assets: Vec<Asset>,
    data: Vec<DataObject>,
    flows: Vec<Flow>,
}

impl IntermediateModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an asset and returns its handle.
    pub fn add_asset(&mut self, asset: Asset) -> AssetHandle {
        trace!(id = asset.id().as_str(); "Adding asset");
        self.assets.push(asset);
        AssetHandle(self.assets.len() - 1)
    }

    /// Appends a data object and returns its handle.
    pub fn add_data(&mut self, data: DataObject) -> DataHandle {
        trace!(id = data.id().as_str(); "Adding data object");
        self.data.push(data);
        DataHandle(self.data.len() - 1)
    }

    /// Appends a flow after checking that its handles resolve.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if an endpoint or the payload handle does not
    /// address an entry of this model.
    pub fn add_flow(&mut self, flow: Flow) -> Result<(), ModelError> {
        for endpoint in [flow.from, flow.to] {
            if endpoint.0 >= self.assets.len() {
                return Err(ModelError::UnknownAsset {
                    flow: flow.id,
                    index: endpoint.0,
                });
            }
        }
        if flow.data.0 >= self.data.len() {
            return Err(ModelError::UnknownData {
                flow: flow.id,
                index: flow.data.0,
            });
        }

        trace!(id = flow.id().as_str(); "Adding flow");
        self.flows.push(flow);
        Ok(())
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn data_objects(&self) -> &[DataObject] {
        &self.data
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Resolves an asset handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by a different, larger model.
    pub fn asset(&self, handle: AssetHandle) -> &Asset {
        &self.assets[handle.0]
    }

    /// Resolves a data handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by a different, larger model.
    pub fn data(&self, handle: DataHandle) -> &DataObject {
        &self.data[handle.0]
    }

    /// Looks up an asset by its sanitized id.
    pub fn find_asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.id == *id)
    }

    /// Looks up a flow by its sanitized id.
    pub fn find_flow(&self, id: &str) -> Option<&Flow> {
        self.flows.iter().find(|flow| flow.id == *id)
    }

    /// Returns `true` when all three tables are empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.data.is_empty() && self.flows.is_empty()
    }
}

/// Serialized form of a flow with its handles resolved to ids.
#[derive(Serialize)]
struct FlowRecord<'a> {
    id: &'a SanitizedId,
    from: &'a SanitizedId,
    to: &'a SanitizedId,
    data: &'a SanitizedId,
    is_encrypted: bool,
}

impl Serialize for IntermediateModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flows: Vec<FlowRecord<'_>> = self
            .flows
            .iter()
            .map(|flow| FlowRecord {
                id: flow.id(),
                from: self.asset(flow.from()).id(),
                to: self.asset(flow.to()).id(),
                data: self.data(flow.data()).id(),
                is_encrypted: flow.is_encrypted(),
            })
            .collect();

        let mut state = serializer.serialize_struct("IntermediateModel", 3)?;
        state.serialize_field("assets", &self.assets)?;
        state.serialize_field("data", &self.data)?;
        state.serialize_field("flows", &flows)?;
        state.end()
    }
}
