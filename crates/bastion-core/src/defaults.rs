//! Attribute defaults applied during model extraction.
//!
//! Every attribute that a diagram may leave untagged has an entry in
//! [`ModelDefaults`]. The structure implements [`serde::Deserialize`] with
//! per-field defaults, so a configuration file only needs to name the
//! values it overrides.
//!
//! # Example
//!
//! ```
//! # use bastion_core::defaults::ModelDefaults;
//! let defaults = ModelDefaults::default();
//! assert_eq!(defaults.level(), "Open");
//! assert_eq!(defaults.zone(), "Internal");
//! assert!(defaults.is_registered());
//! ```

use serde::Deserialize;

/// Default attribute values for assets, data objects and flows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelDefaults {
    /// Category an asset extends when no `[Type: ...]` tag is present.
    asset_type: String,

    /// Asset classification level.
    level: String,

    /// Network zone of an asset.
    zone: String,

    /// Compromise status of an asset.
    status: String,

    is_registered: bool,

    has_agent: bool,

    /// Classification of data carried by a flow.
    classification: String,

    /// Content marker of data carried by a flow.
    content: String,

    is_sanitized: bool,

    /// Label used for flows without label text.
    unlabeled_flow: String,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            asset_type: "Asset".to_string(),
            level: "Open".to_string(),
            zone: "Internal".to_string(),
            status: "Secure".to_string(),
            is_registered: true,
            has_agent: true,
            classification: "Open".to_string(),
            content: "Clean".to_string(),
            is_sanitized: true,
            unlabeled_flow: "UnknownData".to_string(),
        }
    }
}

impl ModelDefaults {
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

    pub fn classification(&self) -> &str {
        &self.classification
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_sanitized(&self) -> bool {
        self.is_sanitized
    }

    pub fn unlabeled_flow(&self) -> &str {
        &self.unlabeled_flow
    }

    /// Returns a copy with a different default asset type.
    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = asset_type.into();
        self
    }

    /// Returns a copy with a different default asset zone.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Returns a copy with a different default asset level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Returns a copy with a different default data classification.
    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = classification.into();
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

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_sanitized(mut self, is_sanitized: bool) -> Self {
        self.is_sanitized = is_sanitized;
        self
    }

    /// Returns a copy that names unlabeled flows differently.
    pub fn with_unlabeled_flow(mut self, unlabeled_flow: impl Into<String>) -> Self {
        self.unlabeled_flow = unlabeled_flow.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let defaults = ModelDefaults::default();

        assert_eq!(defaults.asset_type(), "Asset");
        assert_eq!(defaults.level(), "Open");
        assert_eq!(defaults.zone(), "Internal");
        assert_eq!(defaults.status(), "Secure");
        assert!(defaults.is_registered());
        assert!(defaults.has_agent());
        assert_eq!(defaults.classification(), "Open");
        assert_eq!(defaults.content(), "Clean");
        assert!(defaults.is_sanitized());
        assert_eq!(defaults.unlabeled_flow(), "UnknownData");
    }

    #[test]
    fn test_with_overrides() {
        let defaults = ModelDefaults::default()
            .with_zone("DMZ")
            .with_level("Sensitive")
            .with_classification("Classified");

        assert_eq!(defaults.zone(), "DMZ");
        assert_eq!(defaults.level(), "Sensitive");
        assert_eq!(defaults.classification(), "Classified");
        assert_eq!(defaults.status(), "Secure");
    }

    #[test]
    fn test_every_default_can_be_overridden() {
        let defaults = ModelDefaults::default()
            .with_asset_type("Server")
            .with_status("Compromised")
            .with_registered(false)
            .with_agent(false)
            .with_content("Malicious")
            .with_sanitized(false)
            .with_unlabeled_flow("Unnamed");

        assert_eq!(defaults.asset_type(), "Server");
        assert_eq!(defaults.status(), "Compromised");
        assert!(!defaults.is_registered());
        assert!(!defaults.has_agent());
        assert_eq!(defaults.content(), "Malicious");
        assert!(!defaults.is_sanitized());
        assert_eq!(defaults.unlabeled_flow(), "Unnamed");
        assert_eq!(defaults.level(), "Open");
    }
}
