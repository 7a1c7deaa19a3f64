//! # Bastion Parser
//!
//! Turns a threat-model diagram document into the intermediate model that
//! the specification renderer consumes.
//!
//! The pipeline is:
//!
//! 1. **Parse** - deserialize the JSON document ([`diagram`])
//! 2. **Tag** - read `[Key: Value]` annotations from cell labels ([`tags`])
//! 3. **Build** - create assets, then flows and their data ([`ModelBuilder`])
//!
//! Only a document that is not valid JSON fails. Everything else that is
//! wrong with individual cells is returned as a [`ModelWarning`].
//!
//! ## Usage
//!
//! ```
//! # use bastion_parser::{ModelBuilder, ParseError};
//! # use bastion_core::defaults::ModelDefaults;
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"{"detail": {"diagrams": [{"diagramJson": {"cells": [
//!         {"type": "tm.Process", "id": "web", "attrs": {"text": {"text": "Web"}}},
//!         {"type": "tm.Store", "id": "db", "attrs": {"text": {"text": "Db [Level: Classified]"}}},
//!         {"type": "tm.Flow", "id": "q", "source": {"id": "web"}, "target": {"id": "db"}}
//!     ]}}]}}"#;
//!
//!     let extraction = ModelBuilder::new(ModelDefaults::default()).build_str(source)?;
//!     assert_eq!(extraction.model().flows().len(), 1);
//!     Ok(())
//! }
//! ```

mod builder;
pub mod diagram;
pub mod error;
mod span;
pub mod tags;

pub use builder::{Extraction, ModelBuilder, ModelWarning};
pub use error::ParseError;
pub use span::Span;
