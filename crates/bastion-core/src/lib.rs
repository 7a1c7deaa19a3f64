//! Bastion Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Bastion
//! threat-model pipeline. It includes:
//!
//! - **Identifiers**: Sanitized, specification-safe identifiers ([`identifier::SanitizedId`])
//! - **Model**: The Intermediate Model of assets, data objects and flows ([`model`] module)
//! - **Defaults**: Injectable attribute defaults ([`defaults::ModelDefaults`])
//! - **Flags**: Boolean attribute tokens ([`flag`] module)

pub mod defaults;
pub mod flag;
pub mod identifier;
pub mod model;
