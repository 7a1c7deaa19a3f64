//! Error and diagnostic system for the Bastion parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, multiple source
//! locations, and help text. Multiple diagnostics are wrapped in [`ParseError`]
//! when a phase fails.
//!
//! Extraction itself never fails on annotation problems: those diagnostics
//! are downgraded to warnings and returned next to the model.
//!
//! # Example
//!
//! ```
//! # use bastion_parser::error::{Diagnostic, ErrorCode};
//! # use bastion_parser::Span;
//!
//! let diag = Diagnostic::warning("unterminated tag")
//!     .with_code(ErrorCode::E002)
//!     .with_label(Span::new(4..18), "tag starts here")
//!     .with_help("close the tag with `]`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
