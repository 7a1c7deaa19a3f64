//! Error types for Bastion operations.
//!
//! This module provides the main error type [`BastionError`] which wraps
//! the error conditions that can occur while analyzing a threat model.

use std::io;

use thiserror::Error;

use bastion_parser::error::ParseError;

use crate::interpret::InterpretError;

/// The main error type for Bastion operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured error information with source
/// spans into the diagram document, for rich error reporting.
#[derive(Debug, Error)]
pub enum BastionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Checker error: {0}")]
    Checker(String),

    #[error("Result error: {0}")]
    Interpret(#[from] InterpretError),

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),
}

impl BastionError {
    /// Create a new `Parse` error with the associated source document.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
