//! Error codes for the Bastion diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Tag syntax errors
//! - `E1xx` - Document errors
//! - `E2xx` - Model building errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Tag Errors (E0xx)
    // =========================================================================
    /// Missing tag value.
    ///
    /// A tag was opened with `[Key:` but no word follows the colon.
    E001,

    /// Unterminated tag.
    ///
    /// A tag value was not followed by the closing `]`. Values are a single
    /// word; `[Level: Top Secret]` stops at the space.
    E002,

    // =========================================================================
    // Document Errors (E1xx)
    // =========================================================================
    /// Malformed diagram document.
    ///
    /// The input is not valid JSON. Shape problems inside the document are
    /// never fatal.
    E100,

    // =========================================================================
    // Model Errors (E2xx)
    // =========================================================================
    /// Dangling flow endpoint.
    ///
    /// A flow's source or target is not one of the recognized asset cells.
    /// The flow is dropped.
    E200,

    /// Invalid boolean tag.
    ///
    /// A boolean attribute tag holds something other than `true` or `false`.
    /// The default value is used instead.
    E201,

    /// Cell without identifier.
    ///
    /// An asset or flow cell has no `id`. The cell is skipped.
    E202,

    /// Duplicate cell identifier.
    ///
    /// Two asset or flow cells share an `id`. The later cell is skipped.
    E203,

    /// Mistyped cell field.
    ///
    /// A field of an asset or flow cell has the wrong JSON type, such as a
    /// string `isEncrypted`. The field is treated as absent.
    E204,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "missing tag value",
            ErrorCode::E002 => "unterminated tag",
            ErrorCode::E100 => "malformed diagram document",
            ErrorCode::E200 => "dangling flow endpoint",
            ErrorCode::E201 => "invalid boolean tag",
            ErrorCode::E202 => "cell without identifier",
            ErrorCode::E203 => "duplicate cell identifier",
            ErrorCode::E204 => "mistyped cell field",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
