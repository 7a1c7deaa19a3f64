//! Boolean-valued attribute tokens.
//!
//! The generated specification models booleans as the atoms `True` and
//! `False`. Diagram tags spell them freely (`true`, `TRUE`, `False`), so
//! parsing is case-insensitive and rendering is canonical.

use thiserror::Error;

/// A tag value that does not spell a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{value}` is not a boolean, expected `true` or `false`")]
pub struct InvalidFlag {
    value: String,
}

impl InvalidFlag {
    /// The rejected value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Parses a boolean token, ignoring ASCII case.
///
/// # Errors
///
/// Returns [`InvalidFlag`] for anything other than `true` or `false`.
pub fn parse_flag(value: &str) -> Result<bool, InvalidFlag> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(InvalidFlag {
            value: value.to_string(),
        })
    }
}

/// Returns the specification atom for a boolean.
pub fn flag_token(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
