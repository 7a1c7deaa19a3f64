//! Sanitized identifiers for generated specifications.
//!
//! Diagram editors hand out opaque identifiers (usually UUIDs) that are not
//! valid identifiers in the generated specification language. This module
//! provides the [`SanitizedId`] type, produced by a pure and injective
//! transform so that regenerating a diagram yields byte-identical output.
//!
//! # Encoding
//!
//! - Ids made only of ASCII alphanumerics and `-` become
//!   `Obj_` followed by the id with every `-` replaced by `_`.
//! - Every other id becomes `ObjX_` followed by the lowercase hex encoding
//!   of its UTF-8 bytes.
//!
//! The two families use distinct prefixes and each family is injective on
//! its own domain, so no two external ids share a sanitized form.

use std::fmt::{self, Write as _};

use serde::Serialize;

const PLAIN_PREFIX: &str = "Obj_";
const ENCODED_PREFIX: &str = "ObjX_";

/// An identifier that is safe to emit into a generated specification.
///
/// # Examples
///
/// ```
/// use bastion_core::identifier::SanitizedId;
///
/// let id = SanitizedId::from_external("3f2a-91c0");
/// assert_eq!(id, "Obj_3f2a_91c0");
///
/// let data = SanitizedId::derived("Data_", &id);
/// assert_eq!(data, "Data_Obj_3f2a_91c0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SanitizedId(String);

impl SanitizedId {
    /// Sanitizes an identifier supplied by the diagram document.
    pub fn from_external(external: &str) -> Self {
        let is_plain = !external.is_empty()
            && external
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');

        if is_plain {
            return Self(format!("{PLAIN_PREFIX}{}", external.replace('-', "_")));
        }

        let mut encoded = String::with_capacity(ENCODED_PREFIX.len() + external.len() * 2);
        encoded.push_str(ENCODED_PREFIX);
        for byte in external.bytes() {
            write!(encoded, "{byte:02x}").expect("Writing to String buffer is infallible");
        }
        Self(encoded)
    }

    /// Creates an identifier for an entity owned by `owner`.
    ///
    /// Uniqueness follows from the uniqueness of the owner.
    pub fn derived(prefix: &str, owner: &SanitizedId) -> Self {
        Self(format!("{prefix}{}", owner.0))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SanitizedId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SanitizedId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
