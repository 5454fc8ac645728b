//! Raw SQL identifiers.

use crate::error::{DbError, DbResult};
use std::fmt;

/// A table or database name that is spliced into SQL text exactly as given.
///
/// There is no quoting or escaping: `DESCRIBE {table}` with `table = "t; DROP TABLE t"` sends
/// both statements' text to the server. Validating names from untrusted callers is the
/// caller's job; [`RawIdentifier::is_plain`] and [`RawIdentifier::checked`] help with that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIdentifier(String);

impl RawIdentifier {
    /// Wrap a name without any validation.
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// True for non-empty names made of ASCII letters, digits, `_` and `$` only.
    pub fn is_plain(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    }

    /// Reject names that are not plain when `strict` is set; pass everything through otherwise.
    pub fn checked(self, strict: bool) -> DbResult<Self> {
        if strict && !self.is_plain() {
            return Err(DbError::invalid_input(format!(
                "'{}' is not a plain identifier (letters, digits, '_' and '$' only)",
                self.0
            )));
        }
        Ok(self)
    }
}

impl fmt::Display for RawIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
