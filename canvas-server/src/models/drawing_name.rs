//! Drawing name validation

use super::ValidationError;

/// Validated drawing name
///
/// Names are unique across the whole store, not per owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrawingName(String);

impl DrawingName {
    /// Create a new drawing name.
    ///
    /// Any non-empty string is accepted and stored exactly as given, so
    /// fetch-by-name matches what was uploaded byte for byte.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty {
                field: "drawingName",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for DrawingName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
