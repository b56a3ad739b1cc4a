//! Error types for the sieve crate.

use thiserror::Error;

/// Errors that can occur when compiling or applying descriptors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SieveError {
    /// A path segment does not name a member of the entity it was looked up on.
    #[error("field '{path}' not found on {entity}")]
    FieldNotFound { path: String, entity: String },

    /// The field is configured as not filterable.
    #[error("field '{0}' is not filterable")]
    FieldNotFilterable(String),

    /// The field is configured as not sortable.
    #[error("field '{0}' is not sortable")]
    FieldNotSortable(String),

    /// A JSON path needs the JSON member plus at least one key.
    #[error("invalid JSON path '{0}': expected '<field>.<key>[.<key>...]'")]
    InvalidJsonPath(String),

    /// Unknown operator token, or an operator the field's type cannot support.
    #[error("invalid operator '{0}'")]
    InvalidOperator(String),

    /// A raw descriptor value could not be coerced to the field's type.
    #[error("cannot convert {value} to {target}")]
    ValueConversionFailure { value: String, target: String },

    /// Catch-all for descriptors that cannot be compiled.
    #[error("compile failure: {0}")]
    CompileFailure(String),

    /// Options could not be read or parsed.
    #[error("invalid options: {0}")]
    Options(String),
}

impl SieveError {
    /// Create a field-not-found error.
    pub fn not_found(path: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::FieldNotFound {
            path: path.into(),
            entity: entity.into(),
        }
    }

    /// Create a value conversion error.
    pub fn conversion(value: impl ToString, target: impl Into<String>) -> Self {
        Self::ValueConversionFailure {
            value: value.to_string(),
            target: target.into(),
        }
    }

    /// Create a compile failure.
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::CompileFailure(msg.into())
    }

    /// Returns `true` if lenient mode may drop the failing descriptor instead
    /// of aborting.
    ///
    /// A malformed JSON path is a descriptor error rather than a policy
    /// decision, so it is always surfaced. Options errors never occur during
    /// compilation.
    pub fn is_policy(&self) -> bool {
        !matches!(self, Self::InvalidJsonPath(_) | Self::Options(_))
    }
}

impl From<serde_yaml::Error> for SieveError {
    fn from(err: serde_yaml::Error) -> Self {
        SieveError::Options(err.to_string())
    }
}

/// Result type for sieve operations.
pub type Result<T> = std::result::Result<T, SieveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            SieveError::not_found("agee", "User").to_string(),
            "field 'agee' not found on User"
        );
        assert_eq!(
            SieveError::conversion("\"abc\"", "int").to_string(),
            "cannot convert \"abc\" to int"
        );
        assert_eq!(
            SieveError::InvalidOperator("=~".into()).to_string(),
            "invalid operator '=~'"
        );
    }

    #[test]
    fn json_path_errors_are_not_policy() {
        assert!(!SieveError::InvalidJsonPath("meta".into()).is_policy());
        assert!(SieveError::FieldNotFilterable("x".into()).is_policy());
        assert!(SieveError::compile("x").is_policy());
    }
}
