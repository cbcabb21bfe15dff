//! Error types for filter compilation

use thiserror::Error;

use crate::data::error::DataError;

/// A compilation failure
///
/// Compilation is deterministic, so none of these are worth retrying except
/// `CatalogUnavailable`, and that decision belongs to the caller.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A condition references a code the catalog did not resolve
    #[error("unknown field code: {code}")]
    UnknownFieldCode { code: String },

    /// Operator token not in the operator table
    #[error("unsupported operator '{operator}' on field {field}")]
    UnsupportedOperator { field: String, operator: String },

    /// Operand does not fit the operator
    #[error("malformed operand for {field} {operator}: {reason}")]
    MalformedOperand {
        field: String,
        operator: String,
        reason: String,
    },

    /// Wire filter is not a valid expression tree
    #[error("malformed filter expression: {reason}")]
    MalformedExpressionShape { reason: String },

    /// The field catalog could not be read
    #[error("field catalog unavailable: {0}")]
    CatalogUnavailable(#[source] DataError),
}

impl FilterError {
    pub fn unknown_field(code: impl Into<String>) -> Self {
        Self::UnknownFieldCode { code: code.into() }
    }

    pub fn unsupported_operator(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            field: field.into(),
            operator: operator.into(),
        }
    }

    pub fn malformed_operand(
        field: impl Into<String>,
        operator: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedOperand {
            field: field.into(),
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_shape(reason: impl Into<String>) -> Self {
        Self::MalformedExpressionShape {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownFieldCode { .. } => "UNKNOWN_FIELD_CODE",
            Self::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            Self::MalformedOperand { .. } => "MALFORMED_OPERAND",
            Self::MalformedExpressionShape { .. } => "MALFORMED_FILTER",
            Self::CatalogUnavailable(_) => "CATALOG_UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = FilterError::malformed_operand("age", "between", "expected two bounds");
        assert_eq!(
            err.to_string(),
            "malformed operand for age between: expected two bounds"
        );

        let err = FilterError::unsupported_operator("age", "~=");
        assert_eq!(err.to_string(), "unsupported operator '~=' on field age");
    }

    #[test]
    fn test_catalog_error_keeps_source() {
        let err = FilterError::CatalogUnavailable(DataError::backend_unavailable("mysql", "down"));
        assert_eq!(err.code(), "CATALOG_UNAVAILABLE");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_codes_are_distinct() {
        assert_eq!(FilterError::unknown_field("x").code(), "UNKNOWN_FIELD_CODE");
        assert_eq!(FilterError::malformed_shape("x").code(), "MALFORMED_FILTER");
    }
}
