//! Errors produced while validating a gateway callback.

/// Reasons a callback is rejected.
///
/// Every variant is terminal for the current callback. Error text never
/// carries signature bytes or key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    /// The signature checker did not accept the request.
    #[error("invalid callback signature")]
    InvalidSignature,

    /// The `data` blob could not be decoded or parsed.
    #[error("malformed callback payload: {0}")]
    MalformedPayload(String),

    /// The payload belongs to another project.
    #[error("callback project id {got} does not match expected {expected}", got = .actual.as_deref().unwrap_or("<missing>"))]
    ProjectMismatch {
        expected: String,
        actual: Option<String>,
    },

    /// An asserted field is missing or holds a different value.
    #[error("field {field} is not as expected (expected {expected}, got {got})", got = .actual.as_deref().unwrap_or("<missing>"))]
    UnexpectedFieldValue {
        field: String,
        expected: String,
        actual: Option<String>,
    },
}

impl CallbackError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload(reason.into())
    }

    /// Short machine-readable label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CallbackError::InvalidSignature => "invalid_signature",
            CallbackError::MalformedPayload(_) => "malformed_payload",
            CallbackError::ProjectMismatch { .. } => "project_mismatch",
            CallbackError::UnexpectedFieldValue { .. } => "unexpected_field_value",
        }
    }
}
