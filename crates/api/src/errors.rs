//! Error → transport mapping (status codes and JSON error bodies).

use serde_json::{Value, json};

use leasehold_agreements::LifecycleError;
use leasehold_infra::RepositoryError;

use crate::guard::GuardError;

impl GuardError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GuardError::BadRequest(_) => 400,
            GuardError::Forbidden(_) => 403,
            GuardError::NotFound(_) => 404,
            GuardError::UnknownOperation(_) => 500,
            GuardError::Repository(err) => repository_status_code(err),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            GuardError::UnknownOperation(_) => "unknown_operation",
            GuardError::BadRequest(_) => "bad_request",
            GuardError::NotFound(_) => "not_found",
            GuardError::Forbidden(_) => "forbidden",
            GuardError::Repository(err) => repository_error_code(err),
        }
    }

    /// JSON error body.
    pub fn to_body(&self) -> Value {
        match self {
            GuardError::Forbidden(denial) => json_error(
                self.code(),
                denial.reason.as_ref(),
                Some(denial.kind.to_string()),
            ),
            other => json_error(other.code(), other.to_string(), None),
        }
    }
}

/// Status code for failures of the downstream conditional write.
pub fn repository_status_code(err: &RepositoryError) -> u16 {
    match err {
        RepositoryError::NotFound(_) => 404,
        RepositoryError::AlreadyExists(_) | RepositoryError::Conflict(_) => 409,
        RepositoryError::Lifecycle(LifecycleError::ReasonRequired) => 400,
        RepositoryError::Lifecycle(_) => 409,
        RepositoryError::Unavailable(_) => 503,
    }
}

pub fn repository_error_code(err: &RepositoryError) -> &'static str {
    match err {
        RepositoryError::NotFound(_) => "not_found",
        RepositoryError::AlreadyExists(_) => "already_exists",
        RepositoryError::Conflict(_) => "conflict",
        RepositoryError::Lifecycle(LifecycleError::ReasonRequired) => "validation_error",
        RepositoryError::Lifecycle(_) => "invalid_state",
        RepositoryError::Unavailable(_) => "unavailable",
    }
}

pub fn json_error(code: &'static str, message: impl Into<String>, kind: Option<String>) -> Value {
    let mut body = json!({
        "error": code,
        "message": message.into(),
    });
    if let (Some(kind), Some(object)) = (kind, body.as_object_mut()) {
        object.insert("kind".to_string(), Value::String(kind));
    }
    body
}
