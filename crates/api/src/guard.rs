//! API-side authorization guard for agreement operations.
//!
//! This enforces authorization at the request boundary (before the handler
//! runs), while keeping the domain and the permission service transport-agnostic.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{Instrument, debug, info_span};

use leasehold_agreements::{Agreement, SignatureType};
use leasehold_auth::{AccessFilter, Action, Denial, PermissionService};
use leasehold_core::AgreementId;
use leasehold_infra::{AgreementRepository, RepositoryError};

use crate::context::RequestContext;
use crate::registry::{OperationPolicy, OperationRegistry};
use crate::signature::{SignatureRequest, SignatureResolutionError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("agreement {0} not found")]
    NotFound(AgreementId),

    #[error("forbidden: {}", .0.reason)]
    Forbidden(Denial),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<SignatureResolutionError> for GuardError {
    fn from(value: SignatureResolutionError) -> Self {
        GuardError::BadRequest(value.to_string())
    }
}

/// Inbound request as seen by the guard.
#[derive(Debug, Clone)]
pub struct GuardRequest {
    pub operation: String,
    pub context: RequestContext,
    /// Raw agreement id from the route, if any.
    pub agreement_id: Option<String>,
    /// Raw request body, if any.
    pub body: Option<Value>,
}

impl GuardRequest {
    pub fn new(operation: impl Into<String>, context: RequestContext) -> Self {
        Self {
            operation: operation.into(),
            context,
            agreement_id: None,
            body: None,
        }
    }

    pub fn with_agreement_id(mut self, id: impl Into<String>) -> Self {
        self.agreement_id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What the handler receives once the request is allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardOutcome {
    pub policy: OperationPolicy,
    /// The loaded agreement (record-scoped operations only).
    pub agreement: Option<Agreement>,
    pub signature_type: Option<SignatureType>,
    /// Visibility filter for collection reads.
    pub access_filter: Option<AccessFilter>,
}

#[derive(Clone)]
pub struct AuthorizationGuard {
    registry: Arc<OperationRegistry>,
    service: Arc<PermissionService>,
    repository: Arc<dyn AgreementRepository>,
    strict_signature_type: bool,
}

impl AuthorizationGuard {
    pub fn new(
        registry: Arc<OperationRegistry>,
        service: Arc<PermissionService>,
        repository: Arc<dyn AgreementRepository>,
        strict_signature_type: bool,
    ) -> Self {
        Self {
            registry,
            service,
            repository,
            strict_signature_type,
        }
    }

    /// Check a request before its handler runs.
    ///
    /// Missing records are reported as `NotFound` before any authorization
    /// reasoning happens.
    pub async fn check(&self, request: &GuardRequest) -> Result<GuardOutcome, GuardError> {
        let span = info_span!(
            "authorization_guard",
            request_id = %request.context.request_id(),
            operation = %request.operation,
        );
        self.check_inner(request).instrument(span).await
    }

    async fn check_inner(&self, request: &GuardRequest) -> Result<GuardOutcome, GuardError> {
        let policy = *self
            .registry
            .get(&request.operation)
            .ok_or_else(|| GuardError::UnknownOperation(request.operation.clone()))?;

        let agreement = if policy.requires_record_id {
            let id = parse_agreement_id(request.agreement_id.as_deref())?;
            let loaded = self.repository.load(id).await?;
            Some(loaded.ok_or(GuardError::NotFound(id))?)
        } else {
            None
        };

        let signature_type = match (policy.action, policy.signature_type) {
            (Action::Sign, Some(declared)) => Some(declared),
            (Action::Sign, None) => SignatureRequest::from_body(request.body.as_ref())?
                .resolve(self.strict_signature_type)?,
            _ => None,
        };

        let user = request.context.user();
        self.service
            .authorize(user, policy.action, agreement.as_ref(), signature_type)
            .into_result()
            .map_err(GuardError::Forbidden)?;

        let access_filter = (policy.action == Action::View && !policy.requires_record_id)
            .then(|| self.service.build_access_filter(user));

        debug!(action = %policy.action, "request authorized");
        Ok(GuardOutcome {
            policy,
            agreement,
            signature_type,
            access_filter,
        })
    }
}

fn parse_agreement_id(raw: Option<&str>) -> Result<AgreementId, GuardError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| GuardError::BadRequest("agreement id is required".to_string()))?;
    raw.parse()
        .map_err(|e: leasehold_core::DomainError| GuardError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agreement_id_must_be_present_and_numeric() {
        assert!(matches!(parse_agreement_id(None), Err(GuardError::BadRequest(_))));
        assert!(matches!(parse_agreement_id(Some("  ")), Err(GuardError::BadRequest(_))));
        assert!(matches!(parse_agreement_id(Some("12a")), Err(GuardError::BadRequest(_))));
        assert_eq!(parse_agreement_id(Some("12")), Ok(AgreementId::new(12)));
    }

    #[test]
    fn forbidden_message_carries_the_reason() {
        let err = GuardError::Forbidden(Denial::role("role may not delete agreements"));
        assert_eq!(err.to_string(), "forbidden: role may not delete agreements");
    }
}
