//! By-id authorization queries (the engine's exposed decision contract).

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use leasehold_agreements::{Agreement, SignatureType};
use leasehold_auth::{Action, AuthorizationExplanation, Decision, PermissionService, UserContext};
use leasehold_core::AgreementId;
use leasehold_infra::AgreementRepository;

use crate::guard::GuardError;

/// Decision in its externally visible shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Decision> for AuthorizationResponse {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Allowed => Self {
                allowed: true,
                reason: None,
            },
            Decision::Denied(denial) => Self {
                allowed: false,
                reason: Some(denial.reason.into_owned()),
            },
        }
    }
}

#[derive(Clone)]
pub struct AgreementAuthorizer {
    service: Arc<PermissionService>,
    repository: Arc<dyn AgreementRepository>,
}

impl AgreementAuthorizer {
    pub fn new(service: Arc<PermissionService>, repository: Arc<dyn AgreementRepository>) -> Self {
        Self {
            service,
            repository,
        }
    }

    /// Decide `action` for the agreement with `agreement_id`.
    ///
    /// Without an id only the role gate runs. A missing agreement is an error,
    /// never a denial.
    pub async fn authorize_by_id(
        &self,
        user: &UserContext,
        action: Action,
        agreement_id: Option<AgreementId>,
        signature_type: Option<SignatureType>,
    ) -> Result<AuthorizationResponse, GuardError> {
        let agreement = match agreement_id {
            Some(id) => Some(self.load(id).await?),
            None => None,
        };
        Ok(self
            .service
            .authorize(user, action, agreement.as_ref(), signature_type)
            .into())
    }

    pub async fn available_actions_by_id(
        &self,
        user: &UserContext,
        agreement_id: AgreementId,
    ) -> Result<BTreeSet<Action>, GuardError> {
        let agreement = self.load(agreement_id).await?;
        Ok(self.service.available_actions(user, &agreement))
    }

    pub async fn explain_by_id(
        &self,
        user: &UserContext,
        action: Action,
        agreement_id: AgreementId,
        signature_type: Option<SignatureType>,
    ) -> Result<AuthorizationExplanation, GuardError> {
        let agreement = self.load(agreement_id).await?;
        Ok(self
            .service
            .explain(user, action, Some(&agreement), signature_type))
    }

    async fn load(&self, id: AgreementId) -> Result<Agreement, GuardError> {
        self.repository
            .load(id)
            .await?
            .ok_or(GuardError::NotFound(id))
    }
}
