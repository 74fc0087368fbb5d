use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use leasehold_core::{AgencyId, DomainError, UserId};

use crate::{Role, UserContext};

/// Session claims model (transport-agnostic).
///
/// The minimal set of claims expected once a session token has been decoded
/// and verified by whatever security layer is in use. Identifiers travel as
/// decimal strings and are decoded exactly once, in [`SessionClaims::into_user_context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / user identifier.
    pub sub: String,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub agency_id: Option<String>,

    #[serde(default)]
    pub broker_id: Option<String>,

    #[serde(default)]
    pub professional_credential_id: Option<String>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error(transparent)]
    InvalidIdentifier(#[from] DomainError),
}

/// Deterministically validate the claims' time window.
///
/// Note: this validates the *claims* only. Token decoding and signature
/// verification happen outside this crate.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), ClaimsError> {
    if claims.expires_at <= claims.issued_at {
        return Err(ClaimsError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(ClaimsError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(ClaimsError::Expired);
    }
    Ok(())
}

impl SessionClaims {
    /// Decode string identifiers into a [`UserContext`].
    ///
    /// Blank optional fields are treated as absent; a blank role yields a
    /// context without role (which the catalog maps to no access).
    pub fn into_user_context(self) -> Result<UserContext, ClaimsError> {
        let subject_id: UserId = self.sub.parse()?;

        let agency_id = non_blank(self.agency_id)
            .map(|raw| raw.parse::<AgencyId>())
            .transpose()?;
        let broker_id = non_blank(self.broker_id)
            .map(|raw| raw.parse::<UserId>())
            .transpose()?;

        let mut user = UserContext::new(subject_id);
        if let Some(role) = non_blank(self.role) {
            user = user.with_role(Role::new(role.trim().to_string()));
        }
        if let Some(agency_id) = agency_id {
            user = user.with_agency(agency_id);
        }
        if let Some(broker_id) = broker_id {
            user = user.with_broker(broker_id);
        }
        if let Some(credential) = non_blank(self.professional_credential_id) {
            user = user.with_credential(credential);
        }
        Ok(user)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
