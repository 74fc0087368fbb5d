use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use leasehold_auth::{ClaimsError, SessionClaims, UserContext, validate_claims};

/// Correlation id of one inbound request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Request context (authenticated caller + correlation id).
///
/// Immutable for the duration of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: RequestId,
    user: UserContext,
}

impl RequestContext {
    pub fn new(user: UserContext) -> Self {
        Self {
            request_id: RequestId::new(),
            user,
        }
    }

    /// Validate decoded session claims and build the context from them.
    pub fn from_claims(claims: SessionClaims, now: DateTime<Utc>) -> Result<Self, ClaimsError> {
        validate_claims(&claims, now)?;
        Ok(Self::new(claims.into_user_context()?))
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }
}
