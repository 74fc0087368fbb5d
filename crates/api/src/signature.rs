//! Signature-type resolution from SIGN request bodies.
//!
//! Clients either name the type explicitly (`signatureType`) or send one of
//! the legacy payload fields `tenantSignature` / `ownerSignature` /
//! `agencySignature`. The explicit field always wins. Legacy flags are
//! mutually exclusive; when several are present the first of tenant, owner,
//! agency is used, unless strict mode rejects the request.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use leasehold_agreements::SignatureType;

/// SIGN request body (only the fields relevant to authorization).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    #[serde(default)]
    pub signature_type: Option<SignatureType>,
    #[serde(default)]
    pub tenant_signature: Option<Value>,
    #[serde(default)]
    pub owner_signature: Option<Value>,
    #[serde(default)]
    pub agency_signature: Option<Value>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureResolutionError {
    #[error("invalid signature request body: {0}")]
    Malformed(String),

    #[error("ambiguous signature request: more than one of {0:?} is set")]
    Ambiguous(Vec<SignatureType>),
}

impl SignatureRequest {
    /// Parse the relevant fields of a request body; a missing body is an empty request.
    pub fn from_body(body: Option<&Value>) -> Result<Self, SignatureResolutionError> {
        match body {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => Self::deserialize(value)
                .map_err(|e| SignatureResolutionError::Malformed(e.to_string())),
        }
    }

    /// Legacy flags that are set, in precedence order.
    pub fn flagged_types(&self) -> Vec<SignatureType> {
        [
            (&self.tenant_signature, SignatureType::Tenant),
            (&self.owner_signature, SignatureType::Owner),
            (&self.agency_signature, SignatureType::Agency),
        ]
        .into_iter()
        .filter(|(value, _)| is_set(value))
        .map(|(_, signature_type)| signature_type)
        .collect()
    }

    /// Resolve the requested signature type, `None` if the body names none.
    pub fn resolve(&self, strict: bool) -> Result<Option<SignatureType>, SignatureResolutionError> {
        if let Some(explicit) = self.signature_type {
            return Ok(Some(explicit));
        }

        let flagged = self.flagged_types();
        if flagged.len() > 1 {
            if strict {
                return Err(SignatureResolutionError::Ambiguous(flagged));
            }
            warn!(flags = ?flagged, chosen = %flagged[0], "ambiguous signature flags in request");
        }
        Ok(flagged.first().copied())
    }
}

/// A flag counts when present with a meaningful value (`false`, `null` and `""` do not).
fn is_set(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
