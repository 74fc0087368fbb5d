//! Authorization decisions, denials and their audit explanation.

use std::borrow::Cow;

use serde::Serialize;

use leasehold_agreements::{AgreementStatus, LifecycleError, SignatureType};
use leasehold_core::AgreementId;

use crate::permissions::{AccessScope, Action};

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The caller's role lacks the capability.
    Role,
    /// The record's current state forbids the action.
    Lifecycle,
    /// The caller is not the right person for this record.
    Identity,
}

impl core::fmt::Display for DenialKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DenialKind::Role => f.write_str("role"),
            DenialKind::Lifecycle => f.write_str("lifecycle"),
            DenialKind::Identity => f.write_str("identity"),
        }
    }
}

/// A refused authorization.
///
/// `reason` is shown to the caller and never names other parties or the
/// record's state. `detail` is kept for audit explanations only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub kind: DenialKind,
    pub reason: Cow<'static, str>,
    #[serde(skip)]
    pub detail: Option<Cow<'static, str>>,
}

impl Denial {
    pub fn role(reason: &'static str) -> Self {
        Self {
            kind: DenialKind::Role,
            reason: Cow::Borrowed(reason),
            detail: None,
        }
    }

    pub fn identity(reason: &'static str) -> Self {
        Self {
            kind: DenialKind::Identity,
            reason: Cow::Borrowed(reason),
            detail: None,
        }
    }

    pub fn lifecycle(error: &LifecycleError) -> Self {
        Self {
            kind: DenialKind::Lifecycle,
            reason: Cow::Borrowed(error.public_reason()),
            detail: Some(Cow::Owned(error.to_string())),
        }
    }
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} denial: {}", self.kind, self.reason)
    }
}

impl From<LifecycleError> for Denial {
    fn from(value: LifecycleError) -> Self {
        Denial::lifecycle(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(denial) => Some(denial),
        }
    }

    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(denial) => Err(denial),
        }
    }
}

impl From<Result<(), Denial>> for Decision {
    fn from(value: Result<(), Denial>) -> Self {
        match value {
            Ok(()) => Decision::Allowed,
            Err(denial) => Decision::Denied(denial),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Evaluation stage of the permission service, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Role,
    RecordState,
    RecordIdentity,
    SignatureIdentity,
}

/// Outcome of one evaluated gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    pub gate: Gate,
    pub passed: bool,
    pub reason: Option<Cow<'static, str>>,
    /// Internal cause (e.g. the lifecycle status), for audit tooling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Cow<'static, str>>,
}

/// Detailed explanation of an authorization decision.
///
/// Lists every gate that was evaluated (gates after the first failure are not
/// evaluated) so audit tooling can answer "why was this allowed/denied?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub action: Action,
    pub role: Option<String>,
    pub scope: AccessScope,
    pub agreement_id: Option<AgreementId>,
    pub agreement_status: Option<AgreementStatus>,
    pub signature_type: Option<SignatureType>,
    pub gates: Vec<GateReport>,
    pub granted: bool,
    pub decision: Decision,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lifecycle_errors_become_lifecycle_denials() {
        let denial = Denial::from(LifecycleError::NotSignable(AgreementStatus::Completed));
        assert_eq!(denial.kind, DenialKind::Lifecycle);
        assert_eq!(denial.reason, "agreement is not open for signing");
        assert!(denial.detail.as_deref().is_some_and(|d| d.contains("COMPLETED")));

        let body = serde_json::to_value(Decision::Denied(denial)).unwrap();
        assert!(!body.to_string().contains("COMPLETED"));
    }

    #[test]
    fn decision_serializes_with_outcome_tag() {
        let decision = Decision::Denied(Denial::role("role may not delete agreements"));
        assert_eq!(
            serde_json::to_value(&decision).unwrap(),
            json!({
                "outcome": "denied",
                "kind": "role",
                "reason": "role may not delete agreements"
            })
        );
        assert_eq!(
            serde_json::to_value(&Decision::Allowed).unwrap(),
            json!({ "outcome": "allowed" })
        );
    }
}
