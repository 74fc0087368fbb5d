//! Operation metadata: which action each boundary operation performs.
//!
//! Operations are registered explicitly in a table; the guard looks the
//! policy up by operation id before anything else happens.

use std::collections::BTreeMap;

use serde::Serialize;

use leasehold_agreements::SignatureType;
use leasehold_auth::Action;

pub const LIST: &str = "agreements.list";
pub const GET: &str = "agreements.get";
pub const CREATE: &str = "agreements.create";
pub const UPDATE: &str = "agreements.update";
pub const DELETE: &str = "agreements.delete";
pub const SIGN: &str = "agreements.sign";
pub const SEND_FOR_SIGNATURE: &str = "agreements.send_for_signature";
pub const APPROVE: &str = "agreements.approve";
pub const REJECT: &str = "agreements.reject";
pub const CANCEL: &str = "agreements.cancel";
pub const AVAILABLE_ACTIONS: &str = "agreements.available_actions";

/// Authorization metadata of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationPolicy {
    pub action: Action,
    /// Fixed signature type; when `None` a SIGN operation reads it from the request body.
    pub signature_type: Option<SignatureType>,
    /// The operation targets one agreement whose id must be supplied.
    pub requires_record_id: bool,
}

impl OperationPolicy {
    pub const fn collection(action: Action) -> Self {
        Self {
            action,
            signature_type: None,
            requires_record_id: false,
        }
    }

    pub const fn record(action: Action) -> Self {
        Self {
            action,
            signature_type: None,
            requires_record_id: true,
        }
    }

    pub const fn with_signature_type(mut self, signature_type: SignatureType) -> Self {
        self.signature_type = Some(signature_type);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    policies: BTreeMap<String, OperationPolicy>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The agreement endpoints.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(LIST, OperationPolicy::collection(Action::View))
            .register(GET, OperationPolicy::record(Action::View))
            .register(CREATE, OperationPolicy::collection(Action::Create))
            .register(UPDATE, OperationPolicy::record(Action::Edit))
            .register(DELETE, OperationPolicy::record(Action::Delete))
            .register(SIGN, OperationPolicy::record(Action::Sign))
            .register(SEND_FOR_SIGNATURE, OperationPolicy::record(Action::SendForSignature))
            .register(APPROVE, OperationPolicy::record(Action::Approve))
            .register(REJECT, OperationPolicy::record(Action::Reject))
            .register(CANCEL, OperationPolicy::record(Action::Cancel))
            .register(AVAILABLE_ACTIONS, OperationPolicy::record(Action::View));
        registry
    }

    /// Register (or replace) the policy of `operation`.
    pub fn register(&mut self, operation: impl Into<String>, policy: OperationPolicy) -> &mut Self {
        self.policies.insert(operation.into(), policy);
        self
    }

    pub fn get(&self, operation: &str) -> Option<&OperationPolicy> {
        self.policies.get(operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = (&str, &OperationPolicy)> {
        self.policies.iter().map(|(name, policy)| (name.as_str(), policy))
    }
}
