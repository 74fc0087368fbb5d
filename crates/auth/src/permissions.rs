use serde::{Deserialize, Serialize};

use leasehold_agreements::SignatureType;

/// Action a caller can request on agreements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Sign,
    Approve,
    Reject,
    Cancel,
    SendForSignature,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Sign,
        Action::Approve,
        Action::Reject,
        Action::Cancel,
        Action::SendForSignature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "VIEW",
            Action::Create => "CREATE",
            Action::Edit => "EDIT",
            Action::Delete => "DELETE",
            Action::Sign => "SIGN",
            Action::Approve => "APPROVE",
            Action::Reject => "REJECT",
            Action::Cancel => "CANCEL",
            Action::SendForSignature => "SEND_FOR_SIGNATURE",
        }
    }

    /// Every action except `CREATE` targets an existing record.
    pub fn is_record_scoped(&self) -> bool {
        !matches!(self, Action::Create)
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which agreement records a role may see and act upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessScope {
    /// Every record.
    All,
    /// Records of the caller's agency (or, without an agency, records they created).
    Agency,
    /// Records the caller created (brokers also see records of properties they broker).
    OwnCreated,
    /// Records naming the caller as a party, directly or through property/contract.
    PartyTo,
    /// Nothing.
    None,
}

impl AccessScope {
    pub const ALL_SCOPES: [AccessScope; 5] = [
        AccessScope::All,
        AccessScope::Agency,
        AccessScope::OwnCreated,
        AccessScope::PartyTo,
        AccessScope::None,
    ];
}

/// Capabilities granted to one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RolePermissions {
    pub view: AccessScope,
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
    pub approve: bool,
    pub reject: bool,
    pub cancel: bool,
    pub send_for_signature: bool,
    /// Signature types this role may produce; empty means the role cannot sign.
    pub signature_types: &'static [SignatureType],
    /// A professional credential is mandatory to sign.
    pub requires_credential: bool,
    /// Editing is only allowed while no signature has been collected.
    pub edit_requires_unsigned: bool,
}

impl RolePermissions {
    /// Entry for unknown, empty or missing roles.
    pub const NO_ACCESS: RolePermissions = RolePermissions {
        view: AccessScope::None,
        create: false,
        edit: false,
        delete: false,
        approve: false,
        reject: false,
        cancel: false,
        send_for_signature: false,
        signature_types: &[],
        requires_credential: false,
        edit_requires_unsigned: false,
    };

    pub fn can_sign(&self) -> bool {
        !self.signature_types.is_empty()
    }

    pub fn can_sign_as(&self, signature_type: SignatureType) -> bool {
        self.signature_types.contains(&signature_type)
    }

    /// Capability flag for `action`, ignoring record scope and signature type.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view != AccessScope::None,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
            Action::Sign => self.can_sign(),
            Action::Approve => self.approve,
            Action::Reject => self.reject,
            Action::Cancel => self.cancel,
            Action::SendForSignature => self.send_for_signature,
        }
    }

    /// Actions whose capability flag is set.
    pub fn capabilities(&self) -> Vec<Action> {
        Action::ALL.into_iter().filter(|a| self.allows(*a)).collect()
    }
}
