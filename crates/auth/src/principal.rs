use serde::{Deserialize, Serialize};

use leasehold_core::{AgencyId, UserId};

use crate::Role;

/// Authenticated caller, as handed to the engine by the session layer.
///
/// The engine performs no re-authentication; it trusts this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub subject_id: UserId,
    pub role: Option<Role>,
    pub agency_id: Option<AgencyId>,
    /// Broker the user is associated with; carried for collaborators, not consulted by scope rules.
    pub broker_id: Option<UserId>,
    pub professional_credential_id: Option<String>,
}

impl UserContext {
    pub fn new(subject_id: UserId) -> Self {
        Self {
            subject_id,
            role: None,
            agency_id: None,
            broker_id: None,
            professional_credential_id: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_agency(mut self, agency_id: AgencyId) -> Self {
        self.agency_id = Some(agency_id);
        self
    }

    pub fn with_broker(mut self, broker_id: UserId) -> Self {
        self.broker_id = Some(broker_id);
        self
    }

    pub fn with_credential(mut self, credential_id: impl Into<String>) -> Self {
        self.professional_credential_id = Some(credential_id.into());
        self
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.role.as_ref() == Some(role)
    }

    /// A non-blank professional credential is present.
    pub fn has_credential(&self) -> bool {
        self.professional_credential_id
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credential_does_not_count() {
        let user = UserContext::new(UserId::new(1)).with_credential("  ");
        assert!(!user.has_credential());
        assert!(UserContext::new(UserId::new(1)).with_credential("CRECI-1234").has_credential());
    }

    #[test]
    fn role_check_is_exact() {
        let user = UserContext::new(UserId::new(1)).with_role(Role::BROKER);
        assert!(user.has_role(&Role::BROKER));
        assert!(!user.has_role(&Role::TENANT));
        assert!(!UserContext::new(UserId::new(1)).has_role(&Role::BROKER));
    }
}
