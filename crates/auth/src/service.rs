//! Permission service: answers "may this user do this to that agreement?".
//!
//! Gates are evaluated in a fixed order and the first failure wins:
//!
//! 1. **Role**: capability flags of the caller's role (never needs the record).
//! 2. **Record state**: the lifecycle predicate for the action.
//! 3. **Record identity**: the role's access scope, plus the signed-record
//!    edit restriction of roles flagged `edit_requires_unsigned`.
//! 4. **Signature identity** (SIGN only): the caller is the party the
//!    signature type stands for.
//!
//! Record-scoped actions evaluated without a record only run the role gate.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use leasehold_agreements::{
    Agreement, PartyRole, SignatureType, lifecycle, resolve_agency, resolve_party,
};

use crate::authorize::{AuthorizationExplanation, Decision, Denial, Gate, GateReport};
use crate::catalog::PermissionCatalog;
use crate::filter::AccessFilter;
use crate::permissions::{AccessScope, Action, RolePermissions};
use crate::scope::{build_list_filter, can_access_record};
use crate::UserContext;

/// Stateless, shareable authorization engine.
#[derive(Debug, Clone)]
pub struct PermissionService {
    catalog: Arc<PermissionCatalog>,
}

impl PermissionService {
    pub fn new(catalog: Arc<PermissionCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Permissions of the caller's role.
    pub fn permissions_for(&self, user: &UserContext) -> &RolePermissions {
        self.catalog.get(user.role.as_ref())
    }

    /// Decide whether `user` may perform `action`.
    ///
    /// `agreement` is the current snapshot of the target record (ignored for
    /// `CREATE`); `signature_type` is only meaningful for `SIGN`.
    pub fn authorize(
        &self,
        user: &UserContext,
        action: Action,
        agreement: Option<&Agreement>,
        signature_type: Option<SignatureType>,
    ) -> Decision {
        let decision = self.evaluate(user, action, agreement, signature_type, &mut |_, _| {});

        let role = user.role.as_ref().map(|r| r.as_str()).unwrap_or("<none>");
        let agreement_id = agreement.map(|a| a.id.get());
        match &decision {
            Decision::Allowed => {
                debug!(action = %action, role, agreement_id, "authorization allowed");
            }
            Decision::Denied(denial) => {
                info!(
                    action = %action,
                    role,
                    agreement_id,
                    kind = %denial.kind,
                    reason = %denial.reason,
                    "authorization denied"
                );
            }
        }

        decision
    }

    /// Every action `user` may currently perform on `agreement`.
    ///
    /// `SIGN` is included when at least one of the role's signature types is
    /// authorized.
    pub fn available_actions(&self, user: &UserContext, agreement: &Agreement) -> BTreeSet<Action> {
        const CANDIDATES: [Action; 7] = [
            Action::View,
            Action::Edit,
            Action::Delete,
            Action::Approve,
            Action::Reject,
            Action::Cancel,
            Action::SendForSignature,
        ];

        let mut available: BTreeSet<Action> = CANDIDATES
            .into_iter()
            .filter(|action| {
                self.evaluate(user, *action, Some(agreement), None, &mut |_, _| {})
                    .is_allowed()
            })
            .collect();

        let can_sign = self.permissions_for(user).signature_types.iter().any(|sig| {
            self.evaluate(user, Action::Sign, Some(agreement), Some(*sig), &mut |_, _| {})
                .is_allowed()
        });
        if can_sign {
            available.insert(Action::Sign);
        }

        debug!(
            agreement_id = agreement.id.get(),
            count = available.len(),
            "computed available actions"
        );
        available
    }

    /// Filter selecting every agreement `user` may view.
    pub fn build_access_filter(&self, user: &UserContext) -> AccessFilter {
        build_list_filter(self.permissions_for(user).view, user)
    }

    /// Same decision as [`PermissionService::authorize`], with a per-gate trail.
    pub fn explain(
        &self,
        user: &UserContext,
        action: Action,
        agreement: Option<&Agreement>,
        signature_type: Option<SignatureType>,
    ) -> AuthorizationExplanation {
        let mut gates = Vec::new();
        let decision = self.evaluate(user, action, agreement, signature_type, &mut |gate, outcome| {
            gates.push(GateReport {
                gate,
                passed: outcome.is_ok(),
                reason: outcome.as_ref().err().map(|d| d.reason.clone()),
                detail: outcome.as_ref().err().and_then(|d| d.detail.clone()),
            });
        });

        AuthorizationExplanation {
            action,
            role: user.role.as_ref().map(|r| r.as_str().to_string()),
            scope: self.permissions_for(user).view,
            agreement_id: agreement.map(|a| a.id),
            agreement_status: agreement.map(|a| a.status),
            signature_type,
            gates,
            granted: decision.is_allowed(),
            decision,
        }
    }

    fn evaluate(
        &self,
        user: &UserContext,
        action: Action,
        agreement: Option<&Agreement>,
        signature_type: Option<SignatureType>,
        observe: &mut dyn FnMut(Gate, &Result<(), Denial>),
    ) -> Decision {
        let permissions = self.permissions_for(user);

        let outcome = role_gate(permissions, user, action, signature_type);
        observe(Gate::Role, &outcome);
        if outcome.is_err() {
            return outcome.into();
        }

        let Some(agreement) = agreement.filter(|_| action.is_record_scoped()) else {
            return Decision::Allowed;
        };

        let outcome = record_state_gate(user, action, agreement, signature_type);
        observe(Gate::RecordState, &outcome);
        if outcome.is_err() {
            return outcome.into();
        }

        let outcome = record_identity_gate(permissions, user, action, agreement);
        observe(Gate::RecordIdentity, &outcome);
        if outcome.is_err() {
            return outcome.into();
        }

        if let (Action::Sign, Some(signature_type)) = (action, signature_type) {
            let outcome = signature_identity_gate(user, agreement, signature_type);
            observe(Gate::SignatureIdentity, &outcome);
            return outcome.into();
        }

        Decision::Allowed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gates
// ─────────────────────────────────────────────────────────────────────────────

fn role_gate(
    permissions: &RolePermissions,
    user: &UserContext,
    action: Action,
    signature_type: Option<SignatureType>,
) -> Result<(), Denial> {
    if permissions.view == AccessScope::None {
        return Err(Denial::role("role has no access to agreements"));
    }
    if !permissions.allows(action) {
        return Err(Denial::role(missing_capability(action)));
    }

    if action == Action::Sign {
        let Some(signature_type) = signature_type else {
            return Err(Denial::role("a signature type is required to sign"));
        };
        if !permissions.can_sign_as(signature_type) {
            return Err(Denial::role("role cannot provide this type of signature"));
        }
        if permissions.requires_credential && !user.has_credential() {
            return Err(Denial::role("a professional credential is required to sign"));
        }
    }

    Ok(())
}

fn missing_capability(action: Action) -> &'static str {
    match action {
        Action::View => "role may not view agreements",
        Action::Create => "role may not create agreements",
        Action::Edit => "role may not edit agreements",
        Action::Delete => "role may not delete agreements",
        Action::Sign => "role may not sign agreements",
        Action::Approve => "role may not approve agreements",
        Action::Reject => "role may not reject agreements",
        Action::Cancel => "role may not cancel agreements",
        Action::SendForSignature => "role may not send agreements for signature",
    }
}

fn record_state_gate(
    user: &UserContext,
    action: Action,
    agreement: &Agreement,
    signature_type: Option<SignatureType>,
) -> Result<(), Denial> {
    let result = match action {
        Action::View | Action::Create => Ok(()),
        Action::Edit => lifecycle::ensure_editable(agreement),
        Action::Delete => lifecycle::ensure_deletable(agreement),
        Action::Sign => match signature_type {
            Some(signature_type) => {
                lifecycle::ensure_signable(agreement, signature_type, user.subject_id)
            }
            None => lifecycle::ensure_signing_open(agreement),
        },
        Action::Approve => lifecycle::ensure_approvable(agreement),
        Action::Reject => lifecycle::ensure_rejectable(agreement),
        Action::Cancel => lifecycle::ensure_cancellable(agreement),
        Action::SendForSignature => lifecycle::ensure_sendable(agreement),
    };
    result.map_err(Denial::from)
}

fn record_identity_gate(
    permissions: &RolePermissions,
    user: &UserContext,
    action: Action,
    agreement: &Agreement,
) -> Result<(), Denial> {
    if !can_access_record(permissions.view, user, agreement) {
        return Err(Denial::identity("agreement is outside the caller's access scope"));
    }
    if action == Action::Edit && permissions.edit_requires_unsigned && agreement.has_any_signature()
    {
        return Err(Denial::identity(
            "role may not edit an agreement that already carries signatures",
        ));
    }
    Ok(())
}

fn signature_identity_gate(
    user: &UserContext,
    agreement: &Agreement,
    signature_type: SignatureType,
) -> Result<(), Denial> {
    let caller = Some(user.subject_id);

    match signature_type {
        SignatureType::Tenant if resolve_party(agreement, PartyRole::Tenant) != caller => {
            Err(Denial::identity("only the tenant of this agreement can sign as tenant"))
        }
        SignatureType::Owner if resolve_party(agreement, PartyRole::Owner) != caller => {
            Err(Denial::identity("only the owner of this agreement can sign as owner"))
        }
        SignatureType::Agency
            if user.agency_id.is_none() || resolve_agency(agreement) != user.agency_id =>
        {
            Err(Denial::identity("only the agreement's agency can sign as agency"))
        }
        SignatureType::Broker
            if agreement.property.as_ref().and_then(|p| p.broker_id) != caller =>
        {
            Err(Denial::identity("only the broker of the property can sign as broker"))
        }
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorize::DenialKind;
    use crate::Role;
    use chrono::Utc;
    use leasehold_agreements::{AgreementStatus, LifecycleError, PropertyLink, Signature};
    use leasehold_core::{AgencyId, AgreementId, PropertyId, UserId};
    use proptest::prelude::*;

    const AGENCY: u64 = 5;
    const CREATOR: u64 = 10;
    const TENANT: u64 = 20;
    const OWNER: u64 = 30;
    const BROKER: u64 = 7;

    fn service() -> PermissionService {
        PermissionService::new(Arc::new(PermissionCatalog::standard()))
    }

    fn user(id: u64, role: Role) -> UserContext {
        UserContext::new(UserId::new(id)).with_role(role)
    }

    fn agency_user(id: u64, role: Role) -> UserContext {
        user(id, role).with_agency(AgencyId::new(AGENCY))
    }

    fn agreement() -> Agreement {
        let mut agreement = Agreement::draft(AgreementId::new(1), UserId::new(CREATOR), Utc::now());
        agreement.agency_id = Some(AgencyId::new(AGENCY));
        agreement.tenant_id = Some(UserId::new(TENANT));
        agreement.owner_id = Some(UserId::new(OWNER));
        agreement
    }

    fn sign(agreement: &mut Agreement, signer: u64, signature_type: SignatureType) {
        let signature = Some(Signature {
            signer: UserId::new(signer),
            signature_type,
            signed_at: Utc::now(),
        });
        match signature_type.slot() {
            leasehold_agreements::SignatureSlot::Tenant => agreement.tenant_signature = signature,
            leasehold_agreements::SignatureSlot::Owner => agreement.owner_signature = signature,
            leasehold_agreements::SignatureSlot::Agency => agreement.agency_signature = signature,
            leasehold_agreements::SignatureSlot::Witness => {
                agreement.witness_signatures.extend(signature)
            }
        }
    }

    fn denial_kind(decision: &Decision) -> Option<DenialKind> {
        decision.denial().map(|d| d.kind)
    }

    #[test]
    fn missing_or_unknown_role_is_denied_everything() {
        let service = service();
        let record = agreement();

        for role in [None, Some(Role::new("")), Some(Role::new("JANITOR"))] {
            let caller = UserContext {
                role: role.clone(),
                ..UserContext::new(UserId::new(CREATOR))
            };
            for action in Action::ALL {
                let decision = service.authorize(&caller, action, Some(&record), Some(SignatureType::Witness));
                let denial = decision.denial().expect("denied");
                assert_eq!(denial.kind, DenialKind::Role);
                assert_eq!(denial.reason, "role has no access to agreements");
            }
        }
    }

    #[test]
    fn create_never_consults_the_record() {
        let service = service();
        let broker = user(BROKER, Role::BROKER);
        let foreign = Agreement::draft(AgreementId::new(2), UserId::new(99), Utc::now());

        assert!(service.authorize(&broker, Action::Create, Some(&foreign), None).is_allowed());
        assert!(service.authorize(&broker, Action::Create, None, None).is_allowed());
        assert_eq!(
            denial_kind(&service.authorize(&user(TENANT, Role::TENANT), Action::Create, None, None)),
            Some(DenialKind::Role)
        );
    }

    #[test]
    fn capability_check_without_record_runs_role_gate_only() {
        let service = service();
        let manager = agency_user(11, Role::AGENCY_MANAGER);

        assert!(service.authorize(&manager, Action::Edit, None, None).is_allowed());
        assert_eq!(
            denial_kind(&service.authorize(&manager, Action::Delete, None, None)),
            Some(DenialKind::Role)
        );
    }

    #[test]
    fn sign_requires_a_signature_type() {
        let service = service();
        let tenant = user(TENANT, Role::TENANT);

        let decision = service.authorize(&tenant, Action::Sign, Some(&agreement()), None);
        assert_eq!(
            decision.denial().map(|d| d.reason.as_ref()),
            Some("a signature type is required to sign")
        );
    }

    #[test]
    fn broker_signature_needs_credential() {
        let service = service();
        let mut record = agreement();
        let mut property = PropertyLink::new(PropertyId::new(3));
        property.broker_id = Some(UserId::new(BROKER));
        record.property = Some(property);

        let without = user(BROKER, Role::BROKER);
        let decision = service.authorize(&without, Action::Sign, Some(&record), Some(SignatureType::Broker));
        assert_eq!(denial_kind(&decision), Some(DenialKind::Role));

        let with = without.with_credential("CRECI-1234");
        assert!(service
            .authorize(&with, Action::Sign, Some(&record), Some(SignatureType::Broker))
            .is_allowed());
    }

    #[test]
    fn signature_identity_is_checked_per_type() {
        let service = service();
        let record = agreement();

        let tenant = user(TENANT, Role::TENANT);
        assert!(service
            .authorize(&tenant, Action::Sign, Some(&record), Some(SignatureType::Tenant))
            .is_allowed());

        // Same role, a different person that is still party to the record.
        let other = user(OWNER, Role::TENANT);
        let decision = service.authorize(&other, Action::Sign, Some(&record), Some(SignatureType::Tenant));
        assert_eq!(denial_kind(&decision), Some(DenialKind::Identity));

        let foreign_manager = user(11, Role::AGENCY_MANAGER).with_agency(AgencyId::new(6));
        let decision =
            service.authorize(&foreign_manager, Action::Sign, Some(&record), Some(SignatureType::Agency));
        assert_eq!(denial_kind(&decision), Some(DenialKind::Identity));

        let manager = agency_user(11, Role::AGENCY_MANAGER);
        assert!(service
            .authorize(&manager, Action::Sign, Some(&record), Some(SignatureType::Agency))
            .is_allowed());
    }

    #[test]
    fn signing_filled_slot_is_a_lifecycle_denial() {
        let service = service();
        let mut record = agreement();
        sign(&mut record, TENANT, SignatureType::Tenant);
        record.status = AgreementStatus::AwaitingSignature;

        let decision = service.authorize(
            &user(TENANT, Role::TENANT),
            Action::Sign,
            Some(&record),
            Some(SignatureType::Tenant),
        );
        assert_eq!(denial_kind(&decision), Some(DenialKind::Lifecycle));
    }

    #[test]
    fn broker_scope_extends_to_brokered_properties() {
        let service = service();
        let broker = user(BROKER, Role::BROKER).with_credential("CRECI-1234");

        let mut own = agreement();
        own.created_by = UserId::new(BROKER);
        assert!(service.authorize(&broker, Action::View, Some(&own), None).is_allowed());

        let mut brokered = agreement();
        assert_eq!(
            denial_kind(&service.authorize(&broker, Action::View, Some(&brokered), None)),
            Some(DenialKind::Identity)
        );

        let mut property = PropertyLink::new(PropertyId::new(3));
        property.broker_id = Some(UserId::new(BROKER));
        brokered.property = Some(property);
        assert!(service.authorize(&broker, Action::View, Some(&brokered), None).is_allowed());
        assert!(service.authorize(&broker, Action::Edit, Some(&brokered), None).is_allowed());

        let filter = service.build_access_filter(&broker);
        assert!(filter.matches(&own));
        assert!(filter.matches(&brokered));
        assert!(!filter.matches(&agreement()));
    }

    #[test]
    fn agency_manager_cannot_edit_signed_agreement() {
        let service = service();
        let manager = agency_user(11, Role::AGENCY_MANAGER);
        let admin = agency_user(12, Role::AGENCY_ADMIN);

        let mut record = agreement();
        assert!(service.authorize(&manager, Action::Edit, Some(&record), None).is_allowed());

        sign(&mut record, OWNER, SignatureType::Owner);
        record.status = AgreementStatus::AwaitingSignature;

        let decision = service.authorize(&manager, Action::Edit, Some(&record), None);
        assert_eq!(denial_kind(&decision), Some(DenialKind::Identity));
        assert!(service.authorize(&admin, Action::Edit, Some(&record), None).is_allowed());
    }

    #[test]
    fn delete_refused_once_any_signature_exists() {
        let service = service();
        let owner = user(CREATOR, Role::INDEPENDENT_OWNER);

        let mut record = agreement();
        assert!(service.authorize(&owner, Action::Delete, Some(&record), None).is_allowed());

        record.witness_signatures.push(Signature {
            signer: UserId::new(77),
            signature_type: SignatureType::Witness,
            signed_at: Utc::now(),
        });
        assert_eq!(record.status, AgreementStatus::Draft);

        let decision = service.authorize(&owner, Action::Delete, Some(&record), None);
        let denial = decision.denial().expect("denied");
        assert_eq!(denial.kind, DenialKind::Lifecycle);
        assert_eq!(denial.reason, LifecycleError::HasSignatures.public_reason());

        let explanation = service.explain(&owner, Action::Delete, Some(&record), None);
        assert_eq!(
            explanation.gates.last().and_then(|g| g.detail.clone()),
            Some(LifecycleError::HasSignatures.to_string().into())
        );

        record.status = AgreementStatus::AwaitingSignature;
        let explanation = service.explain(&owner, Action::Delete, Some(&record), None);
        assert_eq!(
            explanation.gates.last().and_then(|g| g.detail.clone()),
            Some(LifecycleError::NotDeletable(AgreementStatus::AwaitingSignature).to_string().into())
        );
    }

    #[test]
    fn lifecycle_denials_hide_a_foreign_record_state() {
        let service = service();
        let stranger = user(99, Role::TENANT);

        let mut record = agreement();
        record.status = AgreementStatus::Completed;

        let decision = service.authorize(
            &stranger,
            Action::Sign,
            Some(&record),
            Some(SignatureType::Tenant),
        );
        let denial = decision.denial().expect("denied");
        assert_eq!(denial.kind, DenialKind::Lifecycle);
        let reason = denial.reason.to_ascii_uppercase();
        for status in AgreementStatus::ALL {
            assert!(!reason.contains(status.as_str()), "{reason}");
        }

        let mut signed_slot = agreement();
        sign(&mut signed_slot, TENANT, SignatureType::Tenant);
        signed_slot.status = AgreementStatus::AwaitingSignature;
        let decision = service.authorize(
            &stranger,
            Action::Sign,
            Some(&signed_slot),
            Some(SignatureType::Tenant),
        );
        assert_eq!(
            decision.denial().map(|d| d.reason.as_ref()),
            Some("this signature slot is not available")
        );
    }

    #[test]
    fn second_broker_needs_the_property_link_to_edit() {
        let service = service();
        let first = user(BROKER, Role::BROKER).with_credential("CRECI-1234");
        let second = user(BROKER + 1, Role::BROKER).with_credential("CRECI-5678");

        let mut record = agreement();
        record.created_by = UserId::new(BROKER);

        assert!(service.authorize(&first, Action::Edit, Some(&record), None).is_allowed());
        assert_eq!(
            denial_kind(&service.authorize(&second, Action::Edit, Some(&record), None)),
            Some(DenialKind::Identity)
        );

        let mut property = PropertyLink::new(PropertyId::new(3));
        property.broker_id = Some(UserId::new(BROKER + 1));
        record.property = Some(property);
        assert!(service.authorize(&second, Action::Edit, Some(&record), None).is_allowed());
        assert!(service.authorize(&first, Action::Edit, Some(&record), None).is_allowed());
    }

    #[test]
    fn terminal_records_only_remain_viewable() {
        let service = service();
        let admin = user(1, Role::PLATFORM_ADMIN);

        for status in [AgreementStatus::Completed, AgreementStatus::Rejected] {
            let mut record = agreement();
            record.status = status;

            let actions = service.available_actions(&admin, &record);
            assert_eq!(actions, BTreeSet::from([Action::View]));
        }
    }

    #[test]
    fn available_actions_for_tenant_on_draft() {
        let service = service();
        let actions = service.available_actions(&user(TENANT, Role::TENANT), &agreement());
        assert_eq!(actions, BTreeSet::from([Action::View, Action::Sign]));

        let stranger = service.available_actions(&user(99, Role::TENANT), &agreement());
        assert!(stranger.is_empty());
    }

    #[test]
    fn explanation_lists_evaluated_gates() {
        let service = service();
        let manager = agency_user(11, Role::AGENCY_MANAGER);
        let mut record = agreement();
        sign(&mut record, OWNER, SignatureType::Owner);
        record.status = AgreementStatus::AwaitingSignature;

        let explanation = service.explain(&manager, Action::Edit, Some(&record), None);
        assert!(!explanation.granted);
        let gates: Vec<(Gate, bool)> = explanation.gates.iter().map(|g| (g.gate, g.passed)).collect();
        assert_eq!(
            gates,
            vec![(Gate::Role, true), (Gate::RecordState, true), (Gate::RecordIdentity, false)]
        );
        assert_eq!(
            explanation.decision,
            service.authorize(&manager, Action::Edit, Some(&record), None)
        );
    }

    fn status_strategy() -> impl Strategy<Value = AgreementStatus> {
        prop::sample::select(AgreementStatus::ALL.to_vec())
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(
            PermissionCatalog::standard()
                .entries()
                .map(|(role, _)| role.clone())
                .collect::<Vec<_>>(),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn available_actions_is_idempotent(
            role in role_strategy(),
            subject in prop::sample::select(vec![CREATOR, TENANT, OWNER, BROKER, 99]),
            status in status_strategy(),
            tenant_signed in any::<bool>(),
        ) {
            let service = service();
            let caller = agency_user(subject, role).with_credential("CRECI-1234");
            let mut record = agreement();
            record.status = status;
            if tenant_signed {
                sign(&mut record, TENANT, SignatureType::Tenant);
            }

            let first = service.available_actions(&caller, &record);
            let second = service.available_actions(&caller, &record);
            prop_assert_eq!(&first, &second);

            for action in &first {
                if *action != Action::Sign {
                    prop_assert!(service.authorize(&caller, *action, Some(&record), None).is_allowed());
                }
            }
        }
    }
}
