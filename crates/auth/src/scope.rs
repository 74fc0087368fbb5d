//! Access scope resolution.
//!
//! Turns a role's [`AccessScope`] into either a predicate over one loaded
//! agreement or an [`AccessFilter`] for bulk listing. Both forms always agree.

use leasehold_agreements::Agreement;

use crate::filter::{AccessFilter, FilterField};
use crate::permissions::AccessScope;
use crate::{Role, UserContext};

/// Whether `user` may see `agreement` under `scope`.
pub fn can_access_record(scope: AccessScope, user: &UserContext, agreement: &Agreement) -> bool {
    let caller = user.subject_id;

    match scope {
        AccessScope::All => true,
        AccessScope::Agency => match user.agency_id {
            Some(agency) => agreement.agency_id == Some(agency),
            None => agreement.created_by == caller,
        },
        AccessScope::OwnCreated => {
            agreement.created_by == caller
                || (user.has_role(&Role::BROKER)
                    && agreement.property.as_ref().and_then(|p| p.broker_id) == Some(caller))
        }
        AccessScope::PartyTo => {
            let property = agreement.property.as_ref();
            let contract = agreement.contract.as_ref();
            [
                agreement.tenant_id,
                agreement.owner_id,
                property.and_then(|p| p.owner_id),
                property.and_then(|p| p.tenant_id),
                contract.and_then(|c| c.tenant_id),
                contract.and_then(|c| c.owner_id),
            ]
            .into_iter()
            .any(|party| party == Some(caller))
        }
        AccessScope::None => false,
    }
}

/// Filter selecting exactly the records [`can_access_record`] accepts.
pub fn build_list_filter(scope: AccessScope, user: &UserContext) -> AccessFilter {
    let caller = user.subject_id.get();

    match scope {
        AccessScope::All => AccessFilter::MatchAll,
        AccessScope::Agency => match user.agency_id {
            Some(agency) => AccessFilter::Eq(FilterField::AgencyId, agency.get()),
            None => AccessFilter::Eq(FilterField::CreatedBy, caller),
        },
        AccessScope::OwnCreated => {
            let own = AccessFilter::Eq(FilterField::CreatedBy, caller);
            if user.has_role(&Role::BROKER) {
                AccessFilter::AnyOf(vec![
                    own,
                    AccessFilter::Eq(FilterField::PropertyBrokerId, caller),
                ])
            } else {
                own
            }
        }
        AccessScope::PartyTo => AccessFilter::AnyOf(
            [
                FilterField::TenantId,
                FilterField::OwnerId,
                FilterField::PropertyOwnerId,
                FilterField::PropertyTenantId,
                FilterField::ContractTenantId,
                FilterField::ContractOwnerId,
            ]
            .into_iter()
            .map(|field| AccessFilter::Eq(field, caller))
            .collect(),
        ),
        AccessScope::None => AccessFilter::MatchNone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leasehold_agreements::{ContractLink, PropertyLink};
    use leasehold_core::{AgencyId, AgreementId, ContractId, PropertyId, UserId};
    use proptest::prelude::*;

    fn agreement(created_by: u64) -> Agreement {
        Agreement::draft(AgreementId::new(1), UserId::new(created_by), Utc::now())
    }

    #[test]
    fn agency_scope_without_agency_falls_back_to_creator() {
        let user = UserContext::new(UserId::new(10)).with_role(Role::AGENCY_MANAGER);

        let mut own = agreement(10);
        own.agency_id = Some(AgencyId::new(5));
        assert!(can_access_record(AccessScope::Agency, &user, &own));
        assert!(!can_access_record(AccessScope::Agency, &user, &agreement(11)));
        assert_eq!(
            build_list_filter(AccessScope::Agency, &user),
            AccessFilter::Eq(FilterField::CreatedBy, 10)
        );
    }

    #[test]
    fn agency_scope_compares_the_agreement_agency() {
        let user = UserContext::new(UserId::new(10))
            .with_role(Role::AGENCY_ADMIN)
            .with_agency(AgencyId::new(5));

        let mut record = agreement(99);
        record.agency_id = Some(AgencyId::new(5));
        assert!(can_access_record(AccessScope::Agency, &user, &record));

        // The property's agency is not consulted for visibility.
        record.agency_id = None;
        let mut property = PropertyLink::new(PropertyId::new(1));
        property.agency_id = Some(AgencyId::new(5));
        record.property = Some(property);
        assert!(!can_access_record(AccessScope::Agency, &user, &record));
    }

    #[test]
    fn broker_sees_brokered_properties() {
        let broker = UserContext::new(UserId::new(7)).with_role(Role::BROKER);
        let owner = UserContext::new(UserId::new(7)).with_role(Role::INDEPENDENT_OWNER);

        let mut record = agreement(99);
        let mut property = PropertyLink::new(PropertyId::new(1));
        property.broker_id = Some(UserId::new(7));
        record.property = Some(property);

        assert!(can_access_record(AccessScope::OwnCreated, &broker, &record));
        assert!(!can_access_record(AccessScope::OwnCreated, &owner, &record));
    }

    #[test]
    fn party_to_reaches_through_contract() {
        let tenant = UserContext::new(UserId::new(22)).with_role(Role::TENANT);
        let mut record = agreement(99);
        assert!(!can_access_record(AccessScope::PartyTo, &tenant, &record));

        let mut contract = ContractLink::new(ContractId::new(1));
        contract.tenant_id = Some(UserId::new(22));
        record.contract = Some(contract);
        assert!(can_access_record(AccessScope::PartyTo, &tenant, &record));
    }

    #[test]
    fn none_scope_matches_nothing() {
        let user = UserContext::new(UserId::new(99));
        assert!(!can_access_record(AccessScope::None, &user, &agreement(99)));
        assert_eq!(build_list_filter(AccessScope::None, &user), AccessFilter::MatchNone);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Property: filter and predicate agree
    // ─────────────────────────────────────────────────────────────────────────

    // A small id space so that collisions (matches) are frequent.
    fn small_id() -> impl Strategy<Value = u64> {
        1u64..5
    }

    fn maybe_user() -> impl Strategy<Value = Option<UserId>> {
        proptest::option::of(small_id().prop_map(UserId::new))
    }

    fn maybe_agency() -> impl Strategy<Value = Option<AgencyId>> {
        proptest::option::of(small_id().prop_map(AgencyId::new))
    }

    fn property_strategy() -> impl Strategy<Value = Option<PropertyLink>> {
        proptest::option::of((maybe_user(), maybe_agency(), maybe_user(), maybe_user()).prop_map(
            |(owner_id, agency_id, broker_id, tenant_id)| PropertyLink {
                id: PropertyId::new(1),
                owner_id,
                agency_id,
                broker_id,
                tenant_id,
            },
        ))
    }

    fn contract_strategy() -> impl Strategy<Value = Option<ContractLink>> {
        proptest::option::of((maybe_user(), maybe_user(), maybe_agency()).prop_map(
            |(tenant_id, owner_id, agency_id)| ContractLink {
                id: ContractId::new(1),
                tenant_id,
                owner_id,
                agency_id,
            },
        ))
    }

    fn agreement_strategy() -> impl Strategy<Value = Agreement> {
        (
            small_id(),
            maybe_agency(),
            maybe_user(),
            maybe_user(),
            property_strategy(),
            contract_strategy(),
        )
            .prop_map(|(created_by, agency_id, tenant_id, owner_id, property, contract)| {
                let mut record = agreement(created_by);
                record.agency_id = agency_id;
                record.tenant_id = tenant_id;
                record.owner_id = owner_id;
                record.property = property;
                record.contract = contract;
                record
            })
    }

    fn role_strategy() -> impl Strategy<Value = Option<Role>> {
        proptest::option::of(prop::sample::select(vec![
            Role::BROKER,
            Role::TENANT,
            Role::AGENCY_ADMIN,
            Role::INDEPENDENT_OWNER,
            Role::new("UNKNOWN"),
        ]))
    }

    fn user_strategy() -> impl Strategy<Value = UserContext> {
        (small_id(), role_strategy(), maybe_agency()).prop_map(|(subject, role, agency_id)| {
            UserContext {
                subject_id: UserId::new(subject),
                role,
                agency_id,
                broker_id: None,
                professional_credential_id: None,
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 1024,
            ..ProptestConfig::default()
        })]

        #[test]
        fn list_filter_agrees_with_record_predicate(
            scope in prop::sample::select(AccessScope::ALL_SCOPES.to_vec()),
            user in user_strategy(),
            record in agreement_strategy(),
        ) {
            let filter = build_list_filter(scope, &user);
            prop_assert_eq!(filter.matches(&record), can_access_record(scope, &user, &record));
        }
    }
}
