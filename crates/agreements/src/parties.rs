//! Effective party resolution.
//!
//! An agreement may name its tenant/owner/agency directly, or only through the
//! linked property or rental contract. Resolution uses a fixed precedence:
//! agreement field, then property field, then contract field.

use serde::{Deserialize, Serialize};

use leasehold_core::{AgencyId, UserId};

use crate::agreement::Agreement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyRole {
    Tenant,
    Owner,
}

/// Resolve the effective tenant or owner of an agreement.
pub fn resolve_party(agreement: &Agreement, role: PartyRole) -> Option<UserId> {
    let property = agreement.property.as_ref();
    let contract = agreement.contract.as_ref();

    match role {
        PartyRole::Tenant => agreement
            .tenant_id
            .or_else(|| property.and_then(|p| p.tenant_id))
            .or_else(|| contract.and_then(|c| c.tenant_id)),
        PartyRole::Owner => agreement
            .owner_id
            .or_else(|| property.and_then(|p| p.owner_id))
            .or_else(|| contract.and_then(|c| c.owner_id)),
    }
}

/// Resolve the effective agency of an agreement.
pub fn resolve_agency(agreement: &Agreement) -> Option<AgencyId> {
    agreement
        .agency_id
        .or_else(|| agreement.property.as_ref().and_then(|p| p.agency_id))
        .or_else(|| agreement.contract.as_ref().and_then(|c| c.agency_id))
}
