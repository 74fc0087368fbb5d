//! Access filter expressions for bulk queries.
//!
//! An [`AccessFilter`] is the list-query counterpart of the per-record scope
//! predicate. It can be evaluated in memory ([`AccessFilter::matches`]) or
//! rendered as a JSON where-clause for a query collaborator
//! ([`AccessFilter::to_query`]).

use serde::Serialize;
use serde_json::{Map, Value, json};

use leasehold_agreements::Agreement;

/// Identity field of an agreement (or its linked records) a filter can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    CreatedBy,
    AgencyId,
    TenantId,
    OwnerId,
    PropertyOwnerId,
    PropertyTenantId,
    PropertyBrokerId,
    ContractTenantId,
    ContractOwnerId,
}

impl FilterField {
    /// Raw value of this field on `agreement`; `None` when the field (or the linked record) is absent.
    pub fn value(&self, agreement: &Agreement) -> Option<u64> {
        let property = agreement.property.as_ref();
        let contract = agreement.contract.as_ref();

        match self {
            FilterField::CreatedBy => Some(agreement.created_by.get()),
            FilterField::AgencyId => agreement.agency_id.map(|id| id.get()),
            FilterField::TenantId => agreement.tenant_id.map(|id| id.get()),
            FilterField::OwnerId => agreement.owner_id.map(|id| id.get()),
            FilterField::PropertyOwnerId => property.and_then(|p| p.owner_id).map(|id| id.get()),
            FilterField::PropertyTenantId => property.and_then(|p| p.tenant_id).map(|id| id.get()),
            FilterField::PropertyBrokerId => property.and_then(|p| p.broker_id).map(|id| id.get()),
            FilterField::ContractTenantId => contract.and_then(|c| c.tenant_id).map(|id| id.get()),
            FilterField::ContractOwnerId => contract.and_then(|c| c.owner_id).map(|id| id.get()),
        }
    }

    /// `(relation, column)` path of the field in the query document.
    fn path(&self) -> (Option<&'static str>, &'static str) {
        match self {
            FilterField::CreatedBy => (None, "createdBy"),
            FilterField::AgencyId => (None, "agencyId"),
            FilterField::TenantId => (None, "tenantId"),
            FilterField::OwnerId => (None, "ownerId"),
            FilterField::PropertyOwnerId => (Some("property"), "ownerId"),
            FilterField::PropertyTenantId => (Some("property"), "tenantId"),
            FilterField::PropertyBrokerId => (Some("property"), "brokerId"),
            FilterField::ContractTenantId => (Some("contract"), "tenantId"),
            FilterField::ContractOwnerId => (Some("contract"), "ownerId"),
        }
    }
}

/// Filter expression over agreements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AccessFilter {
    MatchAll,
    MatchNone,
    Eq(FilterField, u64),
    AnyOf(Vec<AccessFilter>),
}

impl AccessFilter {
    /// Evaluate against a loaded record. Absent fields never match.
    pub fn matches(&self, agreement: &Agreement) -> bool {
        match self {
            AccessFilter::MatchAll => true,
            AccessFilter::MatchNone => false,
            AccessFilter::Eq(field, expected) => field.value(agreement) == Some(*expected),
            AccessFilter::AnyOf(filters) => filters.iter().any(|f| f.matches(agreement)),
        }
    }

    /// Render as a JSON where-clause. Identifiers are rendered as decimal strings.
    pub fn to_query(&self) -> Value {
        match self {
            AccessFilter::MatchAll => Value::Object(Map::new()),
            AccessFilter::MatchNone => json!({ "id": { "in": [] } }),
            AccessFilter::Eq(field, value) => {
                let (relation, column) = field.path();
                let mut leaf = Map::new();
                leaf.insert(column.to_string(), Value::String(value.to_string()));

                match relation {
                    Some(relation) => {
                        let mut nested = Map::new();
                        nested.insert(relation.to_string(), Value::Object(leaf));
                        Value::Object(nested)
                    }
                    None => Value::Object(leaf),
                }
            }
            AccessFilter::AnyOf(filters) => {
                json!({ "OR": filters.iter().map(AccessFilter::to_query).collect::<Vec<_>>() })
            }
        }
    }
}
