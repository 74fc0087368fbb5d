//! Role permission catalog.
//!
//! The single source of truth for what each role may do. Built once per
//! process and shared behind an `Arc`; lookups are total and never fail.

use std::collections::BTreeMap;

use serde::Serialize;

use leasehold_agreements::SignatureType;

use crate::permissions::{AccessScope, Action, RolePermissions};
use crate::roles::Role;

const FULL: RolePermissions = RolePermissions {
    view: AccessScope::All,
    create: true,
    edit: true,
    delete: true,
    approve: true,
    reject: true,
    cancel: true,
    send_for_signature: true,
    signature_types: &[],
    requires_credential: false,
    edit_requires_unsigned: false,
};

/// Immutable mapping role → [`RolePermissions`].
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    entries: BTreeMap<Role, RolePermissions>,
}

impl PermissionCatalog {
    /// Build a catalog from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (Role, RolePermissions)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The platform's standard permission matrix.
    pub fn standard() -> Self {
        let none = RolePermissions::NO_ACCESS;

        Self::from_entries([
            (Role::PLATFORM_ADMIN, FULL),
            (
                Role::AGENCY_ADMIN,
                RolePermissions {
                    view: AccessScope::Agency,
                    signature_types: &[SignatureType::Agency, SignatureType::Witness],
                    ..FULL
                },
            ),
            (
                Role::AGENCY_MANAGER,
                RolePermissions {
                    view: AccessScope::Agency,
                    create: true,
                    edit: true,
                    cancel: true,
                    send_for_signature: true,
                    signature_types: &[SignatureType::Agency],
                    edit_requires_unsigned: true,
                    ..none
                },
            ),
            (
                Role::BROKER,
                RolePermissions {
                    view: AccessScope::OwnCreated,
                    create: true,
                    edit: true,
                    delete: true,
                    cancel: true,
                    send_for_signature: true,
                    signature_types: &[SignatureType::Broker, SignatureType::Witness],
                    requires_credential: true,
                    ..none
                },
            ),
            (
                Role::PROPERTY_OWNER,
                RolePermissions {
                    view: AccessScope::PartyTo,
                    reject: true,
                    signature_types: &[SignatureType::Owner],
                    ..none
                },
            ),
            (
                Role::INDEPENDENT_OWNER,
                RolePermissions {
                    view: AccessScope::OwnCreated,
                    signature_types: &[SignatureType::Owner],
                    ..FULL
                },
            ),
            (
                Role::TENANT,
                RolePermissions {
                    view: AccessScope::PartyTo,
                    signature_types: &[SignatureType::Tenant],
                    ..none
                },
            ),
            (Role::BUILDING_MANAGER, none),
            (
                Role::LEGAL_AUDITOR,
                RolePermissions {
                    view: AccessScope::All,
                    ..none
                },
            ),
            (
                Role::API_CLIENT,
                RolePermissions {
                    view: AccessScope::Agency,
                    ..none
                },
            ),
            (
                Role::PLATFORM_REPRESENTATIVE,
                RolePermissions {
                    view: AccessScope::All,
                    approve: true,
                    reject: true,
                    cancel: true,
                    signature_types: &[SignatureType::Witness],
                    ..none
                },
            ),
        ])
    }

    /// Permissions of `role`; unknown, empty or missing roles get [`RolePermissions::NO_ACCESS`].
    pub fn get(&self, role: Option<&Role>) -> &RolePermissions {
        role.and_then(|r| self.entries.get(r))
            .unwrap_or(&RolePermissions::NO_ACCESS)
    }

    /// All entries, sorted by role name.
    pub fn entries(&self) -> impl Iterator<Item = (&Role, &RolePermissions)> {
        self.entries.iter()
    }

    /// Audit/debug view of a known role.
    pub fn describe(&self, role: &Role) -> Option<RoleDefinition> {
        let permissions = self.entries.get(role)?;
        Some(RoleDefinition {
            name: role.as_str().to_string(),
            description: role_description(role.as_str()),
            view: permissions.view,
            capabilities: permissions.capabilities(),
            signature_types: permissions.signature_types.to_vec(),
            requires_credential: permissions.requires_credential,
        })
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Role definition with its granted capabilities (for audit/display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: String,
    pub description: Option<String>,
    pub view: AccessScope,
    pub capabilities: Vec<Action>,
    pub signature_types: Vec<SignatureType>,
    pub requires_credential: bool,
}

fn role_description(role: &str) -> Option<String> {
    let text = match role {
        "PLATFORM_ADMIN" => "Platform administrator with unrestricted agreement access",
        "AGENCY_ADMIN" => "Agency administrator managing all agreements of the agency",
        "AGENCY_MANAGER" => "Agency staff preparing agreements and signing for the agency",
        "BROKER" => "Licensed broker managing their own and brokered agreements",
        "PROPERTY_OWNER" => "Owner represented by an agency; signs and may reject",
        "INDEPENDENT_OWNER" => "Self-managing owner with full control over their agreements",
        "TENANT" => "Tenant party; may view and sign agreements naming them",
        "BUILDING_MANAGER" => "Building operations staff without agreement access",
        "LEGAL_AUDITOR" => "Read-only access to every agreement for audits",
        "API_CLIENT" => "Read-only integration scoped to one agency",
        "PLATFORM_REPRESENTATIVE" => "Platform staff arbitrating approvals and witnessing",
        _ => return None,
    };
    Some(text.to_string())
}
