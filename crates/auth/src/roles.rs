use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried by a user session.
///
/// Roles are opaque strings at this layer; what a role may do is decided
/// solely by the [`PermissionCatalog`](crate::PermissionCatalog). Names not in
/// the catalog are valid values that simply grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const PLATFORM_ADMIN: Role = Role::from_static("PLATFORM_ADMIN");
    pub const AGENCY_ADMIN: Role = Role::from_static("AGENCY_ADMIN");
    pub const AGENCY_MANAGER: Role = Role::from_static("AGENCY_MANAGER");
    pub const BROKER: Role = Role::from_static("BROKER");
    pub const PROPERTY_OWNER: Role = Role::from_static("PROPERTY_OWNER");
    pub const INDEPENDENT_OWNER: Role = Role::from_static("INDEPENDENT_OWNER");
    pub const TENANT: Role = Role::from_static("TENANT");
    pub const BUILDING_MANAGER: Role = Role::from_static("BUILDING_MANAGER");
    pub const LEGAL_AUDITOR: Role = Role::from_static("LEGAL_AUDITOR");
    pub const API_CLIENT: Role = Role::from_static("API_CLIENT");
    pub const PLATFORM_REPRESENTATIVE: Role = Role::from_static("PLATFORM_REPRESENTATIVE");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
