//! `leasehold-auth`: agreement authorization engine.
//!
//! Role permission catalog, access-scope resolution, and the permission
//! service deciding every agreement action. Pure: no IO, no HTTP, no storage.

pub mod authorize;
pub mod catalog;
pub mod claims;
pub mod filter;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod scope;
pub mod service;

pub use authorize::{
    AuthorizationExplanation, Decision, Denial, DenialKind, Gate, GateReport,
};
pub use catalog::{PermissionCatalog, RoleDefinition};
pub use claims::{ClaimsError, SessionClaims, validate_claims};
pub use filter::{AccessFilter, FilterField};
pub use permissions::{AccessScope, Action, RolePermissions};
pub use principal::UserContext;
pub use roles::Role;
pub use scope::{build_list_filter, can_access_record};
pub use service::PermissionService;
