//! Engine wiring: catalog → permission service → guard and authorizer.

use std::sync::Arc;

use tracing::info;

use leasehold_auth::{PermissionCatalog, PermissionService};
use leasehold_infra::AgreementRepository;

use crate::authorizer::AgreementAuthorizer;
use crate::config::EngineConfig;
use crate::guard::AuthorizationGuard;
use crate::registry::OperationRegistry;

/// Assembled engine. Cheap to clone; every component is shared.
#[derive(Clone)]
pub struct Engine {
    pub config: EngineConfig,
    pub registry: Arc<OperationRegistry>,
    pub service: Arc<PermissionService>,
    pub guard: AuthorizationGuard,
    pub authorizer: AgreementAuthorizer,
    pub repository: Arc<dyn AgreementRepository>,
}

/// Build the engine over the standard catalog and operation table.
pub fn build_engine(config: EngineConfig, repository: Arc<dyn AgreementRepository>) -> Engine {
    build_engine_with(
        config,
        PermissionCatalog::standard(),
        OperationRegistry::standard(),
        repository,
    )
}

pub fn build_engine_with(
    config: EngineConfig,
    catalog: PermissionCatalog,
    registry: OperationRegistry,
    repository: Arc<dyn AgreementRepository>,
) -> Engine {
    let service = Arc::new(PermissionService::new(Arc::new(catalog)));
    let registry = Arc::new(registry);

    let guard = AuthorizationGuard::new(
        registry.clone(),
        service.clone(),
        repository.clone(),
        config.strict_signature_type,
    );
    let authorizer = AgreementAuthorizer::new(service.clone(), repository.clone());

    info!(
        roles = service.catalog().entries().count(),
        operations = registry.operations().count(),
        strict_signature_type = config.strict_signature_type,
        "agreement engine assembled"
    );

    Engine {
        config,
        registry,
        service,
        guard,
        authorizer,
        repository,
    }
}
