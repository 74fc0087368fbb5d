use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use leasehold_agreements::{Agreement, AgreementCommand, AgreementEvent, LifecycleError};
use leasehold_auth::AccessFilter;
use leasehold_core::{AgreementId, ExpectedVersion};

/// Agreement repository operation error.
///
/// These are **infrastructure errors** (missing rows, stale writes, storage
/// failures) plus the lifecycle errors re-detected at write time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("agreement {0} not found")]
    NotFound(AgreementId),

    #[error("agreement {0} already exists")]
    AlreadyExists(AgreementId),

    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// The record changed since it was authorized and the write is no longer legal.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Persistence collaborator for agreements.
///
/// ## Conditional writes
///
/// Authorization runs against a snapshot, so it is necessary but not
/// sufficient. Every mutation re-checks, under the same write lock (or
/// transaction) that performs it:
///
/// - the optimistic version expectation, and
/// - the lifecycle precondition of the command (by re-running the aggregate's
///   `handle` against the current state).
///
/// A write whose precondition no longer holds fails instead of trusting the
/// earlier decision.
#[async_trait]
pub trait AgreementRepository: Send + Sync {
    /// Load the current state of an agreement, `None` if it does not exist.
    async fn load(&self, id: AgreementId) -> Result<Option<Agreement>, RepositoryError>;

    /// Store a newly created agreement.
    async fn insert(&self, agreement: Agreement) -> Result<(), RepositoryError>;

    /// Apply `command` to the stored agreement as one conditional write.
    async fn execute(
        &self,
        id: AgreementId,
        expected_version: ExpectedVersion,
        command: AgreementCommand,
    ) -> Result<Agreement, RepositoryError>;

    /// Remove an agreement, re-checking that it is still deletable.
    async fn delete(&self, id: AgreementId, expected_version: ExpectedVersion)
    -> Result<(), RepositoryError>;

    /// Every agreement matching `filter`, ordered by id.
    async fn list(&self, filter: &AccessFilter) -> Result<Vec<Agreement>, RepositoryError>;

    /// Events committed for an agreement, oldest first.
    async fn history(&self, id: AgreementId) -> Result<Vec<AgreementEvent>, RepositoryError>;
}

#[async_trait]
impl<R> AgreementRepository for Arc<R>
where
    R: AgreementRepository + ?Sized,
{
    async fn load(&self, id: AgreementId) -> Result<Option<Agreement>, RepositoryError> {
        (**self).load(id).await
    }

    async fn insert(&self, agreement: Agreement) -> Result<(), RepositoryError> {
        (**self).insert(agreement).await
    }

    async fn execute(
        &self,
        id: AgreementId,
        expected_version: ExpectedVersion,
        command: AgreementCommand,
    ) -> Result<Agreement, RepositoryError> {
        (**self).execute(id, expected_version, command).await
    }

    async fn delete(
        &self,
        id: AgreementId,
        expected_version: ExpectedVersion,
    ) -> Result<(), RepositoryError> {
        (**self).delete(id, expected_version).await
    }

    async fn list(&self, filter: &AccessFilter) -> Result<Vec<Agreement>, RepositoryError> {
        (**self).list(filter).await
    }

    async fn history(&self, id: AgreementId) -> Result<Vec<AgreementEvent>, RepositoryError> {
        (**self).history(id).await
    }
}
