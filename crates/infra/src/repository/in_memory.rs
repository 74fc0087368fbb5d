use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, warn};

use leasehold_agreements::{Agreement, AgreementCommand, AgreementEvent, lifecycle};
use leasehold_auth::AccessFilter;
use leasehold_core::{Aggregate, AgreementId, ExpectedVersion};

use super::r#trait::{AgreementRepository, RepositoryError};

#[derive(Debug, Clone)]
struct Row {
    agreement: Agreement,
    history: Vec<AgreementEvent>,
}

/// In-memory agreement repository.
///
/// Intended for tests/dev. Not optimized for performance. The lock is never
/// held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryAgreementRepository {
    rows: RwLock<HashMap<AgreementId, Row>>,
}

impl InMemoryAgreementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> RepositoryError {
        RepositoryError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait]
impl AgreementRepository for InMemoryAgreementRepository {
    async fn load(&self, id: AgreementId) -> Result<Option<Agreement>, RepositoryError> {
        let rows = self.rows.read().map_err(Self::poisoned)?;
        Ok(rows.get(&id).map(|row| row.agreement.clone()))
    }

    async fn insert(&self, agreement: Agreement) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        if rows.contains_key(&agreement.id) {
            return Err(RepositoryError::AlreadyExists(agreement.id));
        }

        debug!(agreement_id = agreement.id.get(), "agreement inserted");
        rows.insert(
            agreement.id,
            Row {
                agreement,
                history: Vec::new(),
            },
        );
        Ok(())
    }

    async fn execute(
        &self,
        id: AgreementId,
        expected_version: ExpectedVersion,
        command: AgreementCommand,
    ) -> Result<Agreement, RepositoryError> {
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        let row = rows.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;

        let actual = row.agreement.version;
        expected_version.check(actual).map_err(|err| {
            warn!(agreement_id = id.get(), ?expected_version, actual, "stale agreement write");
            RepositoryError::Conflict(err.to_string())
        })?;

        // Re-runs the lifecycle precondition against the current state.
        let events = row.agreement.execute(&command).map_err(|err| {
            warn!(agreement_id = id.get(), error = %err, "conditional agreement write rejected");
            RepositoryError::from(err)
        })?;
        row.history.extend(events);

        debug!(
            agreement_id = id.get(),
            version = row.agreement.version,
            status = %row.agreement.status,
            "agreement updated"
        );
        Ok(row.agreement.clone())
    }

    async fn delete(
        &self,
        id: AgreementId,
        expected_version: ExpectedVersion,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        let row = rows.get(&id).ok_or(RepositoryError::NotFound(id))?;

        let actual = row.agreement.version;
        expected_version.check(actual).map_err(|err| {
            warn!(agreement_id = id.get(), ?expected_version, actual, "stale agreement delete");
            RepositoryError::Conflict(err.to_string())
        })?;
        lifecycle::ensure_deletable(&row.agreement).map_err(|err| {
            warn!(agreement_id = id.get(), error = %err, "conditional agreement delete rejected");
            RepositoryError::from(err)
        })?;

        rows.remove(&id);
        debug!(agreement_id = id.get(), "agreement deleted");
        Ok(())
    }

    async fn list(&self, filter: &AccessFilter) -> Result<Vec<Agreement>, RepositoryError> {
        let rows = self.rows.read().map_err(Self::poisoned)?;
        let mut matching: Vec<Agreement> = rows
            .values()
            .filter(|row| filter.matches(&row.agreement))
            .map(|row| row.agreement.clone())
            .collect();
        matching.sort_by_key(|a| a.id);
        Ok(matching)
    }

    async fn history(&self, id: AgreementId) -> Result<Vec<AgreementEvent>, RepositoryError> {
        let rows = self.rows.read().map_err(Self::poisoned)?;
        rows.get(&id)
            .map(|row| row.history.clone())
            .ok_or(RepositoryError::NotFound(id))
    }
}
