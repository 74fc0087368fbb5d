//! Infrastructure layer: agreement persistence adapters.

pub mod repository;


pub use repository::{AgreementRepository, InMemoryAgreementRepository, RepositoryError};
