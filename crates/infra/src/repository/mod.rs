//! Agreement persistence boundary.
//!
//! The engine consumes storage only through [`AgreementRepository`]; the
//! in-memory implementation backs tests and local development.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryAgreementRepository;
pub use r#trait::{AgreementRepository, RepositoryError};
