//! Request boundary for the agreement engine: operation registry, request
//! context, authorization guard, and engine wiring.

pub mod authorizer;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod registry;
pub mod signature;

pub use authorizer::{AgreementAuthorizer, AuthorizationResponse};
pub use config::EngineConfig;
pub use context::{RequestContext, RequestId};
pub use engine::{Engine, build_engine, build_engine_with};
pub use guard::{AuthorizationGuard, GuardError, GuardOutcome, GuardRequest};
pub use registry::{OperationPolicy, OperationRegistry};
pub use signature::{SignatureRequest, SignatureResolutionError};
