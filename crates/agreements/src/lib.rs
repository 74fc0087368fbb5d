//! Agreement domain module.
//!
//! This crate contains the agreement record, party resolution and the
//! signature/approval state machine, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod agreement;
pub mod lifecycle;
pub mod parties;

pub use agreement::{
    Agreement, AgreementCancelled, AgreementCommand, AgreementCreated, AgreementEdited,
    AgreementEvent, AgreementRejected, AgreementApproved, AgreementSigned, AgreementStatus,
    ApproveAgreement, CancelAgreement, ContractLink, CreateAgreement, EditAgreement, PropertyLink,
    RejectAgreement, SendForSignature, SentForSignature, SignAgreement, Signature, SignatureSlot,
    SignatureType, Stamp, StatusAdvanced,
};
pub use lifecycle::{LifecycleAction, LifecycleError};
pub use parties::{PartyRole, resolve_agency, resolve_party};
