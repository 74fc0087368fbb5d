//! Agreement state machine: legal mutation windows and the transition graph.
//!
//! Every predicate here is pure and inspects only the agreement snapshot. The
//! same predicates back both the authorization layer (is this action legal
//! right now?) and [`Agreement::handle`] (re-checked at write time).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use leasehold_core::UserId;

use crate::agreement::{Agreement, AgreementStatus, SignatureSlot, SignatureType};

/// Invalid-state errors raised by the agreement lifecycle.
///
/// These are expected outcomes (retrying a completed action, acting in the
/// wrong stage), not unexpected failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("agreement can only be edited while in draft or awaiting signature (current status: {0})")]
    NotEditable(AgreementStatus),

    #[error("only draft agreements can be deleted (current status: {0})")]
    NotDeletable(AgreementStatus),

    #[error("agreement already carries a signature and can no longer be deleted")]
    HasSignatures,

    #[error("agreement cannot be signed in its current status ({0})")]
    NotSignable(AgreementStatus),

    #[error("the {0} signature has already been collected")]
    SlotAlreadySigned(SignatureSlot),

    #[error("this witness has already signed the agreement")]
    AlreadyWitnessed,

    #[error("only draft agreements can be sent for signature (current status: {0})")]
    NotSendable(AgreementStatus),

    #[error("agreement is {0} and can no longer be approved")]
    NotApprovable(AgreementStatus),

    #[error("agreement is {0} and can no longer be rejected")]
    NotRejectable(AgreementStatus),

    #[error("agreement is {0} and can no longer be cancelled")]
    NotCancellable(AgreementStatus),

    #[error("agreement has already been cancelled")]
    AlreadyCancelled,

    #[error("the {0} party has already signed and cannot be replaced")]
    PartyAlreadySigned(SignatureSlot),

    #[error("a rejection reason is required")]
    ReasonRequired,

    #[error("agreement already exists")]
    AlreadyExists,

    #[error("agreement has not been created")]
    NotCreated,
}

impl LifecycleError {
    /// Reason safe to show any caller: names the forbidden window, never the
    /// record's status or which slots are filled. `Display` keeps the detail
    /// for audit trails.
    pub fn public_reason(&self) -> &'static str {
        match self {
            LifecycleError::NotEditable(_) => "agreement is not open for editing",
            LifecycleError::NotDeletable(_) | LifecycleError::HasSignatures => {
                "only unsigned drafts can be deleted"
            }
            LifecycleError::NotSignable(_) => "agreement is not open for signing",
            LifecycleError::SlotAlreadySigned(_) => "this signature slot is not available",
            LifecycleError::AlreadyWitnessed => "caller has already witnessed this agreement",
            LifecycleError::NotSendable(_) => "agreement cannot be sent for signature",
            LifecycleError::NotApprovable(_) => "approval is no longer possible",
            LifecycleError::NotRejectable(_) => "rejection is no longer possible",
            LifecycleError::NotCancellable(_) | LifecycleError::AlreadyCancelled => {
                "cancellation is no longer possible"
            }
            LifecycleError::PartyAlreadySigned(_) => "a party that has signed cannot be replaced",
            LifecycleError::ReasonRequired => "a rejection reason is required",
            LifecycleError::AlreadyExists => "agreement already exists",
            LifecycleError::NotCreated => "agreement does not exist",
        }
    }
}

/// Lifecycle-relevant mutations (the transition labels of the state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleAction {
    Edit,
    Delete,
    Sign,
    SendForSignature,
    Approve,
    Reject,
    Cancel,
}

pub fn ensure_editable(agreement: &Agreement) -> Result<(), LifecycleError> {
    match agreement.status {
        AgreementStatus::Draft | AgreementStatus::AwaitingSignature => Ok(()),
        status => Err(LifecycleError::NotEditable(status)),
    }
}

/// A party whose slot is filled cannot be swapped for someone else.
pub fn ensure_parties_replaceable(
    agreement: &Agreement,
    tenant_id: Option<UserId>,
    owner_id: Option<UserId>,
) -> Result<(), LifecycleError> {
    let replaces = |new: Option<UserId>, current: Option<UserId>| new.is_some() && new != current;

    if agreement.tenant_signature.is_some() && replaces(tenant_id, agreement.tenant_id) {
        return Err(LifecycleError::PartyAlreadySigned(SignatureSlot::Tenant));
    }
    if agreement.owner_signature.is_some() && replaces(owner_id, agreement.owner_id) {
        return Err(LifecycleError::PartyAlreadySigned(SignatureSlot::Owner));
    }
    Ok(())
}

/// Drafts without any collected signature are the only deletable records.
pub fn ensure_deletable(agreement: &Agreement) -> Result<(), LifecycleError> {
    if agreement.status != AgreementStatus::Draft {
        return Err(LifecycleError::NotDeletable(agreement.status));
    }
    if agreement.has_any_signature() {
        return Err(LifecycleError::HasSignatures);
    }
    Ok(())
}

/// Status allows signing at all (independent of which slot is targeted).
pub fn ensure_signing_open(agreement: &Agreement) -> Result<(), LifecycleError> {
    match agreement.status {
        AgreementStatus::Draft | AgreementStatus::AwaitingSignature => Ok(()),
        status => Err(LifecycleError::NotSignable(status)),
    }
}

pub fn ensure_signable(
    agreement: &Agreement,
    signature_type: SignatureType,
    signer: UserId,
) -> Result<(), LifecycleError> {
    ensure_signing_open(agreement)?;

    match signature_type.slot() {
        SignatureSlot::Witness => {
            if agreement.witness_signatures.iter().any(|s| s.signer == signer) {
                return Err(LifecycleError::AlreadyWitnessed);
            }
        }
        slot => {
            if agreement.signature(slot).is_some() {
                return Err(LifecycleError::SlotAlreadySigned(slot));
            }
        }
    }
    Ok(())
}

pub fn ensure_sendable(agreement: &Agreement) -> Result<(), LifecycleError> {
    if agreement.status == AgreementStatus::Draft {
        Ok(())
    } else {
        Err(LifecycleError::NotSendable(agreement.status))
    }
}

pub fn ensure_approvable(agreement: &Agreement) -> Result<(), LifecycleError> {
    match agreement.status {
        AgreementStatus::Completed | AgreementStatus::Rejected => {
            Err(LifecycleError::NotApprovable(agreement.status))
        }
        _ => Ok(()),
    }
}

pub fn ensure_rejectable(agreement: &Agreement) -> Result<(), LifecycleError> {
    if agreement.status.is_terminal() {
        Err(LifecycleError::NotRejectable(agreement.status))
    } else {
        Ok(())
    }
}

pub fn ensure_cancellable(agreement: &Agreement) -> Result<(), LifecycleError> {
    match agreement.status {
        AgreementStatus::Cancelled => Err(LifecycleError::AlreadyCancelled),
        status if status.is_terminal() => Err(LifecycleError::NotCancellable(status)),
        _ => Ok(()),
    }
}

/// The transition graph: every `(action, resulting status)` legal from `status`.
///
/// `Edit` is a self-loop. `Sign` lists every status a signature can lead to;
/// which one applies depends on the slots already filled.
pub fn transitions_from(status: AgreementStatus) -> &'static [(LifecycleAction, AgreementStatus)] {
    use AgreementStatus::*;
    use LifecycleAction as A;

    match status {
        Draft => &[
            (A::Edit, Draft),
            (A::Delete, Draft),
            (A::Sign, AwaitingSignature),
            (A::Sign, Signed),
            (A::SendForSignature, AwaitingSignature),
            (A::Approve, Completed),
            (A::Reject, Rejected),
            (A::Cancel, Cancelled),
        ],
        AwaitingSignature => &[
            (A::Edit, AwaitingSignature),
            (A::Sign, AwaitingSignature),
            (A::Sign, Signed),
            (A::Approve, Completed),
            (A::Reject, Rejected),
            (A::Cancel, Cancelled),
        ],
        Signed => &[
            (A::Approve, Completed),
            (A::Reject, Rejected),
            (A::Cancel, Cancelled),
        ],
        // Approval of a cancelled record is not excluded by the approval rule.
        Cancelled => &[(A::Approve, Completed), (A::Reject, Rejected)],
        Completed | Rejected => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::{
        AgreementCommand, ApproveAgreement, CancelAgreement, EditAgreement, RejectAgreement,
        SendForSignature, SignAgreement, Signature,
    };
    use chrono::{DateTime, Utc};
    use leasehold_core::{Aggregate, AgreementId};
    use proptest::prelude::*;

    fn at() -> DateTime<Utc> {
        Utc::now()
    }

    fn draft() -> Agreement {
        Agreement::draft(AgreementId::new(1), UserId::new(10), at())
    }

    fn with_status(status: AgreementStatus) -> Agreement {
        let mut agreement = draft();
        agreement.status = status;
        agreement
    }

    fn signature(signer: u64, signature_type: SignatureType) -> Signature {
        Signature {
            signer: UserId::new(signer),
            signature_type,
            signed_at: at(),
        }
    }

    #[test]
    fn editable_only_before_signed() {
        assert!(ensure_editable(&with_status(AgreementStatus::Draft)).is_ok());
        assert!(ensure_editable(&with_status(AgreementStatus::AwaitingSignature)).is_ok());
        for status in [
            AgreementStatus::Signed,
            AgreementStatus::Completed,
            AgreementStatus::Rejected,
            AgreementStatus::Cancelled,
        ] {
            assert_eq!(
                ensure_editable(&with_status(status)),
                Err(LifecycleError::NotEditable(status))
            );
        }
    }

    #[test]
    fn signed_draft_cannot_be_deleted() {
        let mut agreement = draft();
        assert!(ensure_deletable(&agreement).is_ok());

        agreement.owner_signature = Some(signature(30, SignatureType::Owner));
        assert_eq!(agreement.status, AgreementStatus::Draft);
        assert_eq!(ensure_deletable(&agreement), Err(LifecycleError::HasSignatures));

        let awaiting = with_status(AgreementStatus::AwaitingSignature);
        assert_eq!(
            ensure_deletable(&awaiting),
            Err(LifecycleError::NotDeletable(AgreementStatus::AwaitingSignature))
        );
    }

    #[test]
    fn witness_signature_blocks_delete() {
        let mut agreement = draft();
        agreement.witness_signatures.push(signature(77, SignatureType::Witness));
        assert_eq!(ensure_deletable(&agreement), Err(LifecycleError::HasSignatures));
    }

    #[test]
    fn same_witness_cannot_sign_twice() {
        let mut agreement = draft();
        agreement.witness_signatures.push(signature(77, SignatureType::Witness));

        assert_eq!(
            ensure_signable(&agreement, SignatureType::Witness, UserId::new(77)),
            Err(LifecycleError::AlreadyWitnessed)
        );
        assert!(ensure_signable(&agreement, SignatureType::Witness, UserId::new(78)).is_ok());
    }

    #[test]
    fn broker_and_agency_share_the_agency_slot() {
        let mut agreement = with_status(AgreementStatus::AwaitingSignature);
        agreement.agency_signature = Some(signature(40, SignatureType::Agency));

        assert_eq!(
            ensure_signable(&agreement, SignatureType::Broker, UserId::new(41)),
            Err(LifecycleError::SlotAlreadySigned(SignatureSlot::Agency))
        );
    }

    #[test]
    fn reject_and_approve_on_terminal_states_fail() {
        for status in [AgreementStatus::Completed, AgreementStatus::Rejected] {
            let agreement = with_status(status);
            assert!(ensure_approvable(&agreement).is_err());
            assert!(ensure_rejectable(&agreement).is_err());
            assert!(ensure_cancellable(&agreement).is_err());
            assert!(ensure_editable(&agreement).is_err());
            assert!(ensure_signing_open(&agreement).is_err());
        }
    }

    #[test]
    fn cancelling_twice_is_an_invalid_state() {
        assert_eq!(
            ensure_cancellable(&with_status(AgreementStatus::Cancelled)),
            Err(LifecycleError::AlreadyCancelled)
        );
    }

    #[test]
    fn send_for_signature_only_from_draft() {
        assert!(ensure_sendable(&draft()).is_ok());
        assert_eq!(
            ensure_sendable(&with_status(AgreementStatus::AwaitingSignature)),
            Err(LifecycleError::NotSendable(AgreementStatus::AwaitingSignature))
        );
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        assert!(transitions_from(AgreementStatus::Completed).is_empty());
        assert!(transitions_from(AgreementStatus::Rejected).is_empty());
    }

    #[test]
    fn signed_parties_cannot_be_replaced() {
        let mut agreement = draft();
        agreement.tenant_id = Some(UserId::new(20));
        agreement.owner_id = Some(UserId::new(30));
        assert!(ensure_parties_replaceable(&agreement, Some(UserId::new(21)), None).is_ok());

        agreement.tenant_signature = Some(Signature {
            signer: UserId::new(20),
            signature_type: SignatureType::Tenant,
            signed_at: at(),
        });
        assert_eq!(
            ensure_parties_replaceable(&agreement, Some(UserId::new(21)), None),
            Err(LifecycleError::PartyAlreadySigned(SignatureSlot::Tenant))
        );
        // Restating the same party or touching the unsigned side is fine.
        assert!(ensure_parties_replaceable(&agreement, Some(UserId::new(20)), None).is_ok());
        assert!(ensure_parties_replaceable(&agreement, None, Some(UserId::new(31))).is_ok());
    }

    #[test]
    fn public_reasons_never_name_the_status() {
        let errors = [
            LifecycleError::NotSignable(AgreementStatus::Completed),
            LifecycleError::NotEditable(AgreementStatus::Cancelled),
            LifecycleError::NotApprovable(AgreementStatus::Rejected),
            LifecycleError::SlotAlreadySigned(SignatureSlot::Tenant),
            LifecycleError::NotRejectable(AgreementStatus::Completed),
            LifecycleError::AlreadyCancelled,
        ];
        for error in errors {
            let reason = error.public_reason().to_ascii_uppercase();
            for status in AgreementStatus::ALL {
                assert!(!reason.contains(status.as_str()), "{error:?}: {reason}");
            }
            assert!(!reason.contains("TENANT"), "{error:?}: {reason}");
        }
        assert_eq!(
            LifecycleError::AlreadyCancelled.public_reason(),
            LifecycleError::NotCancellable(AgreementStatus::Completed).public_reason()
        );
    }

    fn command_strategy() -> impl Strategy<Value = AgreementCommand> {
        let signer = 1u64..6;
        prop_oneof![
            Just(AgreementCommand::Edit(EditAgreement {
                edited_by: UserId::new(10),
                title: Some("edited".to_string()),
                tenant_id: None,
                owner_id: None,
                occurred_at: DateTime::<Utc>::UNIX_EPOCH,
            })),
            Just(AgreementCommand::SendForSignature(SendForSignature {
                sent_by: UserId::new(10),
                occurred_at: DateTime::<Utc>::UNIX_EPOCH,
            })),
            (signer, prop::sample::select(SignatureType::ALL.to_vec())).prop_map(
                |(signer, signature_type)| AgreementCommand::Sign(SignAgreement {
                    signer: UserId::new(signer),
                    signature_type,
                    occurred_at: DateTime::<Utc>::UNIX_EPOCH,
                })
            ),
            Just(AgreementCommand::Approve(ApproveAgreement {
                approver: UserId::new(1),
                occurred_at: DateTime::<Utc>::UNIX_EPOCH,
            })),
            prop::sample::select(vec!["", "price disagreement"]).prop_map(|reason| {
                AgreementCommand::Reject(RejectAgreement {
                    rejected_by: UserId::new(1),
                    reason: reason.to_string(),
                    occurred_at: DateTime::<Utc>::UNIX_EPOCH,
                })
            }),
            Just(AgreementCommand::Cancel(CancelAgreement {
                cancelled_by: UserId::new(1),
                occurred_at: DateTime::<Utc>::UNIX_EPOCH,
            })),
        ]
    }

    fn action_of(command: &AgreementCommand) -> Option<LifecycleAction> {
        match command {
            AgreementCommand::Create(_) => None,
            AgreementCommand::Edit(_) => Some(LifecycleAction::Edit),
            AgreementCommand::SendForSignature(_) => Some(LifecycleAction::SendForSignature),
            AgreementCommand::Sign(_) => Some(LifecycleAction::Sign),
            AgreementCommand::Approve(_) => Some(LifecycleAction::Approve),
            AgreementCommand::Reject(_) => Some(LifecycleAction::Reject),
            AgreementCommand::Cancel(_) => Some(LifecycleAction::Cancel),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: any command sequence only walks edges of the transition graph,
        /// and nothing ever leaves a terminal status.
        #[test]
        fn commands_only_follow_declared_transitions(
            commands in prop::collection::vec(command_strategy(), 1..24)
        ) {
            let mut agreement = draft();

            for command in commands {
                let before = agreement.status;
                let result = agreement.execute(&command);

                if before.is_terminal() {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(agreement.status, before);
                    continue;
                }

                if result.is_ok() {
                    let action = action_of(&command).unwrap();
                    let after = agreement.status;
                    prop_assert!(
                        transitions_from(before).contains(&(action, after)),
                        "undeclared transition {:?} --{:?}--> {:?}", before, action, after
                    );
                } else {
                    prop_assert_eq!(agreement.status, before);
                }
            }
        }
    }
}
