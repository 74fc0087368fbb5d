use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leasehold_core::{
    Aggregate, AggregateRoot, AgencyId, AgreementId, ContractId, PropertyId, UserId,
};

use crate::lifecycle::{self, LifecycleError};

// ─────────────────────────────────────────────────────────────────────────────
// Status & signatures
// ─────────────────────────────────────────────────────────────────────────────

/// Agreement status lifecycle.
///
/// `DRAFT → AWAITING_SIGNATURE → SIGNED → COMPLETED`, with `REJECTED` and
/// `CANCELLED` as side branches. `COMPLETED` and `REJECTED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgreementStatus {
    Draft,
    AwaitingSignature,
    Signed,
    Completed,
    Rejected,
    Cancelled,
}

impl AgreementStatus {
    pub const ALL: [AgreementStatus; 6] = [
        AgreementStatus::Draft,
        AgreementStatus::AwaitingSignature,
        AgreementStatus::Signed,
        AgreementStatus::Completed,
        AgreementStatus::Rejected,
        AgreementStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementStatus::Draft => "DRAFT",
            AgreementStatus::AwaitingSignature => "AWAITING_SIGNATURE",
            AgreementStatus::Signed => "SIGNED",
            AgreementStatus::Completed => "COMPLETED",
            AgreementStatus::Rejected => "REJECTED",
            AgreementStatus::Cancelled => "CANCELLED",
        }
    }

    /// No transition of any kind leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgreementStatus::Completed | AgreementStatus::Rejected)
    }
}

impl core::fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of signature a signer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureType {
    Tenant,
    Owner,
    Agency,
    Broker,
    Witness,
}

impl SignatureType {
    pub const ALL: [SignatureType; 5] = [
        SignatureType::Tenant,
        SignatureType::Owner,
        SignatureType::Agency,
        SignatureType::Broker,
        SignatureType::Witness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureType::Tenant => "TENANT",
            SignatureType::Owner => "OWNER",
            SignatureType::Agency => "AGENCY",
            SignatureType::Broker => "BROKER",
            SignatureType::Witness => "WITNESS",
        }
    }

    /// Where a signature of this type is recorded on the agreement.
    ///
    /// Brokers sign on the agency side.
    pub fn slot(&self) -> SignatureSlot {
        match self {
            SignatureType::Tenant => SignatureSlot::Tenant,
            SignatureType::Owner => SignatureSlot::Owner,
            SignatureType::Agency | SignatureType::Broker => SignatureSlot::Agency,
            SignatureType::Witness => SignatureSlot::Witness,
        }
    }
}

impl core::fmt::Display for SignatureType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage location of a collected signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureSlot {
    Tenant,
    Owner,
    Agency,
    Witness,
}

impl core::fmt::Display for SignatureSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SignatureSlot::Tenant => f.write_str("tenant"),
            SignatureSlot::Owner => f.write_str("owner"),
            SignatureSlot::Agency => f.write_str("agency"),
            SignatureSlot::Witness => f.write_str("witness"),
        }
    }
}

/// A collected signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signer: UserId,
    pub signature_type: SignatureType,
    pub signed_at: DateTime<Utc>,
}

/// Who did something, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub by: UserId,
    pub at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Linked records (identity fields only)
// ─────────────────────────────────────────────────────────────────────────────

/// Identity fields of the property an agreement refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLink {
    pub id: PropertyId,
    pub owner_id: Option<UserId>,
    pub agency_id: Option<AgencyId>,
    pub broker_id: Option<UserId>,
    pub tenant_id: Option<UserId>,
}

impl PropertyLink {
    pub fn new(id: PropertyId) -> Self {
        Self {
            id,
            owner_id: None,
            agency_id: None,
            broker_id: None,
            tenant_id: None,
        }
    }
}

/// Identity fields of the rental contract an agreement refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractLink {
    pub id: ContractId,
    pub tenant_id: Option<UserId>,
    pub owner_id: Option<UserId>,
    pub agency_id: Option<AgencyId>,
}

impl ContractLink {
    pub fn new(id: ContractId) -> Self {
        Self {
            id,
            tenant_id: None,
            owner_id: None,
            agency_id: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate
// ─────────────────────────────────────────────────────────────────────────────

/// Aggregate root: Agreement.
///
/// Fields are public because the record is also the snapshot handed to the
/// authorization layer; state changes that must respect the lifecycle go
/// through [`Aggregate::handle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub version: u64,
    pub title: String,
    pub status: AgreementStatus,
    pub created_by: UserId,
    pub agency_id: Option<AgencyId>,
    pub tenant_id: Option<UserId>,
    pub owner_id: Option<UserId>,
    pub property: Option<PropertyLink>,
    pub contract: Option<ContractLink>,
    pub tenant_signature: Option<Signature>,
    pub owner_signature: Option<Signature>,
    pub agency_signature: Option<Signature>,
    pub witness_signatures: Vec<Signature>,
    pub approval: Option<Stamp>,
    pub rejection: Option<Stamp>,
    pub rejection_reason: Option<String>,
    pub cancellation: Option<Stamp>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    created: bool,
}

impl Agreement {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: AgreementId) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id,
            version: 0,
            title: String::new(),
            status: AgreementStatus::Draft,
            created_by: UserId::new(0),
            agency_id: None,
            tenant_id: None,
            owner_id: None,
            property: None,
            contract: None,
            tenant_signature: None,
            owner_signature: None,
            agency_signature: None,
            witness_signatures: Vec::new(),
            approval: None,
            rejection: None,
            rejection_reason: None,
            cancellation: None,
            created_at: epoch,
            updated_at: epoch,
            created: false,
        }
    }

    /// Rehydrate a created draft directly (e.g. from a read model row).
    pub fn draft(id: AgreementId, created_by: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            created_by,
            created_at,
            updated_at: created_at,
            created: true,
            ..Self::empty(id)
        }
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Signature held by a single-signer slot.
    ///
    /// Witnesses are many; `Witness` always yields `None`, read
    /// [`Agreement::witness_signatures`] instead.
    pub fn signature(&self, slot: SignatureSlot) -> Option<&Signature> {
        match slot {
            SignatureSlot::Tenant => self.tenant_signature.as_ref(),
            SignatureSlot::Owner => self.owner_signature.as_ref(),
            SignatureSlot::Agency => self.agency_signature.as_ref(),
            SignatureSlot::Witness => None,
        }
    }

    /// Whether any signature (slot or witness) has been collected.
    pub fn has_any_signature(&self) -> bool {
        self.tenant_signature.is_some()
            || self.owner_signature.is_some()
            || self.agency_signature.is_some()
            || !self.witness_signatures.is_empty()
    }

    /// Tenant side and agency side are both signed.
    pub fn is_fully_signed(&self) -> bool {
        self.tenant_signature.is_some() && self.agency_signature.is_some()
    }
}

impl AggregateRoot for Agreement {
    type Id = AgreementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command: CreateAgreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAgreement {
    pub agreement_id: AgreementId,
    pub title: String,
    pub created_by: UserId,
    pub agency_id: Option<AgencyId>,
    pub tenant_id: Option<UserId>,
    pub owner_id: Option<UserId>,
    pub property: Option<PropertyLink>,
    pub contract: Option<ContractLink>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EditAgreement. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAgreement {
    pub edited_by: UserId,
    pub title: Option<String>,
    pub tenant_id: Option<UserId>,
    pub owner_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SendForSignature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendForSignature {
    pub sent_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SignAgreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAgreement {
    pub signer: UserId,
    pub signature_type: SignatureType,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveAgreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveAgreement {
    pub approver: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectAgreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectAgreement {
    pub rejected_by: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelAgreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAgreement {
    pub cancelled_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementCommand {
    Create(CreateAgreement),
    Edit(EditAgreement),
    SendForSignature(SendForSignature),
    Sign(SignAgreement),
    Approve(ApproveAgreement),
    Reject(RejectAgreement),
    Cancel(CancelAgreement),
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementCreated {
    pub agreement_id: AgreementId,
    pub title: String,
    pub created_by: UserId,
    pub agency_id: Option<AgencyId>,
    pub tenant_id: Option<UserId>,
    pub owner_id: Option<UserId>,
    pub property: Option<PropertyLink>,
    pub contract: Option<ContractLink>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementEdited {
    pub edited_by: UserId,
    pub title: Option<String>,
    pub tenant_id: Option<UserId>,
    pub owner_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentForSignature {
    pub sent_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementSigned {
    pub signature: Signature,
}

/// Emitted when collecting a signature moves the agreement forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAdvanced {
    pub from: AgreementStatus,
    pub to: AgreementStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementApproved {
    pub approver: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementRejected {
    pub rejected_by: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementCancelled {
    pub cancelled_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementEvent {
    Created(AgreementCreated),
    Edited(AgreementEdited),
    SentForSignature(SentForSignature),
    Signed(AgreementSigned),
    StatusAdvanced(StatusAdvanced),
    Approved(AgreementApproved),
    Rejected(AgreementRejected),
    Cancelled(AgreementCancelled),
}

impl AgreementEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AgreementEvent::Created(_) => "agreements.agreement.created",
            AgreementEvent::Edited(_) => "agreements.agreement.edited",
            AgreementEvent::SentForSignature(_) => "agreements.agreement.sent_for_signature",
            AgreementEvent::Signed(_) => "agreements.agreement.signed",
            AgreementEvent::StatusAdvanced(_) => "agreements.agreement.status_advanced",
            AgreementEvent::Approved(_) => "agreements.agreement.approved",
            AgreementEvent::Rejected(_) => "agreements.agreement.rejected",
            AgreementEvent::Cancelled(_) => "agreements.agreement.cancelled",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AgreementEvent::Created(e) => e.occurred_at,
            AgreementEvent::Edited(e) => e.occurred_at,
            AgreementEvent::SentForSignature(e) => e.occurred_at,
            AgreementEvent::Signed(e) => e.signature.signed_at,
            AgreementEvent::StatusAdvanced(e) => e.occurred_at,
            AgreementEvent::Approved(e) => e.occurred_at,
            AgreementEvent::Rejected(e) => e.occurred_at,
            AgreementEvent::Cancelled(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate Implementation
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for Agreement {
    type Command = AgreementCommand;
    type Event = AgreementEvent;
    type Error = LifecycleError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AgreementEvent::Created(e) => {
                self.id = e.agreement_id;
                self.title = e.title.clone();
                self.status = AgreementStatus::Draft;
                self.created_by = e.created_by;
                self.agency_id = e.agency_id;
                self.tenant_id = e.tenant_id;
                self.owner_id = e.owner_id;
                self.property = e.property.clone();
                self.contract = e.contract.clone();
                self.created_at = e.occurred_at;
                self.created = true;
            }
            AgreementEvent::Edited(e) => {
                if let Some(title) = &e.title {
                    self.title = title.clone();
                }
                if e.tenant_id.is_some() {
                    self.tenant_id = e.tenant_id;
                }
                if e.owner_id.is_some() {
                    self.owner_id = e.owner_id;
                }
            }
            AgreementEvent::SentForSignature(_) => {
                self.status = AgreementStatus::AwaitingSignature;
            }
            AgreementEvent::Signed(e) => {
                let signature = e.signature.clone();
                match signature.signature_type.slot() {
                    SignatureSlot::Tenant => self.tenant_signature = Some(signature),
                    SignatureSlot::Owner => self.owner_signature = Some(signature),
                    SignatureSlot::Agency => self.agency_signature = Some(signature),
                    SignatureSlot::Witness => self.witness_signatures.push(signature),
                }
            }
            AgreementEvent::StatusAdvanced(e) => {
                self.status = e.to;
            }
            AgreementEvent::Approved(e) => {
                self.status = AgreementStatus::Completed;
                self.approval = Some(Stamp {
                    by: e.approver,
                    at: e.occurred_at,
                });
            }
            AgreementEvent::Rejected(e) => {
                self.status = AgreementStatus::Rejected;
                self.rejection = Some(Stamp {
                    by: e.rejected_by,
                    at: e.occurred_at,
                });
                self.rejection_reason = Some(e.reason.clone());
            }
            AgreementEvent::Cancelled(e) => {
                self.status = AgreementStatus::Cancelled;
                self.cancellation = Some(Stamp {
                    by: e.cancelled_by,
                    at: e.occurred_at,
                });
            }
        }

        self.updated_at = event.occurred_at();
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if let AgreementCommand::Create(cmd) = command {
            return self.handle_create(cmd);
        }
        if !self.created {
            return Err(LifecycleError::NotCreated);
        }

        match command {
            AgreementCommand::Create(_) => Err(LifecycleError::AlreadyExists),
            AgreementCommand::Edit(cmd) => self.handle_edit(cmd),
            AgreementCommand::SendForSignature(cmd) => self.handle_send(cmd),
            AgreementCommand::Sign(cmd) => self.handle_sign(cmd),
            AgreementCommand::Approve(cmd) => self.handle_approve(cmd),
            AgreementCommand::Reject(cmd) => self.handle_reject(cmd),
            AgreementCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Agreement {
    fn handle_create(&self, cmd: &CreateAgreement) -> Result<Vec<AgreementEvent>, LifecycleError> {
        if self.created {
            return Err(LifecycleError::AlreadyExists);
        }

        Ok(vec![AgreementEvent::Created(AgreementCreated {
            agreement_id: cmd.agreement_id,
            title: cmd.title.trim().to_string(),
            created_by: cmd.created_by,
            agency_id: cmd.agency_id,
            tenant_id: cmd.tenant_id,
            owner_id: cmd.owner_id,
            property: cmd.property.clone(),
            contract: cmd.contract.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_edit(&self, cmd: &EditAgreement) -> Result<Vec<AgreementEvent>, LifecycleError> {
        lifecycle::ensure_editable(self)?;
        lifecycle::ensure_parties_replaceable(self, cmd.tenant_id, cmd.owner_id)?;

        Ok(vec![AgreementEvent::Edited(AgreementEdited {
            edited_by: cmd.edited_by,
            title: cmd.title.as_ref().map(|t| t.trim().to_string()),
            tenant_id: cmd.tenant_id,
            owner_id: cmd.owner_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_send(&self, cmd: &SendForSignature) -> Result<Vec<AgreementEvent>, LifecycleError> {
        lifecycle::ensure_sendable(self)?;

        Ok(vec![AgreementEvent::SentForSignature(SentForSignature {
            sent_by: cmd.sent_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_sign(&self, cmd: &SignAgreement) -> Result<Vec<AgreementEvent>, LifecycleError> {
        lifecycle::ensure_signable(self, cmd.signature_type, cmd.signer)?;

        let slot = cmd.signature_type.slot();
        let mut events = vec![AgreementEvent::Signed(AgreementSigned {
            signature: Signature {
                signer: cmd.signer,
                signature_type: cmd.signature_type,
                signed_at: cmd.occurred_at,
            },
        })];

        let mut status = self.status;
        if status == AgreementStatus::Draft {
            events.push(AgreementEvent::StatusAdvanced(StatusAdvanced {
                from: status,
                to: AgreementStatus::AwaitingSignature,
                occurred_at: cmd.occurred_at,
            }));
            status = AgreementStatus::AwaitingSignature;
        }

        // Tenant + agency execute the agreement; the owner's signature is recorded only.
        let tenant_signed = self.tenant_signature.is_some() || slot == SignatureSlot::Tenant;
        let agency_signed = self.agency_signature.is_some() || slot == SignatureSlot::Agency;
        if tenant_signed && agency_signed {
            events.push(AgreementEvent::StatusAdvanced(StatusAdvanced {
                from: status,
                to: AgreementStatus::Signed,
                occurred_at: cmd.occurred_at,
            }));
        }

        Ok(events)
    }

    fn handle_approve(&self, cmd: &ApproveAgreement) -> Result<Vec<AgreementEvent>, LifecycleError> {
        lifecycle::ensure_approvable(self)?;

        Ok(vec![AgreementEvent::Approved(AgreementApproved {
            approver: cmd.approver,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectAgreement) -> Result<Vec<AgreementEvent>, LifecycleError> {
        lifecycle::ensure_rejectable(self)?;

        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::ReasonRequired);
        }

        Ok(vec![AgreementEvent::Rejected(AgreementRejected {
            rejected_by: cmd.rejected_by,
            reason: reason.to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelAgreement) -> Result<Vec<AgreementEvent>, LifecycleError> {
        lifecycle::ensure_cancellable(self)?;

        Ok(vec![AgreementEvent::Cancelled(AgreementCancelled {
            cancelled_by: cmd.cancelled_by,
            occurred_at: cmd.occurred_at,
        })])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
