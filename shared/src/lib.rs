use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an entry, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// One-off loan repaid in any number of payments
    Straight,
    /// Loan repaid on a schedule of terms
    Installment,
    /// Expense split across the members of a group
    Group,
}

/// Payment status of an entry or of a group allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// Status of a single installment term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    NotStarted,
    Unpaid,
    Delinquent,
    Paid,
    Skipped,
}

/// How often installment terms fall due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentFrequency {
    Monthly,
    Weekly,
}

/// How a group expense is divided between members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    Equal,
    Percent,
    Amount,
}

/// Action a client may offer on an installment term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermAction {
    RecordPayment,
    Skip,
}

/// Non-blocking hint produced while editing an allocation split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitWarning {
    PercentBelowHundred { total_percent: Decimal },
    PercentAboveHundred { total_percent: Decimal },
    AmountBelowTotal { allocated: Decimal, total: Decimal },
    AmountAboveTotal { allocated: Decimal, total: Decimal },
}

impl fmt::Display for SplitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitWarning::PercentBelowHundred { total_percent } => {
                write!(f, "Percentages add up to {}%, which is less than 100%", total_percent)
            }
            SplitWarning::PercentAboveHundred { total_percent } => {
                write!(f, "Percentages add up to {}%, which exceeds 100%", total_percent)
            }
            SplitWarning::AmountBelowTotal { allocated, total } => {
                write!(f, "Allocated {} is less than the total of {}", allocated, total)
            }
            SplitWarning::AmountAboveTotal { allocated, total } => {
                write!(f, "Allocated {} exceeds the total of {}", allocated, total)
            }
        }
    }
}

/// Person ID in format: "person::<uuid>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Free-form contact string (phone, email, ...)
    pub contact: String,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

impl Person {
    pub fn display_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// A named collection of people; a group can borrow as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Person IDs of the members
    pub member_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Header record of a loan or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub transaction_type: TransactionType,
    pub lender_id: String,
    /// Set for STRAIGHT and INSTALLMENT entries
    pub borrower_id: Option<String>,
    /// Set for GROUP entries
    pub borrower_group_id: Option<String>,
    pub amount_borrowed: Decimal,
    /// Derived from the payment ledger
    pub amount_remaining: Decimal,
    /// Derived from the payment ledger
    pub status: PaymentStatus,
    pub date_borrowed: Option<NaiveDate>,
    /// RFC 3339 timestamp of the moment the remaining amount reached zero
    pub date_fully_paid: Option<String>,
    pub installment_start_date: Option<NaiveDate>,
    pub payment_terms: Option<u32>,
    pub payment_frequency: Option<PaymentFrequency>,
    pub payment_amount_per_term: Option<Decimal>,
    pub split_mode: Option<SplitMode>,
    pub notes: String,
    /// Opaque references to proof-of-loan attachments
    pub proof_refs: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A single monetary event against an entry, a term or an allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub entry_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Person actually paying or receiving the money
    pub payee_id: String,
    pub note: String,
    pub proof_refs: Vec<String>,
    pub term_id: Option<String>,
    pub allocation_id: Option<String>,
    pub created_at: String,
}

/// One scheduled slice of an INSTALLMENT entry, with its derived status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentTerm {
    pub id: String,
    pub entry_id: String,
    /// 1-based position in the schedule
    pub term_number: u32,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    /// Actions available for the derived status
    pub actions: Vec<TermAction>,
    pub payment_id: Option<String>,
    pub notes: String,
}

/// One member's share of a GROUP entry, with its derived paid amount and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub id: String,
    pub entry_id: String,
    pub member_id: String,
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub percent: Decimal,
    pub status: PaymentStatus,
    /// Largest single payment currently accepted against this allocation
    pub max_payable: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePersonRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePersonRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonListResponse {
    pub people: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub member_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
}

/// Schedule-defining fields of an INSTALLMENT entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlanRequest {
    pub start_date: Option<NaiveDate>,
    pub payment_terms: Option<u32>,
    pub payment_frequency: PaymentFrequency,
    /// Defaults to amount_borrowed / payment_terms when omitted
    pub payment_amount_per_term: Option<Decimal>,
}

/// Per-member input for a percent or amount split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberShareInput {
    pub member_id: String,
    pub percent: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// How a GROUP entry should be divided
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlanRequest {
    pub split_mode: SplitMode,
    /// Ignored for the equal split
    #[serde(default)]
    pub shares: Vec<MemberShareInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub transaction_type: TransactionType,
    pub lender_id: Option<String>,
    pub borrower_id: Option<String>,
    pub borrower_group_id: Option<String>,
    pub amount_borrowed: Option<Decimal>,
    pub date_borrowed: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub proof_refs: Vec<String>,
    pub installment: Option<InstallmentPlanRequest>,
    pub allocation: Option<AllocationPlanRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEntryResponse {
    pub entry: Entry,
    /// Soft split warnings; the entry was stored regardless
    pub warnings: Vec<SplitWarning>,
    pub success_message: String,
}

/// Partial update of an entry; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub date_borrowed: Option<NaiveDate>,
    pub proof_refs: Option<Vec<String>>,
    pub transaction_type: Option<TransactionType>,
    pub amount_borrowed: Option<Decimal>,
    pub borrower_id: Option<String>,
    pub borrower_group_id: Option<String>,
    pub lender_id: Option<String>,
    pub installment_start_date: Option<NaiveDate>,
    pub payment_terms: Option<u32>,
    pub payment_frequency: Option<PaymentFrequency>,
    pub payment_amount_per_term: Option<Decimal>,
    pub split_mode: Option<SplitMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryListRequest {
    pub status: Option<PaymentStatus>,
    pub transaction_type: Option<TransactionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryListResponse {
    pub entries: Vec<Entry>,
}

/// Entry with its whole ledger and sub-schedules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDetailResponse {
    pub entry: Entry,
    pub payments: Vec<Payment>,
    pub terms: Vec<InstallmentTerm>,
    pub allocations: Vec<PaymentAllocation>,
    /// True once any payment exists; monetary fields are frozen from then on
    pub is_locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateEntryResponse {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<SplitWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    /// Defaults to today when omitted
    pub date: Option<NaiveDate>,
    pub payee_id: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub proof_refs: Vec<String>,
    pub term_number: Option<u32>,
    pub allocation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment: Payment,
    /// Entry state after the ledger change
    pub entry: Entry,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentListResponse {
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePaymentResponse {
    /// None when the parent entry no longer exists
    pub entry: Option<Entry>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermListResponse {
    pub terms: Vec<InstallmentTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipTermResponse {
    pub skipped_term: InstallmentTerm,
    pub appended_term: InstallmentTerm,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTermNotesRequest {
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationListResponse {
    pub allocations: Vec<PaymentAllocation>,
}

/// Run the splitter without storing anything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPreviewRequest {
    pub total: Decimal,
    pub split_mode: SplitMode,
    pub member_ids: Vec<String>,
    /// Per-member overrides for percent or amount mode
    #[serde(default)]
    pub shares: Vec<MemberShareInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationShare {
    pub member_id: String,
    pub amount: Decimal,
    pub percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPreviewResponse {
    pub shares: Vec<AllocationShare>,
    pub allocated_total: Decimal,
    pub warnings: Vec<SplitWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted_id: String,
    pub success_message: String,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Kind prefix of a record ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Person,
    Group,
    Entry,
    Payment,
    Term,
    Allocation,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Person => "person",
            IdKind::Group => "group",
            IdKind::Entry => "entry",
            IdKind::Payment => "payment",
            IdKind::Term => "term",
            IdKind::Allocation => "allocation",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "person" => Some(IdKind::Person),
            "group" => Some(IdKind::Group),
            "entry" => Some(IdKind::Entry),
            "payment" => Some(IdKind::Payment),
            "term" => Some(IdKind::Term),
            "allocation" => Some(IdKind::Allocation),
            _ => None,
        }
    }
}

/// Generate a record ID in format: "<kind>::<uuid>"
pub fn generate_id(kind: IdKind) -> String {
    format!("{}::{}", kind.prefix(), uuid::Uuid::new_v4())
}

/// Parse a record ID into its kind and UUID
pub fn parse_id(id: &str) -> Result<(IdKind, uuid::Uuid), IdError> {
    let (prefix, raw) = id.split_once("::").ok_or(IdError::InvalidFormat)?;
    let kind = IdKind::from_prefix(prefix).ok_or(IdError::InvalidKind)?;
    let uuid = uuid::Uuid::parse_str(raw).map_err(|_| IdError::InvalidUuid)?;
    Ok((kind, uuid))
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdError {
    InvalidFormat,
    InvalidKind,
    InvalidUuid,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::InvalidFormat => write!(f, "Invalid ID format"),
            IdError::InvalidKind => write!(f, "Invalid ID kind"),
            IdError::InvalidUuid => write!(f, "Invalid UUID in ID"),
        }
    }
}

impl std::error::Error for IdError {}
