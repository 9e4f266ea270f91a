use crate::backend::domain::models::DomainEntry;
use shared::Entry;

pub struct EntryMapper;

impl EntryMapper {
    pub fn to_dto(domain: DomainEntry) -> Entry {
        Entry {
            id: domain.id,
            name: domain.name,
            description: domain.description,
            transaction_type: domain.transaction_type,
            lender_id: domain.lender_id,
            borrower_id: domain.borrower_id,
            borrower_group_id: domain.borrower_group_id,
            amount_borrowed: domain.amount_borrowed,
            amount_remaining: domain.amount_remaining,
            status: domain.status,
            date_borrowed: domain.date_borrowed,
            date_fully_paid: domain.date_fully_paid,
            installment_start_date: domain.installment_start_date,
            payment_terms: domain.payment_terms,
            payment_frequency: domain.payment_frequency,
            payment_amount_per_term: domain.payment_amount_per_term,
            split_mode: domain.split_mode,
            notes: domain.notes,
            proof_refs: domain.proof_refs,
            created_at: domain.created_at,
            updated_at: domain.updated_at,
        }
    }

    pub fn to_dto_list(domain_entries: Vec<DomainEntry>) -> Vec<Entry> {
        domain_entries.into_iter().map(Self::to_dto).collect()
    }
}
