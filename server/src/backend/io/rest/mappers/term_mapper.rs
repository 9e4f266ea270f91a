use crate::backend::domain::installment_schedule::TermView;
use shared::InstallmentTerm;

pub struct TermMapper;

impl TermMapper {
    /// Flatten a stored term and its derived status into the wire shape
    pub fn to_dto(view: TermView) -> InstallmentTerm {
        InstallmentTerm {
            id: view.term.id,
            entry_id: view.term.entry_id,
            term_number: view.term.term_number,
            due_date: view.term.due_date,
            status: view.status,
            actions: view.actions,
            payment_id: view.payment_id,
            notes: view.term.notes,
        }
    }

    pub fn to_dto_list(views: Vec<TermView>) -> Vec<InstallmentTerm> {
        views.into_iter().map(Self::to_dto).collect()
    }
}
