use crate::backend::domain::allocation_splitter::SplitRow;
use crate::backend::domain::allocation_status::AllocationView;
use shared::{AllocationShare, PaymentAllocation};

pub struct AllocationMapper;

impl AllocationMapper {
    pub fn to_dto(view: AllocationView) -> PaymentAllocation {
        PaymentAllocation {
            id: view.allocation.id,
            entry_id: view.allocation.entry_id,
            member_id: view.allocation.member_id,
            amount: view.allocation.amount,
            amount_paid: view.amount_paid,
            percent: view.allocation.percent,
            status: view.status,
            max_payable: view.max_payable,
            description: view.allocation.description,
        }
    }

    pub fn to_dto_list(views: Vec<AllocationView>) -> Vec<PaymentAllocation> {
        views.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_share_list(rows: &[SplitRow]) -> Vec<AllocationShare> {
        rows.iter().map(AllocationShare::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::DomainAllocation;
    use rust_decimal_macros::dec;
    use shared::PaymentStatus;

    #[test]
    fn test_view_fields_are_flattened() {
        let view = AllocationView {
            allocation: DomainAllocation {
                id: "allocation::1".to_string(),
                entry_id: "entry::1".to_string(),
                member_id: "person::a".to_string(),
                amount: dec!(30),
                percent: dec!(33.33),
                description: "Ana: 30.00 (33.33%) of Cabin".to_string(),
            },
            amount_paid: dec!(10),
            status: PaymentStatus::PartiallyPaid,
            max_payable: dec!(20),
        };

        let dto = AllocationMapper::to_dto(view);
        assert_eq!(dto.amount, dec!(30));
        assert_eq!(dto.amount_paid, dec!(10));
        assert_eq!(dto.max_payable, dec!(20));
        assert_eq!(dto.status, PaymentStatus::PartiallyPaid);
    }
}
