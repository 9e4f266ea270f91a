//! Allocation splitter for GROUP entries.
//!
//! Converts a total amount and a split mode into per-member shares. The
//! equal split rounds every share up to the cent, so the shares can add up
//! to a little more than the total; that overshoot is kept as is.
//!
//! [`AllocationDraft`] is the editable form of a split. Editing one row only
//! recomputes that row's counterpart field, and sum mismatches produce
//! [`SplitWarning`]s rather than errors.

use rust_decimal::Decimal;
use shared::{AllocationShare, MemberShareInput, SplitMode, SplitWarning};
use std::collections::HashSet;

use crate::backend::domain::money::{ceil_cents, percent_of, share_of, MAX_AMOUNT, MAX_PERCENT, MIN_TOTAL};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("A split needs at least one member")]
    NoMembers,
    #[error("Total amount must be greater than zero")]
    NonPositiveTotal,
    #[error("Total amount must be at least {min}", min = MIN_TOTAL)]
    TotalTooSmall,
    #[error("Share values cannot be negative")]
    NegativeValue,
    #[error("Amount cannot exceed {max}", max = MAX_AMOUNT)]
    AmountTooLarge,
    #[error("Percent cannot exceed {max}", max = MAX_PERCENT)]
    PercentTooLarge,
    #[error("No member at position {0}")]
    UnknownMember(usize),
    #[error("Cannot edit {attempted:?} values of a {mode:?} split")]
    WrongMode { mode: SplitMode, attempted: SplitMode },
    #[error("Member {0} appears more than once")]
    DuplicateMember(String),
    #[error("Member {0} has no allocation")]
    MissingMember(String),
    #[error("{0} is not a member of the group")]
    NotAMember(String),
}

/// One member's share of the total
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRow {
    pub member_id: String,
    pub amount: Decimal,
    pub percent: Decimal,
}

impl From<&SplitRow> for AllocationShare {
    fn from(row: &SplitRow) -> Self {
        AllocationShare {
            member_id: row.member_id.clone(),
            amount: row.amount,
            percent: row.percent,
        }
    }
}

/// `round(total × percent / 100, 2)`
pub fn amount_from_percent(total: Decimal, percent: Decimal) -> Decimal {
    share_of(total, percent)
}

/// `round(amount / total × 100, 2)`
pub fn percent_from_amount(total: Decimal, amount: Decimal) -> Decimal {
    percent_of(amount, total)
}

fn check_total(total: Decimal) -> Result<(), SplitError> {
    if total <= Decimal::ZERO {
        return Err(SplitError::NonPositiveTotal);
    }
    if total < MIN_TOTAL {
        return Err(SplitError::TotalTooSmall);
    }
    if total > MAX_AMOUNT {
        return Err(SplitError::AmountTooLarge);
    }
    Ok(())
}

/// Split `total` evenly, rounding each share up to the cent
pub fn split_equal(total: Decimal, member_ids: &[String]) -> Vec<SplitRow> {
    if member_ids.is_empty() {
        return Vec::new();
    }

    let per_person = ceil_cents(total / Decimal::from(member_ids.len()));
    let percent = percent_from_amount(total, per_person);

    member_ids
        .iter()
        .map(|member_id| SplitRow {
            member_id: member_id.clone(),
            amount: per_person,
            percent,
        })
        .collect()
}

/// Human-readable line stored on an allocation, e.g.
/// `Sam Lee: 33.34 (33.34%) of Cabin weekend`
pub fn describe_share(member_name: &str, amount: Decimal, percent: Decimal, entry_name: &str) -> String {
    format!("{}: {:.2} ({:.2}%) of {}", member_name, amount, percent, entry_name)
}

/// Hard check that the allocations cover every group member exactly once
pub fn check_partition(group_members: &[String], allocation_members: &[String]) -> Result<(), SplitError> {
    let group: HashSet<&str> = group_members.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    for member_id in allocation_members {
        if !group.contains(member_id.as_str()) {
            return Err(SplitError::NotAMember(member_id.clone()));
        }
        if !seen.insert(member_id.as_str()) {
            return Err(SplitError::DuplicateMember(member_id.clone()));
        }
    }

    if let Some(missing) = group_members.iter().find(|m| !seen.contains(m.as_str())) {
        return Err(SplitError::MissingMember(missing.clone()));
    }

    Ok(())
}

/// Editable split of a total across members
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationDraft {
    total: Decimal,
    mode: SplitMode,
    rows: Vec<SplitRow>,
}

impl AllocationDraft {
    /// Start a split; every mode begins from the equal split
    pub fn new(total: Decimal, member_ids: &[String], mode: SplitMode) -> Result<Self, SplitError> {
        if member_ids.is_empty() {
            return Err(SplitError::NoMembers);
        }
        check_total(total)?;

        Ok(Self {
            total,
            mode,
            rows: split_equal(total, member_ids),
        })
    }

    /// Resume editing a split that was stored earlier
    pub fn from_rows(total: Decimal, mode: SplitMode, rows: Vec<SplitRow>) -> Result<Self, SplitError> {
        if rows.is_empty() {
            return Err(SplitError::NoMembers);
        }
        check_total(total)?;
        Ok(Self { total, mode, rows })
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn rows(&self) -> &[SplitRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<SplitRow> {
        self.rows
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.member_id.clone()).collect()
    }

    pub fn allocated_total(&self) -> Decimal {
        self.rows.iter().map(|r| r.amount).sum()
    }

    pub fn percent_total(&self) -> Decimal {
        self.rows.iter().map(|r| r.percent).sum()
    }

    /// Set one member's percent and derive that member's amount
    pub fn set_percent(&mut self, index: usize, percent: Decimal) -> Result<(), SplitError> {
        self.ensure_mode(SplitMode::Percent)?;
        if percent < Decimal::ZERO {
            return Err(SplitError::NegativeValue);
        }
        if percent > MAX_PERCENT {
            return Err(SplitError::PercentTooLarge);
        }
        let total = self.total;
        let row = self.rows.get_mut(index).ok_or(SplitError::UnknownMember(index))?;
        row.percent = percent;
        row.amount = amount_from_percent(total, percent);
        Ok(())
    }

    /// Set one member's amount and derive that member's percent
    pub fn set_amount(&mut self, index: usize, amount: Decimal) -> Result<(), SplitError> {
        self.ensure_mode(SplitMode::Amount)?;
        if amount < Decimal::ZERO {
            return Err(SplitError::NegativeValue);
        }
        if amount > MAX_AMOUNT {
            return Err(SplitError::AmountTooLarge);
        }
        let total = self.total;
        let row = self.rows.get_mut(index).ok_or(SplitError::UnknownMember(index))?;
        row.amount = amount;
        row.percent = percent_from_amount(total, amount);
        Ok(())
    }

    /// Apply per-member inputs by member ID, using the field the mode edits
    pub fn apply_shares(&mut self, shares: &[MemberShareInput]) -> Result<(), SplitError> {
        for share in shares {
            let index = self
                .rows
                .iter()
                .position(|r| r.member_id == share.member_id)
                .ok_or_else(|| SplitError::NotAMember(share.member_id.clone()))?;

            match self.mode {
                SplitMode::Equal => {}
                SplitMode::Percent => {
                    if let Some(percent) = share.percent {
                        self.set_percent(index, percent)?;
                    }
                }
                SplitMode::Amount => {
                    if let Some(amount) = share.amount {
                        self.set_amount(index, amount)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Change the split mode
    ///
    /// A different mode throws away every per-member edit and starts over
    /// from the equal split. Re-selecting the current mode keeps the rows.
    pub fn switch_mode(&mut self, mode: SplitMode) {
        if mode == self.mode {
            return;
        }
        let member_ids = self.member_ids();
        self.mode = mode;
        self.rows = split_equal(self.total, &member_ids);
    }

    /// Change the total and re-derive what the mode does not hold fixed
    ///
    /// Equal splits are recomputed, percent splits keep their percents and
    /// amount splits keep their amounts.
    pub fn set_total(&mut self, total: Decimal) -> Result<(), SplitError> {
        check_total(total)?;
        self.total = total;

        match self.mode {
            SplitMode::Equal => {
                let member_ids = self.member_ids();
                self.rows = split_equal(total, &member_ids);
            }
            SplitMode::Percent => {
                for row in &mut self.rows {
                    row.amount = amount_from_percent(total, row.percent);
                }
            }
            SplitMode::Amount => {
                for row in &mut self.rows {
                    row.percent = percent_from_amount(total, row.amount);
                }
            }
        }
        Ok(())
    }

    /// Soft hints about sums that do not match; never blocking
    pub fn warnings(&self) -> Vec<SplitWarning> {
        match self.mode {
            SplitMode::Equal => Vec::new(),
            SplitMode::Percent => {
                let total_percent = self.percent_total();
                if total_percent < Decimal::ONE_HUNDRED {
                    vec![SplitWarning::PercentBelowHundred { total_percent }]
                } else if total_percent > Decimal::ONE_HUNDRED {
                    vec![SplitWarning::PercentAboveHundred { total_percent }]
                } else {
                    Vec::new()
                }
            }
            SplitMode::Amount => {
                let allocated = self.allocated_total();
                if allocated < self.total {
                    vec![SplitWarning::AmountBelowTotal {
                        allocated,
                        total: self.total,
                    }]
                } else if allocated > self.total {
                    vec![SplitWarning::AmountAboveTotal {
                        allocated,
                        total: self.total,
                    }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn ensure_mode(&self, attempted: SplitMode) -> Result<(), SplitError> {
        if self.mode != attempted {
            return Err(SplitError::WrongMode {
                mode: self.mode,
                attempted,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn members(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("person::{}", i)).collect()
    }

    #[test]
    fn test_equal_split_rounds_up_and_overshoots() {
        let rows = split_equal(dec!(100), &members(3));
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.amount == dec!(33.34)));
        assert!(rows.iter().all(|r| r.percent == dec!(33.34)));

        let sum: Decimal = rows.iter().map(|r| r.amount).sum();
        assert_eq!(sum, dec!(100.02));
    }

    #[test]
    fn test_equal_split_exact() {
        let rows = split_equal(dec!(90), &members(3));
        assert!(rows.iter().all(|r| r.amount == dec!(30)));
        assert!(rows.iter().all(|r| r.percent == dec!(33.33)));
    }

    #[test]
    fn test_percent_edit_derives_only_that_amount() {
        let mut draft = AllocationDraft::new(dec!(200), &members(2), SplitMode::Percent).unwrap();
        draft.set_percent(0, dec!(50)).unwrap();
        assert_eq!(draft.rows()[0].amount, dec!(100.00));

        draft.set_percent(0, dec!(70)).unwrap();
        assert_eq!(draft.rows()[0].amount, dec!(140));
        // The other member is not rebalanced
        assert_eq!(draft.rows()[1].percent, dec!(50));
        assert_eq!(draft.rows()[1].amount, dec!(100));
    }

    #[test]
    fn test_amount_edit_is_inverse_of_percent_edit() {
        let mut draft = AllocationDraft::new(dec!(200), &members(2), SplitMode::Amount).unwrap();
        draft.set_amount(1, dec!(100)).unwrap();
        assert_eq!(draft.rows()[1].percent, dec!(50.00));

        draft.set_amount(1, dec!(25)).unwrap();
        assert_eq!(draft.rows()[1].percent, dec!(12.5));
    }

    #[test]
    fn test_edit_in_wrong_mode_is_rejected() {
        let mut draft = AllocationDraft::new(dec!(200), &members(2), SplitMode::Equal).unwrap();
        assert_eq!(
            draft.set_amount(0, dec!(10)),
            Err(SplitError::WrongMode {
                mode: SplitMode::Equal,
                attempted: SplitMode::Amount
            })
        );
        assert!(draft.set_percent(0, dec!(10)).is_err());
    }

    #[test]
    fn test_unknown_index_and_negative_values() {
        let mut draft = AllocationDraft::new(dec!(200), &members(2), SplitMode::Percent).unwrap();
        assert_eq!(draft.set_percent(5, dec!(10)), Err(SplitError::UnknownMember(5)));
        assert_eq!(draft.set_percent(0, dec!(-1)), Err(SplitError::NegativeValue));
    }

    #[test]
    fn test_switch_mode_discards_edits() {
        let mut draft = AllocationDraft::new(dec!(100), &members(2), SplitMode::Percent).unwrap();
        draft.set_percent(0, dec!(80)).unwrap();

        // Same mode keeps the edit
        draft.switch_mode(SplitMode::Percent);
        assert_eq!(draft.rows()[0].percent, dec!(80));

        draft.switch_mode(SplitMode::Amount);
        assert_eq!(draft.mode(), SplitMode::Amount);
        assert_eq!(draft.rows()[0].amount, dec!(50));
        assert_eq!(draft.rows()[0].percent, dec!(50));
    }

    #[test]
    fn test_percent_warnings() {
        let mut draft = AllocationDraft::new(dec!(100), &members(2), SplitMode::Percent).unwrap();
        assert!(draft.warnings().is_empty());

        draft.set_percent(0, dec!(30)).unwrap();
        assert_eq!(
            draft.warnings(),
            vec![SplitWarning::PercentBelowHundred { total_percent: dec!(80) }]
        );

        draft.set_percent(0, dec!(60)).unwrap();
        assert_eq!(
            draft.warnings(),
            vec![SplitWarning::PercentAboveHundred { total_percent: dec!(110) }]
        );
    }

    #[test]
    fn test_amount_warnings() {
        let mut draft = AllocationDraft::new(dec!(100), &members(2), SplitMode::Amount).unwrap();
        draft.set_amount(0, dec!(10)).unwrap();
        assert_eq!(
            draft.warnings(),
            vec![SplitWarning::AmountBelowTotal {
                allocated: dec!(60),
                total: dec!(100)
            }]
        );

        draft.set_amount(0, dec!(70)).unwrap();
        assert_eq!(
            draft.warnings(),
            vec![SplitWarning::AmountAboveTotal {
                allocated: dec!(120),
                total: dec!(100)
            }]
        );
    }

    #[test]
    fn test_equal_overshoot_is_not_warned() {
        let draft = AllocationDraft::new(dec!(100), &members(3), SplitMode::Equal).unwrap();
        assert_eq!(draft.allocated_total(), dec!(100.02));
        assert!(draft.warnings().is_empty());
    }

    #[test]
    fn test_set_total_keeps_the_fixed_side() {
        let mut percent = AllocationDraft::new(dec!(100), &members(2), SplitMode::Percent).unwrap();
        percent.set_percent(0, dec!(25)).unwrap();
        percent.set_total(dec!(400)).unwrap();
        assert_eq!(percent.rows()[0].amount, dec!(100));
        assert_eq!(percent.rows()[0].percent, dec!(25));

        let mut amount = AllocationDraft::new(dec!(100), &members(2), SplitMode::Amount).unwrap();
        amount.set_total(dec!(200)).unwrap();
        assert_eq!(amount.rows()[0].amount, dec!(50));
        assert_eq!(amount.rows()[0].percent, dec!(25));

        assert_eq!(amount.set_total(dec!(0)), Err(SplitError::NonPositiveTotal));
    }

    #[test]
    fn test_apply_shares_by_member_id() {
        let ids = members(2);
        let mut draft = AllocationDraft::new(dec!(300), &ids, SplitMode::Amount).unwrap();
        draft
            .apply_shares(&[MemberShareInput {
                member_id: ids[1].clone(),
                percent: None,
                amount: Some(dec!(200)),
            }])
            .unwrap();
        assert_eq!(draft.rows()[1].amount, dec!(200));
        assert_eq!(draft.rows()[1].percent, dec!(66.67));

        let result = draft.apply_shares(&[MemberShareInput {
            member_id: "person::stranger".to_string(),
            percent: None,
            amount: Some(dec!(1)),
        }]);
        assert_eq!(result, Err(SplitError::NotAMember("person::stranger".to_string())));
    }

    #[test]
    fn test_new_rejects_empty_or_zero() {
        assert_eq!(
            AllocationDraft::new(dec!(100), &[], SplitMode::Equal),
            Err(SplitError::NoMembers)
        );
        assert_eq!(
            AllocationDraft::new(dec!(0), &members(1), SplitMode::Equal),
            Err(SplitError::NonPositiveTotal)
        );
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let one = vec!["person::a".to_string()];
        assert_eq!(
            AllocationDraft::new(Decimal::MAX, &one, SplitMode::Equal),
            Err(SplitError::AmountTooLarge)
        );
        assert_eq!(
            AllocationDraft::from_rows(Decimal::MAX, SplitMode::Equal, split_equal(dec!(10), &one)),
            Err(SplitError::AmountTooLarge)
        );

        let mut percent = AllocationDraft::new(MAX_AMOUNT, &members(2), SplitMode::Percent).unwrap();
        assert_eq!(percent.set_percent(0, Decimal::MAX), Err(SplitError::PercentTooLarge));
        percent.set_percent(0, MAX_PERCENT).unwrap();
        assert_eq!(percent.rows()[0].amount, MAX_AMOUNT * dec!(10));

        let mut amount = AllocationDraft::new(dec!(100), &members(2), SplitMode::Amount).unwrap();
        assert_eq!(amount.set_amount(1, Decimal::MAX), Err(SplitError::AmountTooLarge));
        assert_eq!(amount.set_total(Decimal::MAX), Err(SplitError::AmountTooLarge));
        assert_eq!(amount.set_total(dec!(0.0000001)), Err(SplitError::TotalTooSmall));
        assert_eq!(amount.total(), dec!(100));

        // The largest amount against the smallest total stays in range
        let mut tiny = AllocationDraft::new(MIN_TOTAL, &members(2), SplitMode::Amount).unwrap();
        tiny.set_amount(0, MAX_AMOUNT).unwrap();
        assert_eq!(tiny.rows()[0].percent, dec!(10_000_000_000_000_000));
    }

    #[test]
    fn test_describe_share() {
        assert_eq!(
            describe_share("Sam Lee", dec!(33.34), dec!(33.34), "Cabin weekend"),
            "Sam Lee: 33.34 (33.34%) of Cabin weekend"
        );
    }

    #[test]
    fn test_check_partition() {
        let group = members(3);
        assert!(check_partition(&group, &group).is_ok());

        let missing = vec![group[0].clone(), group[1].clone()];
        assert_eq!(
            check_partition(&group, &missing),
            Err(SplitError::MissingMember(group[2].clone()))
        );

        let duplicated = vec![group[0].clone(), group[0].clone(), group[1].clone()];
        assert_eq!(
            check_partition(&group, &duplicated),
            Err(SplitError::DuplicateMember(group[0].clone()))
        );

        let outsider = vec!["person::x".to_string()];
        assert_eq!(
            check_partition(&group, &outsider),
            Err(SplitError::NotAMember("person::x".to_string()))
        );
    }
}
