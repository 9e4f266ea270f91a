//! Rounding rules for money and percentages.

use rust_decimal::{Decimal, RoundingStrategy};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One cent, the smallest total a split divides by
pub const MIN_TOTAL: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest amount accepted for a loan, a share, a term or a payment (one trillion)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Largest percent a member may be given in a percent split
pub const MAX_PERCENT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// True when the amount is above zero and within [`MAX_AMOUNT`]
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= MAX_AMOUNT
}

/// Round to 2 decimal places, half away from zero
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round up to the next cent
pub fn ceil_cents(value: Decimal) -> Decimal {
    (value * HUNDRED).ceil() / HUNDRED
}

/// `round(part / whole × 100, 2)`, or zero when the whole is zero
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_cents(part / whole * HUNDRED)
}

/// `round(whole × percent / 100, 2)`
pub fn share_of(whole: Decimal, percent: Decimal) -> Decimal {
    round_cents(whole * percent / HUNDRED)
}
