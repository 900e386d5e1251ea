//! Monetary rounding rules.
//!
//! Quantities and unit prices are `Decimal` (produce is sold by weight, so
//! fractional quantities are routine). Totals are the exact sum of the line
//! subtotals, rounded once to two decimal places, half-up.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places carried by persisted amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Round an amount to two decimal places, half-up.
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Total of a sequence of subtotals: summed exactly, rounded once.
pub fn total_amount<I>(subtotals: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_half_up(subtotals.into_iter().sum())
}
