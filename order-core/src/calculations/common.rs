//! Rounding shared by the fee calculation and amount parsing.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to a whole number, with midpoints rounded away from zero.
///
/// Negative values mirror positive ones: `-1.5` becomes `-2`, not `-1`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use order_core::calculations::common::round_half_away;
///
/// assert_eq!(round_half_away(dec!(25.5)), dec!(26));
/// assert_eq!(round_half_away(dec!(25.4)), dec!(25));
/// assert_eq!(round_half_away(dec!(-1.5)), dec!(-2));
/// ```
pub fn round_half_away(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
