use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// An amount too large to be stored as `i64` cents.
#[derive(Debug, thiserror::Error)]
#[error("Amount {0} is out of range")]
pub struct AmountOutOfRange(pub Decimal);

/// Stored amounts are integer cents; everything above the database speaks `Decimal`.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Round to the nearest cent, half away from zero. `None` when the result
/// does not fit in `i64`.
pub fn decimal_to_cents(amount: Decimal) -> Option<i64> {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()
}

/// [`decimal_to_cents`] as a typed error, for callers that must not guess.
pub fn try_decimal_to_cents(amount: Decimal) -> Result<i64, AmountOutOfRange> {
    decimal_to_cents(amount).ok_or(AmountOutOfRange(amount))
}
