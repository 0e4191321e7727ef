pub mod categories;
pub mod profile;
pub mod tags;
pub mod transactions;

use rust_decimal::Decimal;

use crate::models::money::try_decimal_to_cents;

/// Cents for a bound parameter; an out-of-range amount fails the statement.
pub(crate) fn cents_param(amount: Decimal) -> rusqlite::Result<i64> {
    try_decimal_to_cents(amount).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}
