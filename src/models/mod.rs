pub mod category;
pub mod money;
pub mod profile;
pub mod tag;
pub mod transaction;

pub use category::{Category, CategoryKind, NewCategory, UpdateBudget};
pub use money::{cents_to_decimal, decimal_to_cents};
pub use profile::Profile;
pub use tag::{NewTag, Tag};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
