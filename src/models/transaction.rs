use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Expenses and incomes share one shape and live in sibling tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Expense => "expenses",
            Self::Income => "incomes",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub amount: Decimal,
    pub date: String,
    pub description: Option<String>,
    pub tag_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub category_id: i64,
    pub name: String,
    pub amount: Decimal,
    pub date: String,
    pub description: Option<String>,
    pub tag_id: Option<i64>,
}
