use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::date_utils::{days_in_month, parse_date, PeriodKey};
use crate::error::ChartError;
use crate::models::{Category, CategoryKind, Transaction};
use crate::services::charts::{CategoryTotal, ALL_CATEGORIES_ID};

pub const ALL_CATEGORIES_NAME: &str = "All Categories";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBurndown {
    pub month: u32,
    pub year: i32,
    pub categories: Vec<CategoryTotal>,
}

/// Per-category daily spend and remaining budget for one month.
///
/// Only expense categories with a positive budget take part. Both maps of
/// every returned total hold all days of the month, and the "All
/// Categories" aggregate always comes first.
pub fn build_budget_burndown(
    categories: &[Category],
    expenses: &[Transaction],
    month: u32,
    year: i32,
) -> Result<BudgetBurndown, ChartError> {
    let period = PeriodKey::month(year, month)?;
    let days = days_in_month(year, month);

    let budgeted: Vec<&Category> = categories
        .iter()
        .filter(|c| c.kind == CategoryKind::Expense && c.budget > Decimal::ZERO)
        .collect();

    let mut totals = Vec::with_capacity(budgeted.len() + 1);
    let mut all_daily: BTreeMap<u32, Decimal> = (1..=days).map(|d| (d, Decimal::ZERO)).collect();
    let mut all_budget = Decimal::ZERO;

    for category in budgeted {
        let mut daily: BTreeMap<u32, Decimal> = (1..=days).map(|d| (d, Decimal::ZERO)).collect();

        for expense in expenses.iter().filter(|e| e.category_id == category.id) {
            let Some(date) = parse_date(&expense.date) else {
                tracing::warn!(expense_id = expense.id, date = %expense.date, "Skipping expense with unparseable date");
                continue;
            };
            if !period.contains(date) {
                continue;
            }
            *daily.entry(date.day()).or_insert(Decimal::ZERO) += expense.amount;
            *all_daily.entry(date.day()).or_insert(Decimal::ZERO) += expense.amount;
        }

        all_budget += category.budget;
        totals.push(category_total(
            category.id,
            &category.name,
            category.budget,
            daily,
        ));
    }

    totals.insert(
        0,
        category_total(ALL_CATEGORIES_ID, ALL_CATEGORIES_NAME, all_budget, all_daily),
    );

    tracing::debug!(
        month,
        year,
        categories = totals.len(),
        "Built budget burndown"
    );

    Ok(BudgetBurndown {
        month,
        year,
        categories: totals,
    })
}

fn category_total(
    category_id: i64,
    name: &str,
    budget: Decimal,
    daily_spending: BTreeMap<u32, Decimal>,
) -> CategoryTotal {
    let mut running = budget;
    let remaining_budget = daily_spending
        .iter()
        .map(|(day, spent)| {
            running -= *spent;
            (*day, running)
        })
        .collect();

    CategoryTotal {
        category_id,
        category_name: name.to_string(),
        budget,
        total_spent: daily_spending.values().copied().sum(),
        daily_spending,
        remaining_budget,
    }
}
