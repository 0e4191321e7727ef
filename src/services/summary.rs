//! Summary cards for the statistics screen.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::date_utils::{days_in_month, parse_date};
use crate::models::{Category, CategoryKind, Transaction};

const NOT_AVAILABLE: &str = "N/A";
const STREAK_LOOKBACK_DAYS: i64 = 365;
const WEEKLY_WINDOW_DAYS: i64 = 28;

/// Everything the summary is computed from.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub expenses: &'a [Transaction],
    pub incomes: &'a [Transaction],
    pub categories: &'a [Category],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalSummary {
    pub highest_spending: HighestSpending,
    pub savings: Savings,
    pub average_spending: AverageSpending,
    pub budget_streak: BudgetStreak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestSpending {
    pub highest_spending_day: DaySpending,
    pub highest_spending_month: MonthSpending,
    pub highest_spending_category: CategorySpending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySpending {
    pub date: String,
    pub amount: Decimal,
}

/// `month` and `year` are 0 when nothing was spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSpending {
    pub month: u32,
    pub year: i32,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category_id: i64,
    pub category_name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Savings {
    pub average_monthly_savings_rate: Decimal,
    /// Keyed `MM-YYYY`.
    pub monthly_savings_percentage: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageSpending {
    pub average_daily_spend: Decimal,
    pub average_weekly_spend: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStreak {
    pub longest_streak_days: u32,
    pub streak_start_date: String,
    pub streak_end_date: String,
}

impl BudgetStreak {
    fn none() -> Self {
        Self {
            longest_streak_days: 0,
            streak_start_date: NOT_AVAILABLE.to_string(),
            streak_end_date: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Transactions with a parsed date; rows whose date does not parse are skipped.
fn dated(transactions: &[Transaction]) -> Vec<(NaiveDate, &Transaction)> {
    transactions
        .iter()
        .filter_map(|t| parse_date(&t.date).map(|d| (d, t)))
        .collect()
}

fn monthly_totals(dated: &[(NaiveDate, &Transaction)]) -> BTreeMap<(i32, u32), Decimal> {
    let mut totals = BTreeMap::new();
    for (date, t) in dated {
        *totals
            .entry((date.year(), date.month()))
            .or_insert(Decimal::ZERO) += t.amount;
    }
    totals
}

pub fn build_statistical_summary(input: SummaryInput<'_>, today: NaiveDate) -> StatisticalSummary {
    let expenses = dated(input.expenses);
    let incomes = dated(input.incomes);
    let spent_by_month = monthly_totals(&expenses);
    let earned_by_month = monthly_totals(&incomes);

    let summary = StatisticalSummary {
        highest_spending: HighestSpending {
            highest_spending_day: highest_spending_day(&expenses),
            highest_spending_month: highest_spending_month(&spent_by_month, today.year()),
            highest_spending_category: highest_spending_category(input.expenses, input.categories),
        },
        savings: savings(&spent_by_month, &earned_by_month, today.year()),
        average_spending: average_spending(&expenses, &spent_by_month, today),
        budget_streak: budget_streak(&expenses, input.categories, today),
    };

    tracing::debug!(
        expenses = expenses.len(),
        incomes = incomes.len(),
        streak = summary.budget_streak.longest_streak_days,
        "Built statistical summary"
    );

    summary
}

fn highest_spending_day(expenses: &[(NaiveDate, &Transaction)]) -> DaySpending {
    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (date, t) in expenses {
        *daily.entry(*date).or_insert(Decimal::ZERO) += t.amount;
    }

    let mut best: Option<(NaiveDate, Decimal)> = None;
    for (date, amount) in daily {
        if best.map_or(true, |(_, top)| amount > top) {
            best = Some((date, amount));
        }
    }

    match best {
        Some((date, amount)) => DaySpending {
            date: date.format("%Y-%m-%d").to_string(),
            amount,
        },
        None => DaySpending {
            date: NOT_AVAILABLE.to_string(),
            amount: Decimal::ZERO,
        },
    }
}

/// Searches the current year first, then the previous one; ties keep the earlier find.
fn highest_spending_month(
    spent_by_month: &BTreeMap<(i32, u32), Decimal>,
    current_year: i32,
) -> MonthSpending {
    let mut best = MonthSpending {
        month: 0,
        year: 0,
        amount: Decimal::ZERO,
    };
    for year in [current_year, current_year - 1] {
        for month in 1..=12 {
            let total = spent_by_month
                .get(&(year, month))
                .copied()
                .unwrap_or(Decimal::ZERO);
            if total > best.amount {
                best = MonthSpending {
                    month,
                    year,
                    amount: total,
                };
            }
        }
    }
    best
}

fn highest_spending_category(expenses: &[Transaction], categories: &[Category]) -> CategorySpending {
    let mut totals: BTreeMap<i64, Decimal> = BTreeMap::new();
    for t in expenses {
        *totals.entry(t.category_id).or_insert(Decimal::ZERO) += t.amount;
    }

    let mut best: Option<(i64, Decimal)> = None;
    for (id, amount) in totals {
        if best.map_or(true, |(_, top)| amount > top) {
            best = Some((id, amount));
        }
    }

    let Some((category_id, amount)) = best else {
        return CategorySpending {
            category_id: 0,
            category_name: NOT_AVAILABLE.to_string(),
            amount: Decimal::ZERO,
        };
    };

    let category_name = categories
        .iter()
        .find(|c| c.id == category_id && c.kind == CategoryKind::Expense)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    CategorySpending {
        category_id,
        category_name,
        amount,
    }
}

fn savings(
    spent_by_month: &BTreeMap<(i32, u32), Decimal>,
    earned_by_month: &BTreeMap<(i32, u32), Decimal>,
    current_year: i32,
) -> Savings {
    let mut monthly = BTreeMap::new();
    let mut rate_sum = Decimal::ZERO;

    for year in [current_year, current_year - 1] {
        for month in 1..=12 {
            let income = earned_by_month
                .get(&(year, month))
                .copied()
                .unwrap_or(Decimal::ZERO);
            if income <= Decimal::ZERO {
                continue;
            }
            let spent = spent_by_month
                .get(&(year, month))
                .copied()
                .unwrap_or(Decimal::ZERO);
            let rate = ((income - spent) / income * Decimal::ONE_HUNDRED).round_dp(2);
            rate_sum += rate;
            monthly.insert(format!("{month:02}-{year}"), rate);
        }
    }

    let average = if monthly.is_empty() {
        Decimal::ZERO
    } else {
        (rate_sum / Decimal::from(monthly.len())).round_dp(2)
    };

    Savings {
        average_monthly_savings_rate: average,
        monthly_savings_percentage: monthly,
    }
}

fn average_spending(
    expenses: &[(NaiveDate, &Transaction)],
    spent_by_month: &BTreeMap<(i32, u32), Decimal>,
    today: NaiveDate,
) -> AverageSpending {
    let this_month = spent_by_month
        .get(&(today.year(), today.month()))
        .copied()
        .unwrap_or(Decimal::ZERO);
    let days = days_in_month(today.year(), today.month());

    let window_start = today - Duration::days(WEEKLY_WINDOW_DAYS - 1);
    let last_four_weeks: Decimal = expenses
        .iter()
        .filter(|(date, _)| *date >= window_start && *date <= today)
        .map(|(_, t)| t.amount)
        .sum();

    AverageSpending {
        average_daily_spend: (this_month / Decimal::from(days)).round_dp(2),
        average_weekly_spend: (last_four_weeks / Decimal::from(4)).round_dp(2),
    }
}

/// Longest run of consecutive days, within the last year, on which every
/// budgeted category stayed within its budget prorated to that day of the month.
fn budget_streak(
    expenses: &[(NaiveDate, &Transaction)],
    categories: &[Category],
    today: NaiveDate,
) -> BudgetStreak {
    let budgeted: Vec<&Category> = categories
        .iter()
        .filter(|c| c.kind == CategoryKind::Expense && c.budget > Decimal::ZERO)
        .collect();
    if budgeted.is_empty() {
        return BudgetStreak::none();
    }

    let mut daily: BTreeMap<(i64, NaiveDate), Decimal> = BTreeMap::new();
    for (date, t) in expenses {
        *daily.entry((t.category_id, *date)).or_insert(Decimal::ZERO) += t.amount;
    }

    let within_budget = |date: NaiveDate| -> bool {
        let days = Decimal::from(days_in_month(date.year(), date.month()));
        let day = Decimal::from(date.day());
        let Some(month_start) = date.with_day(1) else {
            return false;
        };
        budgeted.iter().all(|category| {
            let month_to_date: Decimal = daily
                .range((category.id, month_start)..=(category.id, date))
                .map(|(_, amount)| *amount)
                .sum();
            month_to_date * days <= category.budget * day
        })
    };

    let mut longest: Option<(u32, NaiveDate, NaiveDate)> = None;
    let mut run: Option<(u32, NaiveDate)> = None;

    let mut date = today - Duration::days(STREAK_LOOKBACK_DAYS);
    while date <= today {
        if within_budget(date) {
            let (length, start) = match run {
                Some((length, start)) => (length + 1, start),
                None => (1, date),
            };
            run = Some((length, start));
            if longest.map_or(true, |(best, _, _)| length > best) {
                longest = Some((length, start, date));
            }
        } else {
            run = None;
        }
        date += Duration::days(1);
    }

    match longest {
        Some((days, start, end)) => BudgetStreak {
            longest_streak_days: days,
            streak_start_date: start.format("%Y-%m-%d").to_string(),
            streak_end_date: end.format("%Y-%m-%d").to_string(),
        },
        None => BudgetStreak::none(),
    }
}
