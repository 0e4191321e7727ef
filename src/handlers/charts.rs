//! JSON endpoints feeding the statistics charts.
//!
//! Each handler fetches the records a chart needs and hands them to
//! [`crate::services::charts`] for assembly.

use std::collections::{BTreeMap, BTreeSet};

use axum::extract::{Query, State};
use axum::response::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::date_utils::{months_ending_at, PeriodKey, PeriodType, SHORT_MONTH_NAMES};
use crate::db::queries::transactions::{self, TransactionFilter};
use crate::error::{AppError, AppResult};
use crate::handlers::budget::load_burndown;
use crate::models::{Category, CategoryKind, TransactionKind};
use crate::services::charts::{
    build_burndown_series, build_cash_flow, build_category_timeline, build_comparison_series,
    build_flow_graph, build_monthly_overview, summarize_comparison, BurndownPoint, CashFlowPoint,
    CategoryAmount, CategoryTotal, ComparisonResponse, FlowGraph, LeafRecord, MissingDayPolicy,
    MonthlyOverviewPoint, TimelinePoint, ALL_CATEGORIES_ID,
};
use crate::state::AppState;

const DEFAULT_TIMELINE_MONTHS: usize = 6;
const MAX_TIMELINE_MONTHS: usize = 24;

#[derive(Debug, Deserialize)]
pub struct YearParams {
    pub year: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurndownParams {
    pub month: u32,
    pub year: i32,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub missing_days: MissingDayPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonParams {
    pub current_period_type: String,
    pub current_period_value: i32,
    pub current_year: Option<i32>,
    pub previous_period_type: String,
    pub previous_period_value: i32,
    pub previous_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineParams {
    pub end_month: u32,
    pub end_year: i32,
    pub months: Option<usize>,
    /// Comma-separated category ids.
    #[serde(default)]
    pub category_ids: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SankeyView {
    #[default]
    Month,
    Year,
}

#[derive(Debug, Deserialize)]
pub struct SankeyParams {
    pub month: Option<u32>,
    pub year: i32,
    #[serde(default)]
    pub view: SankeyView,
}

/// Income and expense totals per month of `year`, fetched on two blocking
/// tasks that each hold their own pooled connection.
async fn monthly_totals_pair(
    state: &AppState,
    year: i32,
) -> AppResult<(BTreeMap<u32, Decimal>, BTreeMap<u32, Decimal>)> {
    let fetch = |kind: TransactionKind| {
        let db = state.db.clone();
        tokio::task::spawn_blocking(move || -> AppResult<BTreeMap<u32, Decimal>> {
            let conn = db.get()?;
            Ok(transactions::monthly_totals(&conn, kind, year)?)
        })
    };

    let (income, expenses) = tokio::try_join!(
        fetch(TransactionKind::Income),
        fetch(TransactionKind::Expense)
    )
    .map_err(|e| AppError::Internal(format!("Retrieval task failed: {e}")))?;

    Ok((income?, expenses?))
}

pub async fn monthly_overview(
    State(state): State<AppState>,
    Query(params): Query<YearParams>,
) -> AppResult<Json<Vec<MonthlyOverviewPoint>>> {
    let (earned, spent) = monthly_totals_pair(&state, params.year).await?;
    Ok(Json(build_monthly_overview(
        &spent,
        &earned,
        &SHORT_MONTH_NAMES,
    )))
}

pub async fn cash_flow(
    State(state): State<AppState>,
    Query(params): Query<YearParams>,
) -> AppResult<Json<Vec<CashFlowPoint>>> {
    let (income, expenses) = monthly_totals_pair(&state, params.year).await?;
    let series = build_cash_flow(&income, &expenses, &SHORT_MONTH_NAMES);
    tracing::debug!(year = params.year, "Assembled cash flow");
    Ok(Json(series))
}

pub async fn burndown(
    State(state): State<AppState>,
    Query(params): Query<BurndownParams>,
) -> AppResult<Json<Vec<BurndownPoint>>> {
    let category_id = params.category_id.unwrap_or(ALL_CATEGORIES_ID);
    let month_burndown = load_burndown(&state, params.month, params.year)?;

    let category = month_burndown
        .categories
        .iter()
        .find(|c| c.category_id == category_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("No budgeted category {category_id} in this month"))
        })?;

    Ok(Json(build_burndown_series(category, params.missing_days)?))
}

/// `CategoryTotal`s for the categories spent on in `period`, restricted to
/// `active` ids and zero-filled for the ones with nothing in this period.
fn period_totals(
    expense_categories: &[Category],
    active: &BTreeSet<i64>,
    spent: &BTreeMap<i64, Decimal>,
) -> Vec<CategoryTotal> {
    expense_categories
        .iter()
        .filter(|c| active.contains(&c.id))
        .map(|c| {
            let amount = spent.get(&c.id).copied().unwrap_or(Decimal::ZERO);
            let mut total = CategoryTotal::new(c.id, c.name.clone(), amount);
            total.budget = c.budget;
            total
        })
        .collect()
}

pub async fn comparison(
    State(state): State<AppState>,
    Query(params): Query<ComparisonParams>,
) -> AppResult<Json<ComparisonResponse>> {
    let current = params
        .current_period_type
        .parse::<PeriodType>()?
        .resolve(params.current_period_value, params.current_year)?;
    let previous = params
        .previous_period_type
        .parse::<PeriodType>()?
        .resolve(params.previous_period_value, params.previous_year)?;

    let expense_categories = state.cached_categories(CategoryKind::Expense)?;
    let conn = state.db.get()?;
    let current_spent = transactions::totals_by_category(
        &conn,
        TransactionKind::Expense,
        &TransactionFilter::for_period(current)?,
    )?;
    let previous_spent = transactions::totals_by_category(
        &conn,
        TransactionKind::Expense,
        &TransactionFilter::for_period(previous)?,
    )?;

    // Categories untouched in both periods get no row.
    let active: BTreeSet<i64> = current_spent
        .iter()
        .chain(previous_spent.iter())
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(id, _)| *id)
        .collect();

    let rows = build_comparison_series(
        &period_totals(&expense_categories, &active, &current_spent),
        &period_totals(&expense_categories, &active, &previous_spent),
    );
    Ok(Json(summarize_comparison(
        current.label(),
        previous.label(),
        rows,
    )))
}

fn parse_category_ids(raw: &str) -> AppResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::Validation(format!("Invalid category id '{s}'")))
        })
        .collect()
}

pub async fn timeline(
    State(state): State<AppState>,
    Query(params): Query<TimelineParams>,
) -> AppResult<Json<Vec<TimelinePoint>>> {
    // Validates the end month.
    PeriodKey::month(params.end_year, params.end_month)?;

    let months = params.months.unwrap_or(DEFAULT_TIMELINE_MONTHS);
    if !(1..=MAX_TIMELINE_MONTHS).contains(&months) {
        return Err(AppError::Validation(format!(
            "months must be between 1 and {MAX_TIMELINE_MONTHS}"
        )));
    }
    let category_ids = parse_category_ids(&params.category_ids)?;
    let window = months_ending_at(params.end_year, params.end_month, months);

    let mut totals = BTreeMap::new();
    if !category_ids.is_empty() {
        let conn = state.db.get()?;
        for period in &window {
            let by_category = transactions::totals_by_category(
                &conn,
                TransactionKind::Expense,
                &TransactionFilter::for_period(*period)?,
            )?;
            for id in &category_ids {
                if let Some(amount) = by_category.get(id) {
                    totals.insert((*id, *period), *amount);
                }
            }
        }
    }

    Ok(Json(build_category_timeline(&window, &category_ids, &totals)))
}

pub async fn sankey(
    State(state): State<AppState>,
    Query(params): Query<SankeyParams>,
) -> AppResult<Json<FlowGraph>> {
    let period = match params.view {
        SankeyView::Month => {
            let month = params.month.ok_or_else(|| {
                AppError::Validation("month is required for the monthly view".into())
            })?;
            PeriodKey::month(params.year, month)?
        }
        SankeyView::Year => PeriodKey::year(params.year),
    };

    let expense_categories = state.cached_categories(CategoryKind::Expense)?;
    let conn = state.db.get()?;
    let expenses = transactions::list_transactions(
        &conn,
        TransactionKind::Expense,
        &TransactionFilter::for_period(period)?,
    )?;

    let mut by_category: BTreeMap<i64, Decimal> = BTreeMap::new();
    for expense in &expenses {
        *by_category
            .entry(expense.category_id)
            .or_insert(Decimal::ZERO) += expense.amount;
    }

    let category_amounts: Vec<CategoryAmount> = expense_categories
        .iter()
        .map(|c| CategoryAmount {
            category_id: c.id,
            name: c.name.clone(),
            amount: by_category.get(&c.id).copied().unwrap_or(Decimal::ZERO),
        })
        .collect();
    let total_spent: Decimal = by_category.values().copied().sum();

    let leaves: Option<Vec<LeafRecord>> = (params.view == SankeyView::Month).then(|| {
        expenses
            .iter()
            .map(|e| LeafRecord {
                name: if e.name.is_empty() {
                    format!("Expense {}", e.id)
                } else {
                    e.name.clone()
                },
                category_id: e.category_id,
                amount: e.amount,
            })
            .collect()
    });

    Ok(Json(build_flow_graph(
        total_spent,
        &category_amounts,
        leaves.as_deref(),
    )))
}
