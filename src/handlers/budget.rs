use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::date_utils::PeriodKey;
use crate::db::queries::{categories, transactions};
use crate::db::queries::transactions::TransactionFilter;
use crate::error::{AppError, AppResult};
use crate::handlers::validate_budget;
use crate::models::{Category, CategoryKind, TransactionKind, UpdateBudget};
use crate::services::burndown::{build_budget_burndown, BudgetBurndown};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MonthParams {
    pub month: u32,
    pub year: i32,
}

/// Expense categories that carry a budget.
pub async fn index(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let budgeted = state
        .cached_categories(CategoryKind::Expense)?
        .into_iter()
        .filter(|c| c.budget > Decimal::ZERO)
        .collect();
    Ok(Json(budgeted))
}

pub async fn modify(
    State(state): State<AppState>,
    Json(update): Json<UpdateBudget>,
) -> AppResult<StatusCode> {
    validate_budget(update.new_budget)?;

    let conn = state.db.get()?;
    if !categories::set_budget(&conn, update.category_id, update.new_budget)? {
        return Err(AppError::NotFound(format!(
            "Expense category {} not found",
            update.category_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn burndown(
    State(state): State<AppState>,
    Query(params): Query<MonthParams>,
) -> AppResult<Json<BudgetBurndown>> {
    Ok(Json(load_burndown(&state, params.month, params.year)?))
}

/// Fetch the month's expenses and build the per-category burndown maps.
pub(crate) fn load_burndown(state: &AppState, month: u32, year: i32) -> AppResult<BudgetBurndown> {
    let period = PeriodKey::month(year, month)?;
    let expense_categories = state.cached_categories(CategoryKind::Expense)?;

    let conn = state.db.get()?;
    let expenses = transactions::list_transactions(
        &conn,
        TransactionKind::Expense,
        &TransactionFilter::for_period(period)?,
    )?;

    Ok(build_budget_burndown(
        &expense_categories,
        &expenses,
        month,
        year,
    )?)
}
