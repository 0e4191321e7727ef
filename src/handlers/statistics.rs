use axum::extract::State;
use axum::response::Json;
use chrono::Local;

use crate::db::queries::transactions::{self, TransactionFilter};
use crate::error::AppResult;
use crate::models::{CategoryKind, TransactionKind};
use crate::services::summary::{build_statistical_summary, StatisticalSummary, SummaryInput};
use crate::state::AppState;

pub async fn summary(State(state): State<AppState>) -> AppResult<Json<StatisticalSummary>> {
    let categories = state.cached_categories(CategoryKind::Expense)?;

    let conn = state.db.get()?;
    let all = TransactionFilter::default();
    let expenses = transactions::list_transactions(&conn, TransactionKind::Expense, &all)?;
    let incomes = transactions::list_transactions(&conn, TransactionKind::Income, &all)?;

    let input = SummaryInput {
        expenses: &expenses,
        incomes: &incomes,
        categories: &categories,
    };
    Ok(Json(build_statistical_summary(
        input,
        Local::now().date_naive(),
    )))
}
