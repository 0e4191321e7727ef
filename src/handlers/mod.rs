pub mod budget;
pub mod categories;
pub mod charts;
pub mod export;
pub mod profile;
pub mod statistics;
pub mod tags;
pub mod transactions;

use axum::routing::{delete, get, post, put};
use axum::Router;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::models::decimal_to_cents;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Profile
        .route("/user/data", get(profile::show))
        .route("/user/update", post(profile::update))
        // Tags
        .route("/tags", get(tags::index))
        .route("/tags/create", post(tags::create))
        .route("/tags/:id", get(tags::show).delete(tags::delete))
        .route("/tags/update/:id", put(tags::update))
        // Categories
        .route("/category/expense/all", get(categories::expense_index))
        .route("/category/expense/create", post(categories::create_expense))
        .route(
            "/category/expense/delete/:id",
            delete(categories::delete_expense),
        )
        .route("/category/income/all", get(categories::income_index))
        .route("/category/income/create", post(categories::create_income))
        .route(
            "/category/income/delete/:id",
            delete(categories::delete_income),
        )
        // Budget
        .route("/budget", get(budget::index))
        .route("/budget/modify", post(budget::modify))
        .route("/budget/burndown", get(budget::burndown))
        // Expenses and incomes
        .route("/expenses/add", post(transactions::add_expense))
        .route(
            "/expenses/monthly/:month/:year",
            get(transactions::monthly_expenses),
        )
        .route("/expenses/delete/:id", delete(transactions::delete_expense))
        .route(
            "/expenses/total-spent/monthly",
            get(transactions::total_spent_monthly),
        )
        .route("/incomes/add", post(transactions::add_income))
        .route(
            "/incomes/monthly/:month/:year",
            get(transactions::monthly_incomes),
        )
        .route("/incomes/delete/:id", delete(transactions::delete_income))
        // Charts (JSON series ready to render)
        .route("/api/charts/monthly-overview", get(charts::monthly_overview))
        .route("/api/charts/cash-flow", get(charts::cash_flow))
        .route("/api/charts/burndown", get(charts::burndown))
        .route("/api/charts/comparison", get(charts::comparison))
        .route("/api/charts/timeline", get(charts::timeline))
        .route("/api/charts/sankey", get(charts::sankey))
        // Statistics
        .route("/statistics/summary", get(statistics::summary))
        // Data export
        .route("/export", get(export::export_all))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}

/// A budget must be non-negative and storable as cents.
pub(crate) fn validate_budget(budget: Decimal) -> AppResult<()> {
    match decimal_to_cents(budget) {
        Some(cents) if cents >= 0 => Ok(()),
        Some(_) => Err(AppError::Validation("Budget cannot be negative".into())),
        None => Err(AppError::Validation(format!("Budget {budget} is out of range"))),
    }
}
