use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::date_utils::{parse_date, PeriodKey};
use crate::db::queries::transactions::{self, TransactionFilter};
use crate::db::queries::{categories, tags};
use crate::error::{AppError, AppResult};
use crate::models::{
    cents_to_decimal, decimal_to_cents, CategoryKind, NewTransaction, Transaction, TransactionKind,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSpentParams {
    pub month: u32,
    pub year: i32,
    pub category_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSpent {
    pub month: u32,
    pub year: i32,
    pub category_id: Option<i64>,
    pub total: Decimal,
}

fn category_kind(kind: TransactionKind) -> CategoryKind {
    match kind {
        TransactionKind::Expense => CategoryKind::Expense,
        TransactionKind::Income => CategoryKind::Income,
    }
}

fn add(
    state: &AppState,
    kind: TransactionKind,
    mut new: NewTransaction,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    new.name = new.name.trim().to_string();
    if new.name.is_empty() {
        return Err(AppError::Validation("Name cannot be empty".into()));
    }
    let amount_cents = match decimal_to_cents(new.amount) {
        Some(cents) if cents > 0 => cents,
        Some(_) => return Err(AppError::Validation("Amount must be positive".into())),
        None => {
            return Err(AppError::Validation(format!(
                "Amount {} is out of range",
                new.amount
            )))
        }
    };
    if parse_date(&new.date).is_none() {
        return Err(AppError::Validation(format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            new.date
        )));
    }

    let conn = state.db.get()?;

    match categories::get_category(&conn, new.category_id)? {
        Some(c) if c.kind == category_kind(kind) => {}
        _ => {
            return Err(AppError::Validation(format!(
                "Category {} is not a valid {} category",
                new.category_id,
                category_kind(kind).as_str()
            )))
        }
    }
    if let Some(tag_id) = new.tag_id {
        if tags::get_tag(&conn, tag_id)?.is_none() {
            return Err(AppError::Validation(format!("Tag {tag_id} does not exist")));
        }
    }

    let id = transactions::create_transaction(&conn, kind, &new)?;

    Ok((
        StatusCode::CREATED,
        Json(Transaction {
            id,
            category_id: new.category_id,
            name: new.name,
            amount: cents_to_decimal(amount_cents),
            date: new.date,
            description: new.description,
            tag_id: new.tag_id,
        }),
    ))
}

fn monthly(
    state: &AppState,
    kind: TransactionKind,
    month: u32,
    year: i32,
) -> AppResult<Json<Vec<Transaction>>> {
    let filter = TransactionFilter::for_period(PeriodKey::month(year, month)?)?;
    let conn = state.db.get()?;
    Ok(Json(transactions::list_transactions(&conn, kind, &filter)?))
}

pub async fn add_expense(
    State(state): State<AppState>,
    Json(new): Json<NewTransaction>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    add(&state, TransactionKind::Expense, new)
}

pub async fn add_income(
    State(state): State<AppState>,
    Json(new): Json<NewTransaction>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    add(&state, TransactionKind::Income, new)
}

pub async fn monthly_expenses(
    State(state): State<AppState>,
    Path((month, year)): Path<(u32, i32)>,
) -> AppResult<Json<Vec<Transaction>>> {
    monthly(&state, TransactionKind::Expense, month, year)
}

pub async fn monthly_incomes(
    State(state): State<AppState>,
    Path((month, year)): Path<(u32, i32)>,
) -> AppResult<Json<Vec<Transaction>>> {
    monthly(&state, TransactionKind::Income, month, year)
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete(&state, TransactionKind::Expense, id)
}

pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete(&state, TransactionKind::Income, id)
}

fn delete(state: &AppState, kind: TransactionKind, id: i64) -> AppResult<StatusCode> {
    let conn = state.db.get()?;

    if !transactions::delete_transaction(&conn, kind, id)? {
        return Err(AppError::NotFound(format!(
            "{} {id} not found",
            category_kind(kind).as_str()
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn total_spent_monthly(
    State(state): State<AppState>,
    Query(params): Query<TotalSpentParams>,
) -> AppResult<Json<TotalSpent>> {
    let filter = TransactionFilter::for_period(PeriodKey::month(params.year, params.month)?)?
        .with_category(params.category_id);

    let conn = state.db.get()?;
    let total = transactions::total_amount(&conn, TransactionKind::Expense, &filter)?;

    Ok(Json(TotalSpent {
        month: params.month,
        year: params.year,
        category_id: params.category_id,
        total,
    }))
}
