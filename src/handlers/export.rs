use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::db::queries::transactions::{self, TransactionFilter};
use crate::error::{AppError, AppResult};
use crate::models::{Category, CategoryKind, Profile, Tag, Transaction, TransactionKind};
use crate::state::AppState;
use crate::VERSION;

pub const EXPORT_TYPE: &str = "spendwise-export";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportHeader {
    pub version: String,
    pub export_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBody {
    pub profile: Profile,
    pub expenses: Vec<Transaction>,
    pub incomes: Vec<Transaction>,
    pub expense_categories: Vec<Category>,
    pub income_categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
pub struct ExportEnvelope {
    pub header: ExportHeader,
    pub body: ExportBody,
}

/// Everything the user owns as one downloadable JSON document.
pub async fn export_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let profile = Profile::clone(&*state.profile()?);
    let expense_categories = state.cached_categories(CategoryKind::Expense)?;
    let income_categories = state.cached_categories(CategoryKind::Income)?;
    let tags = state.cached_tags()?;

    let conn = state.db.get()?;
    let all = TransactionFilter::default();
    let expenses = transactions::list_transactions(&conn, TransactionKind::Expense, &all)?;
    let incomes = transactions::list_transactions(&conn, TransactionKind::Income, &all)?;

    tracing::info!(
        expenses = expenses.len(),
        incomes = incomes.len(),
        "Exporting all data"
    );

    let envelope = ExportEnvelope {
        header: ExportHeader {
            version: VERSION.to_string(),
            export_type: EXPORT_TYPE.to_string(),
        },
        body: ExportBody {
            profile,
            expenses,
            incomes,
            expense_categories,
            income_categories,
            tags,
        },
    };

    let json = serde_json::to_string_pretty(&envelope)
        .map_err(|e| AppError::Internal(format!("Failed to serialize: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"spendwise-export.json\"",
            ),
        ],
        json,
    ))
}
