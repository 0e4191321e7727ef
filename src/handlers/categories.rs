use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::db::queries::categories;
use crate::error::{AppError, AppResult};
use crate::handlers::validate_budget;
use crate::models::{Category, CategoryKind, NewCategory};
use crate::state::AppState;

pub async fn expense_index(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.cached_categories(CategoryKind::Expense)?))
}

pub async fn income_index(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.cached_categories(CategoryKind::Income)?))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(category): Json<NewCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    create(&state, CategoryKind::Expense, category)
}

pub async fn create_income(
    State(state): State<AppState>,
    Json(category): Json<NewCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    create(&state, CategoryKind::Income, category)
}

fn create(
    state: &AppState,
    kind: CategoryKind,
    mut category: NewCategory,
) -> AppResult<(StatusCode, Json<Category>)> {
    category.name = category.name.trim().to_string();
    if category.name.is_empty() {
        return Err(AppError::Validation("Category name cannot be empty".into()));
    }
    validate_budget(category.budget)?;

    let existing = state.cached_categories(kind)?;
    if existing
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(&category.name))
    {
        return Err(AppError::Validation(format!(
            "Category '{}' already exists",
            category.name
        )));
    }

    let conn = state.db.get()?;
    let id = categories::create_category(&conn, kind, &category)?;
    let created = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created category".into()))?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete(&state, CategoryKind::Expense, id)
}

pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete(&state, CategoryKind::Income, id)
}

/// Deleting a category also deletes its expenses or incomes.
fn delete(state: &AppState, kind: CategoryKind, id: i64) -> AppResult<StatusCode> {
    let conn = state.db.get()?;

    if !categories::delete_category(&conn, id, kind)? {
        return Err(AppError::NotFound(format!(
            "{} category {id} not found",
            kind.as_str()
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
