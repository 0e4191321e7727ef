use axum::extract::State;
use axum::response::Json;

use crate::error::{AppError, AppResult};
use crate::models::Profile;
use crate::state::AppState;

pub async fn show(State(state): State<AppState>) -> AppResult<Json<Profile>> {
    let profile = state.profile()?;
    Ok(Json(Profile::clone(&profile)))
}

pub async fn update(
    State(state): State<AppState>,
    Json(profile): Json<Profile>,
) -> AppResult<Json<Profile>> {
    if profile.username.trim().is_empty() {
        return Err(AppError::Validation("Username cannot be empty".into()));
    }
    if profile.currency.trim().is_empty() {
        return Err(AppError::Validation("Currency cannot be empty".into()));
    }

    let snapshot = state.cache.store_profile(&state.db, profile)?;
    Ok(Json(Profile::clone(&snapshot)))
}
