use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::db::queries::tags;
use crate::error::{AppError, AppResult};
use crate::models::{NewTag, Tag};
use crate::state::AppState;

pub async fn index(State(state): State<AppState>) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(state.cached_tags()?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(mut new_tag): Json<NewTag>,
) -> AppResult<(StatusCode, Json<Tag>)> {
    new_tag.name = new_tag.name.trim().to_string();
    if new_tag.name.is_empty() {
        return Err(AppError::Validation("Tag name cannot be empty".into()));
    }

    let conn = state.db.get()?;

    if tags::get_tag_by_name(&conn, &new_tag.name)?.is_some() {
        return Err(AppError::Validation(format!(
            "Tag '{}' already exists",
            new_tag.name
        )));
    }

    let id = tags::create_tag(&conn, &new_tag)?;
    let tag = tags::get_tag(&conn, id)?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created tag".into()))?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Tag>> {
    let conn = state.db.get()?;
    let tag = tags::get_tag(&conn, id)?.ok_or_else(|| AppError::NotFound(format!("Tag {id} not found")))?;
    Ok(Json(tag))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut tag): Json<NewTag>,
) -> AppResult<StatusCode> {
    tag.name = tag.name.trim().to_string();
    if tag.name.is_empty() {
        return Err(AppError::Validation("Tag name cannot be empty".into()));
    }

    let conn = state.db.get()?;

    if tags::get_tag(&conn, id)?.is_none() {
        return Err(AppError::NotFound(format!("Tag {id} not found")));
    }
    if let Some(existing) = tags::get_tag_by_name(&conn, &tag.name)? {
        if existing.id != id {
            return Err(AppError::Validation(format!(
                "Tag '{}' already exists",
                tag.name
            )));
        }
    }

    tags::update_tag(&conn, id, &tag)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let conn = state.db.get()?;

    if !tags::delete_tag(&conn, id)? {
        return Err(AppError::NotFound(format!("Tag {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}
