use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{NewUser, User, UserId},
    routes::AppState,
};

const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<User>>> {
    let users = state
        .catalog
        .list_users(params.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(users))
}

/// Registers a user record
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.catalog.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> AppResult<Json<User>> {
    Ok(Json(state.catalog.get_user(&id).await?))
}
