use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{Movie, MovieId, NewMovie, NewRating, Rating},
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
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state
        .catalog
        .list_movies(params.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(movies))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.catalog.get_movie(&id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<NewMovie>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    tracing::info!(request_id = %request_id, title = %request.title, "Creating movie");
    let movie = state.catalog.create_movie(request).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<NewRating>,
) -> AppResult<(StatusCode, Json<Rating>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %request.user_id,
        movie_id = %request.movie_id,
        "Creating review"
    );
    let review = state.catalog.create_review(request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Reviews of a movie; 404 when the movie is unknown
pub async fn reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> AppResult<Json<Vec<Rating>>> {
    Ok(Json(state.catalog.list_reviews_for_movie(&id).await?))
}
