use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{Movie, MovieId, UserId},
    routes::AppState,
    services::{content_based, PopularityOrder},
};

const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;
const DEFAULT_SIMILAR_LIMIT: usize = 5;

/// Which recommender serves a user request
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Genre,
    Content,
}

#[derive(Debug, Deserialize)]
pub struct UserRecommendationQuery {
    limit: Option<usize>,
    #[serde(default)]
    strategy: Strategy,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    limit: Option<usize>,
    #[serde(default)]
    order: PopularityOrder,
}

/// Recommendations for an existing user.
///
/// An unknown user is a 404. Failures while recommending are logged and answered
/// with an empty list.
pub async fn for_user(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Query(params): Query<UserRecommendationQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    state.catalog.get_user(&user_id).await?;

    let limit = params.limit.unwrap_or(match params.strategy {
        Strategy::Genre => DEFAULT_RECOMMENDATION_LIMIT,
        Strategy::Content => content_based::DEFAULT_LIMIT,
    });
    let service = &state.recommendations;
    let result = match params.strategy {
        Strategy::Genre => service.get_recommendations_for_user(&user_id, limit).await,
        Strategy::Content => {
            service
                .get_content_based_recommendations(&user_id, limit)
                .await
        }
    };

    let movies = match result {
        Ok(movies) => movies,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                user_id = %user_id,
                error = %e,
                "Recommendation failed"
            );
            Vec::new()
        }
    };

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        strategy = ?params.strategy,
        count = movies.len(),
        "Served recommendations"
    );
    Ok(Json(movies))
}

/// Movies similar to an existing movie; 404 when the movie is unknown
pub async fn similar(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<MovieId>,
    Query(params): Query<SimilarQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    state.catalog.get_movie(&movie_id).await?;

    let movies = state
        .recommendations
        .get_similar_movies(&movie_id, params.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT))
        .await?;
    Ok(Json(movies))
}

pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state
        .recommendations
        .get_popular_movies_by(
            params.order,
            params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT),
        )
        .await?;
    Ok(Json(movies))
}
