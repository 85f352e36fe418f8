use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    db::{MovieStore, RatingStore, UserStore},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{Catalog, RecommendationService},
};

pub mod movies;
pub mod recommendations;
pub mod users;

/// Shared handler state
pub struct AppState {
    pub catalog: Catalog,
    pub recommendations: RecommendationService,
}

impl AppState {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        users: Arc<dyn UserStore>,
        scan_limit: usize,
    ) -> Self {
        Self {
            catalog: Catalog::new(movies.clone(), ratings.clone(), users.clone()),
            recommendations: RecommendationService::new(movies, ratings, users, scan_limit),
        }
    }

    /// State over a single store implementing every persistence trait
    pub fn from_store<S>(store: S, scan_limit: usize) -> Self
    where
        S: MovieStore + RatingStore + UserStore + 'static,
    {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store, scan_limit)
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Movies
        .route("/movies", get(movies::list).post(movies::create))
        .route("/movies/popular", get(recommendations::popular))
        .route("/movies/:id", get(movies::get))
        .route("/movies/:id/similar", get(recommendations::similar))
        .route("/movies/:id/reviews", get(movies::reviews))
        // Reviews
        .route("/reviews", post(movies::create_review))
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get))
        .route("/users/:id/recommendations", get(recommendations::for_user))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
