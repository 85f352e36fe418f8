//! Persistence collaborators consumed by the recommendation core.
//!
//! Every component receives its store handles explicitly; there is no process-wide client.

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        canonical_ref, Movie, MovieId, MovieStats, NewMovie, NewRating, NewUser, Rating, User,
        UserId,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{create_pool, PgStore};

/// Read/write access to the movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Fetch a single movie; malformed identifiers resolve to `None`
    async fn find_movie(&self, id: &MovieId) -> AppResult<Option<Movie>>;

    /// Fetch up to `limit` movies in catalog order
    async fn find_all_movies(&self, limit: usize) -> AppResult<Vec<Movie>>;

    /// Movies having at least one of `genres` and not listed in `exclude`,
    /// best rated first, at most `limit`
    async fn find_movies_by_genres(
        &self,
        genres: &[String],
        exclude: &[MovieId],
        limit: usize,
    ) -> AppResult<Vec<Movie>>;

    /// Every movie joined with its rating count and mean rating, in catalog order
    async fn movie_stats(&self) -> AppResult<Vec<MovieStats>>;

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie>;
}

/// Read/write access to ratings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Ratings whose stored user reference equals `user_ref` exactly
    async fn find_ratings_by_user_ref(&self, user_ref: &str) -> AppResult<Vec<Rating>>;

    /// Ratings of a movie, matched on the canonical form of the stored reference
    async fn find_ratings_by_movie(&self, movie_id: &MovieId) -> AppResult<Vec<Rating>>;

    /// Persist a rating; references are stored in canonical form.
    ///
    /// A second rating of the same movie by the same user is `InvalidInput`.
    async fn create_rating(&self, rating: NewRating) -> AppResult<Rating>;

    /// All ratings written by a user.
    ///
    /// Older rows may carry the user reference in a non-canonical textual form, so
    /// the canonical form is tried first and the raw form second.
    async fn find_ratings_by_user(&self, user_id: &UserId) -> AppResult<Vec<Rating>> {
        let canonical = user_id.canonical();
        let ratings = self.find_ratings_by_user_ref(&canonical).await?;
        if !ratings.is_empty() || canonical == user_id.as_str() {
            return Ok(ratings);
        }

        tracing::debug!(user_id = %user_id, "No ratings under canonical reference, trying raw form");
        self.find_ratings_by_user_ref(user_id.as_str()).await
    }
}

/// Read/write access to users
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &UserId) -> AppResult<Option<User>>;

    /// Up to `limit` users in registration order
    async fn find_all_users(&self, limit: usize) -> AppResult<Vec<User>>;

    /// Register a user; a taken username or email is `InvalidInput`
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
}

/// Canonical forms of a set of movie references, for exclusion filters
pub fn canonical_movie_refs(ids: &[MovieId]) -> Vec<String> {
    ids.iter().map(|id| canonical_ref(id.as_str())).collect()
}
