use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{canonical_movie_refs, MovieStore, RatingStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        canonical_ref, Movie, MovieId, MovieStats, NewMovie, NewRating, NewUser, Rating, User,
        UserId,
    },
};

/// Store kept entirely in process memory
///
/// Cloning is cheap and every clone shares the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// Catalog order is insertion order
    movies: Vec<Movie>,
    ratings: Vec<Rating>,
    /// Registration order
    users: Vec<User>,
}

impl Inner {
    fn find_user(&self, id: &UserId) -> Option<&User> {
        let key = id.canonical();
        self.users.iter().find(|u| u.id.canonical() == key)
    }

    fn stats_for(&self, movie: &Movie) -> MovieStats {
        let key = canonical_ref(movie.id.as_str());
        let scores: Vec<f64> = self
            .ratings
            .iter()
            .filter(|r| canonical_ref(r.movie_id.as_str()) == key)
            .map(|r| r.rating)
            .collect();

        let avg_rating = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        MovieStats {
            movie: movie.clone(),
            review_count: scores.len(),
            avg_rating,
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a movie with a caller-chosen identifier
    pub async fn insert_movie(&self, movie: Movie) {
        self.inner.write().await.movies.push(movie);
    }

    pub async fn insert_user(&self, user: User) {
        self.inner.write().await.users.push(user);
    }

    /// Stores a rating exactly as given, without normalizing its references
    pub async fn insert_raw_rating(&self, rating: Rating) {
        self.inner.write().await.ratings.push(rating);
    }
}

#[async_trait]
impl MovieStore for InMemoryStore {
    async fn find_movie(&self, id: &MovieId) -> AppResult<Option<Movie>> {
        let key = id.canonical();
        let inner = self.inner.read().await;
        Ok(inner
            .movies
            .iter()
            .find(|m| canonical_ref(m.id.as_str()) == key)
            .cloned())
    }

    async fn find_all_movies(&self, limit: usize) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().take(limit).cloned().collect())
    }

    async fn find_movies_by_genres(
        &self,
        genres: &[String],
        exclude: &[MovieId],
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let excluded: HashSet<String> = canonical_movie_refs(exclude).into_iter().collect();
        let inner = self.inner.read().await;

        let mut matches: Vec<MovieStats> = inner
            .movies
            .iter()
            .filter(|m| !excluded.contains(&canonical_ref(m.id.as_str())))
            .filter(|m| m.genres.iter().any(|g| genres.contains(g)))
            .map(|m| inner.stats_for(m))
            .collect();

        // Unrated movies sort after rated ones
        matches.sort_by(|a, b| {
            let a_avg = a.avg_rating.unwrap_or(f64::NEG_INFINITY);
            let b_avg = b.avg_rating.unwrap_or(f64::NEG_INFINITY);
            b_avg
                .partial_cmp(&a_avg)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.review_count.cmp(&a.review_count))
        });

        Ok(matches.into_iter().take(limit).map(|s| s.movie).collect())
    }

    async fn movie_stats(&self) -> AppResult<Vec<MovieStats>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().map(|m| inner.stats_for(m)).collect())
    }

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let movie = Movie {
            id: MovieId::from(Uuid::new_v4()),
            title: movie.title,
            genres: movie.genres,
            director: movie.director,
            actors: movie.actors,
        };
        self.inner.write().await.movies.push(movie.clone());
        Ok(movie)
    }
}

#[async_trait]
impl RatingStore for InMemoryStore {
    async fn find_ratings_by_user_ref(&self, user_ref: &str) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|r| r.user_id.as_str() == user_ref)
            .cloned()
            .collect())
    }

    async fn find_ratings_by_movie(&self, movie_id: &MovieId) -> AppResult<Vec<Rating>> {
        let key = movie_id.canonical();
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|r| canonical_ref(r.movie_id.as_str()) == key)
            .cloned()
            .collect())
    }

    async fn create_rating(&self, rating: NewRating) -> AppResult<Rating> {
        let user_ref = rating.user_id.canonical();
        let movie_ref = rating.movie_id.canonical();

        let mut inner = self.inner.write().await;
        let duplicate = inner.ratings.iter().any(|r| {
            canonical_ref(r.user_id.as_str()) == user_ref
                && canonical_ref(r.movie_id.as_str()) == movie_ref
        });
        if duplicate {
            return Err(AppError::InvalidInput(format!(
                "User {} has already reviewed movie {}",
                user_ref, movie_ref
            )));
        }

        let rating = Rating {
            id: Uuid::new_v4(),
            user_id: UserId::new(user_ref),
            movie_id: MovieId::new(movie_ref),
            rating: rating.rating,
            comment: rating.comment,
            created_at: Utc::now(),
        };
        inner.ratings.push(rating.clone());
        Ok(rating)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: &UserId) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.find_user(id).cloned())
    }

    async fn find_all_users(&self, limit: usize) -> AppResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().take(limit).cloned().collect())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::InvalidInput(format!(
                "Username {} is already taken",
                user.username
            )));
        }
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::InvalidInput(format!(
                "Email {} is already registered",
                user.email
            )));
        }

        let user = User {
            id: UserId::from(Uuid::new_v4()),
            username: user.username,
            email: user.email,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }
}
