use std::sync::Arc;

use crate::{
    db::{MovieStore, RatingStore, UserStore},
    error::{AppError, AppResult},
    models::{Movie, MovieId, NewMovie, NewRating, NewUser, Rating, User, UserId},
};

/// Validated reads and writes of movies, reviews and users
#[derive(Clone)]
pub struct Catalog {
    movies: Arc<dyn MovieStore>,
    ratings: Arc<dyn RatingStore>,
    users: Arc<dyn UserStore>,
}

impl Catalog {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            movies,
            ratings,
            users,
        }
    }

    pub async fn list_movies(&self, limit: usize) -> AppResult<Vec<Movie>> {
        self.movies.find_all_movies(limit).await
    }

    pub async fn get_movie(&self, id: &MovieId) -> AppResult<Movie> {
        self.movies
            .find_movie(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))
    }

    /// Reviews of an existing movie
    pub async fn list_reviews_for_movie(&self, id: &MovieId) -> AppResult<Vec<Rating>> {
        let movie = self.get_movie(id).await?;
        self.ratings.find_ratings_by_movie(&movie.id).await
    }

    pub async fn list_users(&self, limit: usize) -> AppResult<Vec<User>> {
        self.users.find_all_users(limit).await
    }

    pub async fn get_user(&self, id: &UserId) -> AppResult<User> {
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Adds a movie; the title is required and blank genre or actor entries are dropped
    pub async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let title = movie.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Movie title must not be empty".into()));
        }

        let movie = NewMovie {
            title: title.to_string(),
            genres: clean_list(movie.genres),
            director: movie.director.trim().to_string(),
            actors: clean_list(movie.actors),
        };

        let created = self.movies.create_movie(movie).await?;
        tracing::info!(movie_id = %created.id, title = %created.title, "Created movie");
        Ok(created)
    }

    /// Records a review of an existing movie by an existing user.
    ///
    /// Each user reviews a movie at most once.
    pub async fn create_review(&self, review: NewRating) -> AppResult<Rating> {
        if !review.score_in_range() {
            return Err(AppError::InvalidInput(format!(
                "Rating {} is outside 0.0 to 5.0",
                review.rating
            )));
        }

        let user = self.get_user(&review.user_id).await?;
        let movie = self.get_movie(&review.movie_id).await?;

        let review = NewRating {
            user_id: UserId::new(user.id.canonical()),
            movie_id: MovieId::new(movie.id.canonical()),
            ..review
        };

        let created = self.ratings.create_rating(review).await?;
        tracing::info!(
            user_id = %created.user_id,
            movie_id = %created.movie_id,
            rating = created.rating,
            "Created review"
        );
        Ok(created)
    }

    pub async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let username = user.username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("Username must not be empty".into()));
        }

        let email = user.email.trim();
        if !email.contains('@') {
            return Err(AppError::InvalidInput(format!("Invalid email: {}", email)));
        }

        let created = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
            })
            .await?;
        tracing::info!(user_id = %created.id, "Created user");
        Ok(created)
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
