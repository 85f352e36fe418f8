use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{canonical_movie_refs, MovieStore, RatingStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, MovieStats, NewMovie, NewRating, NewUser, Rating, User, UserId},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    title: String,
    genres: Vec<String>,
    director: String,
    actors: Vec<String>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: MovieId::from(row.id),
            title: row.title,
            genres: row.genres,
            director: row.director,
            actors: row.actors,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MovieStatsRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    review_count: i64,
    avg_rating: Option<f64>,
}

impl From<MovieStatsRow> for MovieStats {
    fn from(row: MovieStatsRow) -> Self {
        MovieStats {
            movie: row.movie.into(),
            review_count: row.review_count.max(0) as usize,
            avg_rating: row.avg_rating,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_ref: String,
    movie_ref: String,
    rating: f64,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Rating {
    fn from(row: ReviewRow) -> Self {
        Rating {
            id: row.id,
            user_id: UserId::new(row.user_ref),
            movie_id: MovieId::new(row.movie_ref),
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from(row.id),
            username: row.username,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

/// Store backed by PostgreSQL
///
/// Review rows keep their user and movie references as text because rows written
/// before references were normalized may hold a non-canonical form. Movie-side joins
/// and the per-movie lookup go through the `canonical_ref` SQL function, so such rows
/// count the same as they do in [`InMemoryStore`](super::InMemoryStore).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Name of the violated constraint when `e` is a unique violation
fn violated_unique_constraint(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn find_movie(&self, id: &MovieId) -> AppResult<Option<Movie>> {
        let Some(native) = id.native() else {
            tracing::debug!(movie_id = %id, "Malformed movie id, treating as no match");
            return Ok(None);
        };

        let row = sqlx::query_as::<_, MovieRow>(
            r#"
            SELECT id, title, genres, director, actors
            FROM movies
            WHERE id = $1
            "#,
        )
        .bind(native)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Movie::from))
    }

    async fn find_all_movies(&self, limit: usize) -> AppResult<Vec<Movie>> {
        let rows = sqlx::query_as::<_, MovieRow>(
            r#"
            SELECT id, title, genres, director, actors
            FROM movies
            ORDER BY created_at, id
            LIMIT $1
            "#,
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn find_movies_by_genres(
        &self,
        genres: &[String],
        exclude: &[MovieId],
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let rows = sqlx::query_as::<_, MovieRow>(
            r#"
            SELECT m.id, m.title, m.genres, m.director, m.actors
            FROM movies m
            LEFT JOIN reviews r ON canonical_ref(r.movie_ref) = m.id::text
            WHERE m.genres && $1
              AND NOT (m.id::text = ANY($2))
            GROUP BY m.id
            ORDER BY AVG(r.rating) DESC NULLS LAST, COUNT(r.id) DESC, m.created_at, m.id
            LIMIT $3
            "#,
        )
        .bind(genres.to_vec())
        .bind(canonical_movie_refs(exclude))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn movie_stats(&self) -> AppResult<Vec<MovieStats>> {
        let rows = sqlx::query_as::<_, MovieStatsRow>(
            r#"
            SELECT m.id, m.title, m.genres, m.director, m.actors,
                   COUNT(r.id) AS review_count,
                   AVG(r.rating) AS avg_rating
            FROM movies m
            LEFT JOIN reviews r ON canonical_ref(r.movie_ref) = m.id::text
            GROUP BY m.id
            ORDER BY m.created_at, m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MovieStats::from).collect())
    }

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let row = sqlx::query_as::<_, MovieRow>(
            r#"
            INSERT INTO movies (id, title, genres, director, actors)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, genres, director, actors
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&movie.title)
        .bind(&movie.genres)
        .bind(&movie.director)
        .bind(&movie.actors)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

#[async_trait]
impl RatingStore for PgStore {
    async fn find_ratings_by_user_ref(&self, user_ref: &str) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, user_ref, movie_ref, rating, comment, created_at
            FROM reviews
            WHERE user_ref = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_ref)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn find_ratings_by_movie(&self, movie_id: &MovieId) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, user_ref, movie_ref, rating, comment, created_at
            FROM reviews
            WHERE canonical_ref(movie_ref) = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(movie_id.canonical())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn create_rating(&self, rating: NewRating) -> AppResult<Rating> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (id, user_ref, movie_ref, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_ref, movie_ref, rating, comment, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(rating.user_id.canonical())
        .bind(rating.movie_id.canonical())
        .bind(rating.rating)
        .bind(&rating.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violated_unique_constraint(&e) {
            Some(_) => AppError::InvalidInput(format!(
                "User {} has already reviewed movie {}",
                rating.user_id, rating.movie_id
            )),
            None => AppError::Database(e),
        })?;

        Ok(row.into())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: &UserId) -> AppResult<Option<User>> {
        let Some(native) = id.native() else {
            tracing::debug!(user_id = %id, "Malformed user id, treating as no match");
            return Ok(None);
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(native)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_all_users(&self, limit: usize) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            ORDER BY created_at, id
            LIMIT $1
            "#,
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violated_unique_constraint(&e).as_deref() {
            Some("users_username_key") => {
                AppError::InvalidInput(format!("Username {} is already taken", user.username))
            }
            Some(_) => AppError::InvalidInput(format!("Email {} is already registered", user.email)),
            None => AppError::Database(e),
        })?;

        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(10), 10);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert_eq!(violated_unique_constraint(&sqlx::Error::RowNotFound), None);
    }

    #[test]
    fn test_review_row_keeps_stored_references() {
        let row = ReviewRow {
            id: Uuid::new_v4(),
            user_ref: "LEGACY-USER".to_string(),
            movie_ref: "legacy-movie".to_string(),
            rating: 4.0,
            comment: None,
            created_at: Utc::now(),
        };

        let rating: Rating = row.into();
        assert_eq!(rating.user_id.as_str(), "LEGACY-USER");
        assert_eq!(rating.movie_id.as_str(), "legacy-movie");
    }
}
