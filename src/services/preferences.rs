use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::{MovieStore, RatingStore},
    error::AppResult,
    models::{Movie, UserId},
};

/// Ratings at or above this score mark a movie as liked
pub const DEFAULT_MIN_RATING: f64 = 4.0;
/// Maximum number of genres in a preference profile
pub const MAX_PREFERRED_GENRES: usize = 5;

/// Derives a user's genre affinity from their rating history
#[derive(Clone)]
pub struct PreferenceProfileBuilder {
    movies: Arc<dyn MovieStore>,
    ratings: Arc<dyn RatingStore>,
    scan_limit: usize,
}

impl PreferenceProfileBuilder {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        scan_limit: usize,
    ) -> Self {
        Self {
            movies,
            ratings,
            scan_limit,
        }
    }

    /// Movies the user rated at least `min_rating`, in rating order.
    ///
    /// A movie rated more than once appears once. Ratings pointing at movies that no
    /// longer exist are skipped.
    pub async fn liked_movies(&self, user_id: &UserId, min_rating: f64) -> AppResult<Vec<Movie>> {
        let ratings = self.ratings.find_ratings_by_user(user_id).await?;

        let mut seen = HashSet::new();
        let mut liked = Vec::new();
        for rating in ratings.iter().filter(|r| r.rating >= min_rating) {
            if !seen.insert(rating.movie_id.canonical()) {
                continue;
            }

            match self.movies.find_movie(&rating.movie_id).await? {
                Some(movie) => liked.push(movie),
                None => {
                    tracing::debug!(movie_id = %rating.movie_id, "Rated movie no longer exists")
                }
            }
        }

        Ok(liked)
    }

    /// Up to five genres the user likes most, most frequent first.
    ///
    /// Falls back to the catalog's most common genres when the user has no rating
    /// of at least [`DEFAULT_MIN_RATING`].
    pub async fn preferred_genres(&self, user_id: &UserId) -> AppResult<Vec<String>> {
        let ratings = self.ratings.find_ratings_by_user(user_id).await?;
        if !ratings.iter().any(|r| r.rating >= DEFAULT_MIN_RATING) {
            tracing::debug!(user_id = %user_id, "No liked movies, using popular genres");
            return self.popular_genres().await;
        }

        let liked = self.liked_movies(user_id, DEFAULT_MIN_RATING).await?;
        Ok(top_genres(&liked, MAX_PREFERRED_GENRES))
    }

    /// Up to five genres that occur most often across the catalog
    pub async fn popular_genres(&self) -> AppResult<Vec<String>> {
        let movies = self.movies.find_all_movies(self.scan_limit).await?;
        Ok(top_genres(&movies, MAX_PREFERRED_GENRES))
    }
}

/// Counts genre occurrences and returns the `k` most frequent.
///
/// Ties keep the order in which the genres were first seen.
pub fn top_genres(movies: &[Movie], k: usize) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for genre in movies.iter().flat_map(|m| m.genres.iter()) {
        let count = counts.entry(genre.as_str()).or_insert_with(|| {
            order.push(genre.as_str());
            0
        });
        *count += 1;
    }

    // stable sort, first-seen order breaks ties
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.into_iter().take(k).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{InMemoryStore, MockMovieStore, MockRatingStore},
        error::AppError,
        models::{MovieId, Rating},
    };

    async fn store_with_catalog() -> InMemoryStore {
        let store = InMemoryStore::new();
        let catalog = [
            Movie::new("inception", "Inception", &["Action", "Sci-Fi"], "Christopher Nolan", &[]),
            Movie::new("memento", "Memento", &["Mystery", "Thriller"], "Christopher Nolan", &[]),
            Movie::new("heat", "Heat", &["Action", "Crime", "Thriller"], "Michael Mann", &[]),
            Movie::new("notebook", "The Notebook", &["Romance", "Drama"], "Nick Cassavetes", &[]),
            Movie::new("alien", "Alien", &["Sci-Fi", "Horror"], "Ridley Scott", &[]),
            Movie::new("up", "Up", &["Animation", "Comedy"], "Pete Docter", &[]),
        ];
        for movie in catalog {
            store.insert_movie(movie).await;
        }
        store
    }

    async fn rate(store: &InMemoryStore, user: &str, movie: &str, score: f64) {
        store
            .insert_raw_rating(Rating::new(UserId::new(user), MovieId::new(movie), score))
            .await;
    }

    fn builder(store: &InMemoryStore) -> PreferenceProfileBuilder {
        let store = Arc::new(store.clone());
        PreferenceProfileBuilder::new(store.clone(), store, 1000)
    }

    #[tokio::test]
    async fn test_liked_movies_filters_by_threshold() {
        let store = store_with_catalog().await;
        rate(&store, "ana", "inception", 5.0).await;
        rate(&store, "ana", "notebook", 2.0).await;
        rate(&store, "ana", "heat", 4.0).await;

        let liked = builder(&store)
            .liked_movies(&UserId::new("ana"), DEFAULT_MIN_RATING)
            .await
            .unwrap();
        let titles: Vec<&str> = liked.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Inception", "Heat"]);
    }

    #[tokio::test]
    async fn test_liked_movies_skips_missing_and_duplicate_movies() {
        let store = store_with_catalog().await;
        rate(&store, "ana", "deleted", 5.0).await;
        rate(&store, "ana", "memento", 4.5).await;
        rate(&store, "ana", "memento", 5.0).await;

        let liked = builder(&store)
            .liked_movies(&UserId::new("ana"), DEFAULT_MIN_RATING)
            .await
            .unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].title, "Memento");
    }

    #[tokio::test]
    async fn test_preferred_genres_counts_liked_movies() {
        let store = store_with_catalog().await;
        rate(&store, "ana", "inception", 5.0).await;
        rate(&store, "ana", "heat", 4.0).await;
        rate(&store, "ana", "alien", 4.5).await;
        rate(&store, "ana", "notebook", 1.0).await;

        let genres = builder(&store)
            .preferred_genres(&UserId::new("ana"))
            .await
            .unwrap();
        assert_eq!(genres, vec!["Action", "Sci-Fi", "Crime", "Thriller", "Horror"]);
    }

    #[tokio::test]
    async fn test_preferred_genres_falls_back_to_popular() {
        let store = store_with_catalog().await;
        rate(&store, "ana", "notebook", 3.5).await;

        let builder = builder(&store);
        let genres = builder.preferred_genres(&UserId::new("ana")).await.unwrap();
        assert_eq!(genres, builder.popular_genres().await.unwrap());
        assert_eq!(genres.len(), MAX_PREFERRED_GENRES);
        assert_eq!(&genres[..3], &["Action", "Sci-Fi", "Thriller"]);
    }

    #[tokio::test]
    async fn test_preferred_genres_for_unknown_user_on_empty_catalog() {
        let store = InMemoryStore::new();
        let genres = builder(&store)
            .preferred_genres(&UserId::new("nobody"))
            .await
            .unwrap();
        assert!(genres.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut ratings = MockRatingStore::new();
        ratings
            .expect_find_ratings_by_user()
            .returning(|_| Err(AppError::Internal("store unreachable".into())));

        let builder =
            PreferenceProfileBuilder::new(Arc::new(MockMovieStore::new()), Arc::new(ratings), 10);
        let result = builder.liked_movies(&UserId::new("ana"), 4.0).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_top_genres_breaks_ties_by_first_appearance() {
        let movies = [
            Movie::new("a", "A", &["Drama", "Comedy"], "", &[]),
            Movie::new("b", "B", &["Comedy", "Western"], "", &[]),
            Movie::new("c", "C", &["Western", "Drama"], "", &[]),
        ];
        assert_eq!(top_genres(&movies, 5), vec!["Drama", "Comedy", "Western"]);
        assert_eq!(top_genres(&movies, 1), vec!["Drama"]);
    }
}
