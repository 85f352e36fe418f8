use std::cmp::Ordering;
use std::sync::Arc;

use super::{
    content_based::ContentBasedRecommender,
    preferences::PreferenceProfileBuilder,
    ranking::{self, PopularityOrder},
    similarity,
};
use crate::{
    db::{MovieStore, RatingStore, UserStore},
    error::AppResult,
    models::{Movie, MovieId, UserId},
};

/// Entry point for every recommendation strategy
///
/// Holds its store handles explicitly; each call recomputes from what the stores
/// return at that moment.
#[derive(Clone)]
pub struct RecommendationService {
    movies: Arc<dyn MovieStore>,
    ratings: Arc<dyn RatingStore>,
    users: Arc<dyn UserStore>,
    profile: PreferenceProfileBuilder,
    content: ContentBasedRecommender,
    scan_limit: usize,
}

impl RecommendationService {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        users: Arc<dyn UserStore>,
        scan_limit: usize,
    ) -> Self {
        Self {
            profile: PreferenceProfileBuilder::new(movies.clone(), ratings.clone(), scan_limit),
            content: ContentBasedRecommender::new(movies.clone(), ratings.clone(), scan_limit),
            movies,
            ratings,
            users,
            scan_limit,
        }
    }

    /// Genre-based recommendations for a user
    ///
    /// - unknown user: empty
    /// - no ratings: the popular movies
    /// - otherwise: best rated movies in the user's preferred genres that the user
    ///   has not rated yet
    ///
    /// A failing candidate query is logged and yields an empty list.
    pub async fn get_recommendations_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        if self.users.find_user(user_id).await?.is_none() {
            tracing::debug!(user_id = %user_id, "Unknown user, no recommendations");
            return Ok(Vec::new());
        }

        let ratings = self.ratings.find_ratings_by_user(user_id).await?;
        if ratings.is_empty() {
            tracing::debug!(user_id = %user_id, "No ratings, falling back to popular movies");
            return self.get_popular_movies(limit).await;
        }

        let genres = self.profile.preferred_genres(user_id).await?;
        if genres.is_empty() {
            return Ok(Vec::new());
        }

        let rated: Vec<MovieId> = ratings.into_iter().map(|r| r.movie_id).collect();
        match self
            .movies
            .find_movies_by_genres(&genres, &rated, limit)
            .await
        {
            Ok(movies) => {
                tracing::debug!(user_id = %user_id, count = movies.len(), "Genre recommendations");
                Ok(movies)
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Genre candidate query failed");
                Ok(Vec::new())
            }
        }
    }

    /// TF-IDF recommendations for a user; unknown users get an empty list
    pub async fn get_content_based_recommendations(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        if self.users.find_user(user_id).await?.is_none() {
            tracing::debug!(user_id = %user_id, "Unknown user, no recommendations");
            return Ok(Vec::new());
        }

        self.content.recommend(user_id, limit).await
    }

    /// Movies sharing a genre, the director or an actor with `movie_id`, most similar first.
    ///
    /// The reference movie itself is never returned. An unknown movie yields an empty list.
    pub async fn get_similar_movies(
        &self,
        movie_id: &MovieId,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let Some(reference) = self.movies.find_movie(movie_id).await? else {
            tracing::debug!(movie_id = %movie_id, "Unknown movie, no similar movies");
            return Ok(Vec::new());
        };

        let reference_id = reference.id.canonical();
        let mut scored: Vec<(f64, Movie)> = self
            .movies
            .find_all_movies(self.scan_limit)
            .await?
            .into_iter()
            .filter(|m| m.id.canonical() != reference_id)
            .filter(|m| similarity::shares_attribute(&reference, m))
            .map(|m| (similarity::compute_similarity(&reference, &m), m))
            .collect();

        scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, m)| m).collect())
    }

    /// Most reviewed movies, ties broken by mean rating
    pub async fn get_popular_movies(&self, limit: usize) -> AppResult<Vec<Movie>> {
        self.get_popular_movies_by(PopularityOrder::Volume, limit)
            .await
    }

    pub async fn get_popular_movies_by(
        &self,
        order: PopularityOrder,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let stats = self.movies.movie_stats().await?;
        Ok(ranking::rank(stats, order, limit))
    }

    pub fn compute_similarity(&self, a: &Movie, b: &Movie) -> f64 {
        similarity::compute_similarity(a, b)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        db::{InMemoryStore, MockMovieStore, MockRatingStore, MockUserStore},
        error::AppError,
        models::{Rating, User},
    };

    fn user(id: &str) -> User {
        User {
            id: UserId::new(id),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            created_at: Utc::now(),
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let catalog = [
            Movie::new(
                "inception",
                "Inception",
                &["Action", "Sci-Fi"],
                "Christopher Nolan",
                &["Leonardo DiCaprio"],
            ),
            Movie::new(
                "memento",
                "Memento",
                &["Mystery", "Thriller"],
                "Christopher Nolan",
                &["Guy Pearce"],
            ),
            Movie::new(
                "notebook",
                "The Notebook",
                &["Romance"],
                "Nick Cassavetes",
                &["Rachel McAdams"],
            ),
            Movie::new("matrix", "The Matrix", &["Action", "Sci-Fi"], "Wachowskis", &[]),
            Movie::new("heat", "Heat", &["Action", "Crime"], "Michael Mann", &[]),
        ];
        for movie in catalog {
            store.insert_movie(movie).await;
        }
        for id in ["ana", "ben", "cy"] {
            store.insert_user(user(id)).await;
        }
        store
    }

    async fn rate(store: &InMemoryStore, user: &str, movie: &str, score: f64) {
        store
            .insert_raw_rating(Rating::new(UserId::new(user), MovieId::new(movie), score))
            .await;
    }

    fn service(store: &InMemoryStore) -> RecommendationService {
        let store = Arc::new(store.clone());
        RecommendationService::new(store.clone(), store.clone(), store, 1000)
    }

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_cold_start_matches_popular_movies() {
        let store = seeded_store().await;
        rate(&store, "ben", "heat", 4.0).await;
        rate(&store, "cy", "heat", 3.0).await;
        rate(&store, "cy", "notebook", 5.0).await;

        let service = service(&store);
        let recommended = service
            .get_recommendations_for_user(&UserId::new("ana"), 10)
            .await
            .unwrap();
        let popular = service.get_popular_movies(10).await.unwrap();

        assert_eq!(recommended, popular);
        assert_eq!(titles(&popular)[..2], ["Heat", "The Notebook"]);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_nothing() {
        let store = seeded_store().await;
        let service = service(&store);

        let genre = service
            .get_recommendations_for_user(&UserId::new("ghost"), 10)
            .await
            .unwrap();
        let content = service
            .get_content_based_recommendations(&UserId::new("ghost"), 10)
            .await
            .unwrap();
        assert!(genre.is_empty());
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_genre_recommendations_exclude_rated_movies() {
        let store = seeded_store().await;
        rate(&store, "ana", "inception", 5.0).await;
        rate(&store, "ana", "heat", 2.0).await;
        rate(&store, "ben", "matrix", 4.0).await;

        let movies = service(&store)
            .get_recommendations_for_user(&UserId::new("ana"), 10)
            .await
            .unwrap();
        assert_eq!(titles(&movies), vec!["The Matrix"]);
    }

    #[tokio::test]
    async fn test_content_based_recommendations() {
        let store = seeded_store().await;
        rate(&store, "ana", "inception", 5.0).await;

        let movies = service(&store)
            .get_content_based_recommendations(&UserId::new("ana"), 2)
            .await
            .unwrap();
        assert_eq!(movies.len(), 2);
        assert!(!titles(&movies).contains(&"Inception"));
    }

    #[tokio::test]
    async fn test_similar_movies_rank_shared_director_above_unrelated() {
        let store = seeded_store().await;
        rate(&store, "ana", "inception", 5.0).await;

        let movies = service(&store)
            .get_similar_movies(&MovieId::new("inception"), 5)
            .await
            .unwrap();

        // Matrix shares both genres, Memento the director, Heat one genre
        assert_eq!(titles(&movies), vec!["The Matrix", "Memento", "Heat"]);
    }

    #[tokio::test]
    async fn test_similar_movies_for_unknown_movie() {
        let store = seeded_store().await;
        let movies = service(&store)
            .get_similar_movies(&MovieId::new("missing"), 5)
            .await
            .unwrap();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_popular_movies_by_weighted_rating() {
        let store = seeded_store().await;
        for user in ["ana", "ben", "cy"] {
            rate(&store, user, "heat", 3.0).await;
        }
        rate(&store, "ana", "memento", 5.0).await;
        rate(&store, "ben", "memento", 5.0).await;

        let service = service(&store);
        let volume = service
            .get_popular_movies_by(PopularityOrder::Volume, 2)
            .await
            .unwrap();
        let weighted = service
            .get_popular_movies_by(PopularityOrder::Weighted, 2)
            .await
            .unwrap();

        assert_eq!(titles(&volume), vec!["Heat", "Memento"]);
        assert_eq!(titles(&weighted), vec!["Memento", "Heat"]);
    }

    #[tokio::test]
    async fn test_compute_similarity_delegates() {
        let store = seeded_store().await;
        let service = service(&store);
        let a = Movie::new("a", "A", &["Drama"], "X", &["Y"]);
        assert_eq!(service.compute_similarity(&a, &a), 1.0);
    }

    #[tokio::test]
    async fn test_failing_candidate_query_degrades_to_empty() {
        let liked = Movie::new("m1", "Liked", &["Drama"], "", &[]);

        let mut users = MockUserStore::new();
        users.expect_find_user().returning(|id| Ok(Some(user(id.as_str()))));

        let mut ratings = MockRatingStore::new();
        ratings.expect_find_ratings_by_user().returning(|id| {
            Ok(vec![Rating::new(id.clone(), MovieId::new("m1"), 5.0)])
        });

        let mut movies = MockMovieStore::new();
        movies
            .expect_find_movie()
            .returning(move |_| Ok(Some(liked.clone())));
        movies
            .expect_find_movies_by_genres()
            .times(1)
            .returning(|_, _, _| Err(AppError::Internal("query failed".into())));

        let service =
            RecommendationService::new(Arc::new(movies), Arc::new(ratings), Arc::new(users), 10);
        let result = service
            .get_recommendations_for_user(&UserId::new("ana"), 10)
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_failing_user_lookup_propagates() {
        let mut users = MockUserStore::new();
        users
            .expect_find_user()
            .returning(|_| Err(AppError::Internal("store unreachable".into())));

        let service = RecommendationService::new(
            Arc::new(MockMovieStore::new()),
            Arc::new(MockRatingStore::new()),
            Arc::new(users),
            10,
        );
        let result = service
            .get_recommendations_for_user(&UserId::new("ana"), 10)
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
