//! Content-based filtering over movie metadata.
//!
//! Each movie becomes a bag-of-words document built from its director, genres and
//! cast. Liked movies and unseen candidates are vectorized together with TF-IDF, and
//! every candidate is scored by its mean cosine similarity to the liked set.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use super::{
    preferences::{PreferenceProfileBuilder, DEFAULT_MIN_RATING},
    tfidf::{cosine_similarity, TfidfVectorizer},
};
use crate::{
    db::{MovieStore, RatingStore},
    error::AppResult,
    models::{Movie, UserId},
};

/// Number of recommendations returned when the caller gives no limit
pub const DEFAULT_LIMIT: usize = 5;

#[derive(Clone)]
pub struct ContentBasedRecommender {
    movies: Arc<dyn MovieStore>,
    profile: PreferenceProfileBuilder,
    scan_limit: usize,
}

impl ContentBasedRecommender {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        ratings: Arc<dyn RatingStore>,
        scan_limit: usize,
    ) -> Self {
        Self {
            profile: PreferenceProfileBuilder::new(movies.clone(), ratings, scan_limit),
            movies,
            scan_limit,
        }
    }

    /// Up to `n` movies most similar in content to the ones the user liked.
    ///
    /// A user without liked movies gets the first `n` catalog movies unranked.
    pub async fn recommend(&self, user_id: &UserId, n: usize) -> AppResult<Vec<Movie>> {
        let liked = self.profile.liked_movies(user_id, DEFAULT_MIN_RATING).await?;
        if liked.is_empty() {
            tracing::debug!(user_id = %user_id, "No liked movies, returning catalog head");
            return self.movies.find_all_movies(n).await;
        }

        let liked_ids: HashSet<String> = liked.iter().map(|m| m.id.canonical()).collect();
        let candidates: Vec<Movie> = self
            .movies
            .find_all_movies(self.scan_limit)
            .await?
            .into_iter()
            .filter(|m| !liked_ids.contains(&m.id.canonical()))
            .collect();

        tracing::debug!(
            user_id = %user_id,
            liked = liked.len(),
            candidates = candidates.len(),
            "Scoring content-based candidates"
        );

        Ok(rank_candidates(&liked, candidates, n))
    }
}

/// Lower-cased "director genres actors" document for a movie
pub fn movie_features(movie: &Movie) -> String {
    std::iter::once(movie.director.as_str())
        .chain(movie.genres.iter().map(String::as_str))
        .chain(movie.actors.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Orders `candidates` by mean cosine similarity to `liked` and keeps the top `n`.
///
/// The vocabulary is fitted on liked and candidate documents together. Equal scores
/// keep candidate order.
pub fn rank_candidates(liked: &[Movie], candidates: Vec<Movie>, n: usize) -> Vec<Movie> {
    if candidates.is_empty() || liked.is_empty() {
        return Vec::new();
    }

    let docs: Vec<String> = liked
        .iter()
        .chain(candidates.iter())
        .map(movie_features)
        .collect();
    let (_, rows) = TfidfVectorizer::fit_transform(&docs);
    let (liked_rows, candidate_rows) = rows.split_at(liked.len());

    let mut scored: Vec<(f64, Movie)> = candidate_rows
        .iter()
        .map(|row| {
            let total: f64 = liked_rows
                .iter()
                .map(|liked_row| cosine_similarity(row, liked_row))
                .sum();
            total / liked_rows.len() as f64
        })
        .zip(candidates)
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    scored.into_iter().take(n).map(|(_, movie)| movie).collect()
}
