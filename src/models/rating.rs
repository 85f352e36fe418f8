use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MovieId, UserId};

/// Lowest score a rating may carry
pub const MIN_SCORE: f64 = 0.0;
/// Highest score a rating may carry
pub const MAX_SCORE: f64 = 5.0;

/// A user's rating (review) of a movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for submitting a rating
#[derive(Debug, Clone, Deserialize)]
pub struct NewRating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }
}

impl NewRating {
    /// True when the score lies in the accepted 0.0..=5.0 range
    pub fn score_in_range(&self) -> bool {
        (MIN_SCORE..=MAX_SCORE).contains(&self.rating)
    }
}
