use serde::{Deserialize, Serialize};

use super::MovieId;

/// A movie in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub actors: Vec<String>,
}

/// Payload for adding a movie to the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub actors: Vec<String>,
}

/// A movie joined with the aggregate of its ratings
#[derive(Debug, Clone, PartialEq)]
pub struct MovieStats {
    pub movie: Movie,
    pub review_count: usize,
    /// Mean rating, `None` when the movie has no ratings
    pub avg_rating: Option<f64>,
}

impl Movie {
    pub fn new(
        id: impl Into<MovieId>,
        title: impl Into<String>,
        genres: &[&str],
        director: impl Into<String>,
        actors: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            director: director.into(),
            actors: actors.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attributes_default_to_empty() {
        let movie: Movie =
            serde_json::from_str(r#"{"id": "m1", "title": "Untitled"}"#).unwrap();
        assert!(movie.genres.is_empty());
        assert!(movie.actors.is_empty());
        assert_eq!(movie.director, "");
    }
}
