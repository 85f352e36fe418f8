//! Attribute-overlap similarity between two movies.
//!
//! The score is a fixed weighting of genre overlap, a shared director and cast overlap:
//!
//! ```text
//! 0.5 * |G1 ∩ G2| / |G1 ∪ G2|  +  0.3 * [D1 == D2 != ""]  +  0.2 * |A1 ∩ A2| / |A1 ∪ A2|
//! ```
//!
//! Each term is symmetric, so the total is too, and it always lies in `[0.0, 1.0]`.

use std::collections::HashSet;

use crate::models::Movie;

const GENRE_WEIGHT: f64 = 0.5;
const DIRECTOR_WEIGHT: f64 = 0.3;
const ACTOR_WEIGHT: f64 = 0.2;

/// Computes the similarity of two movies in `[0.0, 1.0]`
pub fn compute_similarity(a: &Movie, b: &Movie) -> f64 {
    let genres = GENRE_WEIGHT * jaccard(&a.genres, &b.genres);
    let director = if same_director(a, b) {
        DIRECTOR_WEIGHT
    } else {
        0.0
    };
    let actors = ACTOR_WEIGHT * jaccard(&a.actors, &b.actors);

    genres + director + actors
}

/// True when two movies share at least one genre, the director or at least one actor
pub fn shares_attribute(a: &Movie, b: &Movie) -> bool {
    a.genres.iter().any(|g| b.genres.contains(g))
        || same_director(a, b)
        || a.actors.iter().any(|actor| b.actors.contains(actor))
}

fn same_director(a: &Movie, b: &Movie) -> bool {
    !a.director.is_empty() && a.director == b.director
}

/// |A ∩ B| / |A ∪ B| over the distinct values, 0 when both are empty
fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }

    a.intersection(&b).count() as f64 / union as f64
}
