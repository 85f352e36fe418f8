use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::{Movie, MovieStats};

/// Minimum number of votes before a movie's own mean outweighs the global mean
pub const DEFAULT_MIN_VOTES: usize = 5;
/// Global mean rating assumed when none has been computed
pub const DEFAULT_GLOBAL_MEAN: f64 = 3.0;

/// How popular movies are ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopularityOrder {
    /// Review count, then mean rating
    #[default]
    Volume,
    /// IMDB-style weighted rating, then review count
    Weighted,
}

/// IMDB weighted rating: `(v / (v + m)) * R + (m / (v + m)) * C`
///
/// Shrinks the mean rating `r` of a movie with `v` votes towards the global mean `c`.
/// Returns 0.0 when there are no votes.
pub fn weighted_rating(v: usize, r: f64, m: usize, c: f64) -> f64 {
    if v == 0 {
        return 0.0;
    }

    let v = v as f64;
    let m = m as f64;
    (v / (v + m)) * r + (m / (v + m)) * c
}

/// Orders by review count descending, then mean rating descending.
///
/// Movies without ratings have no mean and sort last among equal counts.
/// The sort is stable, so remaining ties keep catalog order.
pub fn rank_popular(mut stats: Vec<MovieStats>, k: usize) -> Vec<Movie> {
    stats.sort_by(|a, b| {
        b.review_count
            .cmp(&a.review_count)
            .then_with(|| cmp_mean_desc(a.avg_rating, b.avg_rating))
    });

    stats.into_iter().take(k).map(|s| s.movie).collect()
}

/// Orders by weighted rating descending, then review count descending
pub fn rank_weighted(stats: Vec<MovieStats>, k: usize) -> Vec<Movie> {
    let mut scored: Vec<(f64, MovieStats)> = stats
        .into_iter()
        .map(|s| {
            let score = weighted_rating(
                s.review_count,
                s.avg_rating.unwrap_or(0.0),
                DEFAULT_MIN_VOTES,
                DEFAULT_GLOBAL_MEAN,
            );
            (score, s)
        })
        .collect();

    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.review_count.cmp(&a.review_count))
    });

    scored.into_iter().take(k).map(|(_, s)| s.movie).collect()
}

/// Ranks according to the requested order
pub fn rank(stats: Vec<MovieStats>, order: PopularityOrder, k: usize) -> Vec<Movie> {
    match order {
        PopularityOrder::Volume => rank_popular(stats, k),
        PopularityOrder::Weighted => rank_weighted(stats, k),
    }
}

fn cmp_mean_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(id: &str, review_count: usize, avg_rating: Option<f64>) -> MovieStats {
        MovieStats {
            movie: Movie::new(id, id, &[], "", &[]),
            review_count,
            avg_rating,
        }
    }

    fn ids(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_weighted_rating_without_votes() {
        assert_eq!(weighted_rating(0, 4.5, 5, 3.0), 0.0);
    }

    #[test]
    fn test_weighted_rating_at_min_votes_is_midpoint() {
        let r = 4.6;
        let c = 3.0;
        assert!((weighted_rating(5, r, 5, c) - (0.5 * r + 0.5 * c)).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_rating_converges_to_mean() {
        let r = 4.2;
        let score = weighted_rating(10_000_000, r, 5, 3.0);
        assert!((score - r).abs() < 1e-5);
    }

    #[test]
    fn test_rank_popular_orders_by_count_then_mean() {
        let ranked = rank_popular(
            vec![
                stats("few", 1, Some(5.0)),
                stats("many-low", 3, Some(2.0)),
                stats("many-high", 3, Some(4.0)),
                stats("none", 0, None),
            ],
            10,
        );
        assert_eq!(ids(&ranked), vec!["many-high", "many-low", "few", "none"]);
    }

    #[test]
    fn test_rank_popular_keeps_catalog_order_on_ties() {
        let ranked = rank_popular(
            vec![stats("a", 0, None), stats("b", 0, None), stats("c", 0, None)],
            2,
        );
        assert_eq!(ids(&ranked), vec!["a", "b"]);
    }

    #[test]
    fn test_rank_weighted_prefers_volume_at_equal_mean() {
        let ranked = rank_weighted(
            vec![
                stats("single", 1, Some(5.0)),
                stats("crowd", 20, Some(4.5)),
                stats("unrated", 0, None),
            ],
            10,
        );
        assert_eq!(ids(&ranked), vec!["crowd", "single", "unrated"]);
    }

    #[test]
    fn test_popularity_order_deserializes_lowercase() {
        let order: PopularityOrder = serde_json::from_str(r#""weighted""#).unwrap();
        assert_eq!(order, PopularityOrder::Weighted);
        assert_eq!(PopularityOrder::default(), PopularityOrder::Volume);
    }
}
