//! Demo data for a fresh catalog.
//!
//! Everything goes through [`Catalog`], so seeded rows obey the same validation,
//! reference normalization and uniqueness rules as rows created over HTTP.

use rand::{seq::SliceRandom, Rng};

use crate::{
    error::AppResult,
    models::{Movie, NewMovie, NewRating, NewUser, User},
    services::Catalog,
};

const GENRES: &[&str] = &[
    "Action", "Adventure", "Animation", "Comedy", "Crime", "Documentary", "Drama",
    "Fantasy", "Horror", "Mystery", "Romance", "Sci-Fi", "Thriller", "Western",
];

const DIRECTORS: &[&str] = &[
    "Agnes Varda", "Akira Kurosawa", "Bong Joon-ho", "Celine Sciamma", "Denis Villeneuve",
    "Greta Gerwig", "Hayao Miyazaki", "Jane Campion", "Park Chan-wook", "Wong Kar-wai",
];

const ACTORS: &[&str] = &[
    "Tilda Swinton", "Song Kang-ho", "Toshiro Mifune", "Frances McDormand", "Tony Leung",
    "Isabelle Huppert", "Mahershala Ali", "Saoirse Ronan", "Adele Haenel", "Oscar Isaac",
    "Maggie Cheung", "Cate Blanchett", "Daniel Kaluuya", "Florence Pugh",
];

const TITLE_HEADS: &[&str] = &[
    "Silent", "Crimson", "Distant", "Broken", "Electric", "Hidden", "Last", "Northern",
];

const TITLE_TAILS: &[&str] = &[
    "Harbor", "Orchard", "Signal", "Frontier", "Lanterns", "Tide", "Mirror", "Summer",
];

/// Hand-written movies created ahead of the generated ones
const KNOWN_MOVIES: &[(&str, &[&str], &str, &[&str])] = &[
    ("Parasite", &["Thriller", "Drama", "Comedy"], "Bong Joon-ho", &["Song Kang-ho", "Choi Woo-shik"]),
    ("Memories of Murder", &["Crime", "Mystery", "Thriller"], "Bong Joon-ho", &["Song Kang-ho", "Kim Sang-kyung"]),
    ("Arrival", &["Sci-Fi", "Drama"], "Denis Villeneuve", &["Amy Adams", "Jeremy Renner"]),
    ("Dune", &["Sci-Fi", "Adventure"], "Denis Villeneuve", &["Timothee Chalamet", "Rebecca Ferguson", "Oscar Isaac"]),
    ("Spirited Away", &["Animation", "Fantasy", "Adventure"], "Hayao Miyazaki", &["Rumi Hiiragi", "Miyu Irino"]),
    ("In the Mood for Love", &["Romance", "Drama"], "Wong Kar-wai", &["Tony Leung", "Maggie Cheung"]),
];

/// How much data to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub movies: usize,
    pub users: usize,
    pub reviews: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            movies: 40,
            users: 12,
            reviews: 150,
        }
    }
}

/// What a seeding run actually created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub movies: usize,
    pub users: usize,
    pub reviews: usize,
}

/// Creates movies, users and reviews through `catalog`.
///
/// Reviews are capped at one per (user, movie) pair, so fewer than
/// `plan.reviews` are created when the plan asks for more than the pairs allow.
pub async fn seed_catalog<R>(catalog: &Catalog, plan: SeedPlan, rng: &mut R) -> AppResult<SeedSummary>
where
    R: Rng + Send,
{
    let mut movies = Vec::with_capacity(plan.movies);
    for i in 0..plan.movies {
        let movie = catalog.create_movie(demo_movie(i, rng)).await?;
        movies.push(movie);
    }

    let mut users = Vec::with_capacity(plan.users);
    for i in 0..plan.users {
        let username = format!("viewer{:02}", i + 1);
        let user = catalog
            .create_user(NewUser {
                email: format!("{}@example.com", username),
                username,
            })
            .await?;
        users.push(user);
    }

    let mut reviews = 0;
    for (user, movie) in review_pairs(&users, &movies, plan.reviews, rng) {
        let rating = demo_score(rng);
        catalog
            .create_review(NewRating {
                user_id: user.id.clone(),
                movie_id: movie.id.clone(),
                rating,
                comment: Some(demo_comment(rating).to_string()),
            })
            .await?;
        reviews += 1;
    }

    let summary = SeedSummary {
        movies: movies.len(),
        users: users.len(),
        reviews,
    };
    tracing::info!(?summary, "Seeded demo catalog");
    Ok(summary)
}

fn demo_movie<R: Rng>(index: usize, rng: &mut R) -> NewMovie {
    if let Some((title, genres, director, actors)) = KNOWN_MOVIES.get(index) {
        return NewMovie {
            title: title.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            director: director.to_string(),
            actors: actors.iter().map(|a| a.to_string()).collect(),
        };
    }

    let head = TITLE_HEADS.choose(rng).copied().unwrap_or("Untitled");
    let tail = TITLE_TAILS.choose(rng).copied().unwrap_or("Film");
    let genre_count = rng.gen_range(1..=3);
    let actor_count = rng.gen_range(2..=4);

    NewMovie {
        title: format!("{} {}", head, tail),
        genres: GENRES
            .choose_multiple(rng, genre_count)
            .map(|g| g.to_string())
            .collect(),
        director: DIRECTORS.choose(rng).copied().unwrap_or_default().to_string(),
        actors: ACTORS
            .choose_multiple(rng, actor_count)
            .map(|a| a.to_string())
            .collect(),
    }
}

/// Distinct (user, movie) pairs in random order, at most `count` of them
fn review_pairs<'a, R: Rng>(
    users: &'a [User],
    movies: &'a [Movie],
    count: usize,
    rng: &mut R,
) -> Vec<(&'a User, &'a Movie)> {
    let mut pairs: Vec<_> = users
        .iter()
        .flat_map(|u| movies.iter().map(move |m| (u, m)))
        .collect();
    pairs.shuffle(rng);
    pairs.truncate(count);
    pairs
}

/// A score from 1.0 to 5.0 in half-star steps
fn demo_score<R: Rng>(rng: &mut R) -> f64 {
    f64::from(rng.gen_range(2u8..=10)) / 2.0
}

fn demo_comment(rating: f64) -> &'static str {
    if rating >= 4.5 {
        "An instant favourite."
    } else if rating >= 3.5 {
        "Really enjoyed it."
    } else if rating >= 2.5 {
        "Fine for a quiet evening."
    } else {
        "Not for me."
    }
}
