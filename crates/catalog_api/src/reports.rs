use std::collections::{HashMap, HashSet};

use shared::{
    domain::{ActorId, Gender, MovieId},
    protocol::{ActorMovies, CastDetails, MovieDetails},
};
use storage::{RatingThresholds, StoredMovie};
use tracing::{debug, info};

use crate::{
    internal,
    validation::{ensure_month, ensure_year, ensure_year_range, MAX_YEAR},
    CatalogContext, CatalogResult,
};

const SUMMER_MONTHS: [u32; 3] = [5, 6, 7];

/// Movie details with cast, director, average rating and total ratings.
/// Cast is loaded for all movies in one query; `cast_gender` narrows it.
async fn movie_details(
    ctx: &CatalogContext,
    movies: Vec<StoredMovie>,
    cast_gender: Option<Gender>,
) -> CatalogResult<Vec<MovieDetails>> {
    let movie_ids: Vec<MovieId> = movies.iter().map(|m| m.movie_id.clone()).collect();
    debug!(movies = movie_ids.len(), ?cast_gender, "assembling movie details");
    let mut cast_by_movie: HashMap<MovieId, Vec<CastDetails>> = HashMap::new();
    for (movie_id, cast) in ctx
        .storage
        .cast_for_movies(&movie_ids, cast_gender)
        .await
        .map_err(internal)?
    {
        cast_by_movie.entry(movie_id).or_default().push(cast);
    }

    Ok(movies
        .into_iter()
        .map(|movie| {
            let counts = movie.rating.unwrap_or_default();
            MovieDetails {
                cast: cast_by_movie.remove(&movie.movie_id).unwrap_or_default(),
                movie_id: movie.movie_id,
                name: movie.name,
                box_office_collection_in_crores: movie.box_office_collection_in_crores,
                release_date: movie.release_date,
                director_name: movie.director_name,
                average_rating: counts.average(),
                total_number_of_ratings: counts.total(),
            }
        })
        .collect())
}

pub async fn get_movies_by_given_movie_names(
    ctx: &CatalogContext,
    names: &[String],
) -> CatalogResult<Vec<MovieDetails>> {
    let movies = ctx.storage.movies_by_names(names).await.map_err(internal)?;
    movie_details(ctx, movies, None).await
}

/// Movies released May through July of any year in `[from_year, to_year]`.
pub async fn get_movies_released_in_summer(
    ctx: &CatalogContext,
    from_year: i32,
    to_year: i32,
) -> CatalogResult<Vec<MovieDetails>> {
    ensure_year_range(from_year, to_year)?;
    let movies = ctx
        .storage
        .movies_released_in_months(from_year, to_year, &SUMMER_MONTHS)
        .await
        .map_err(internal)?;
    movie_details(ctx, movies, None).await
}

/// Case-insensitive suffix match on actor names.
pub async fn get_movie_names_with_actor_name_ending_with(
    ctx: &CatalogContext,
    suffix: &str,
) -> CatalogResult<Vec<String>> {
    ctx.storage
        .movie_names_with_actor_name_ending_with(suffix)
        .await
        .map_err(internal)
}

/// Inclusive on both ends.
pub async fn get_movie_names_with_five_star_ratings_in_range(
    ctx: &CatalogContext,
    low: i64,
    high: i64,
) -> CatalogResult<Vec<String>> {
    ctx.storage
        .movie_names_with_five_star_count_between(low, high)
        .await
        .map_err(internal)
}

pub async fn get_movie_names_with_ratings_above_given_minimum(
    ctx: &CatalogContext,
    thresholds: &RatingThresholds,
) -> CatalogResult<Vec<String>> {
    ctx.storage
        .movie_names_with_ratings_above(thresholds)
        .await
        .map_err(internal)
}

pub async fn get_movie_directors_in_given_year(
    ctx: &CatalogContext,
    year: i32,
) -> CatalogResult<Vec<String>> {
    ensure_year(year)?;
    ctx.storage
        .director_names_for_year(year)
        .await
        .map_err(internal)
}

/// Actors whose debut movie was released after `year`.
pub async fn get_actor_names_debuted_after_year(
    ctx: &CatalogContext,
    year: i32,
) -> CatalogResult<Vec<String>> {
    ensure_year(year)?;
    ctx.storage
        .actor_names_debuted_between(year + 1, MAX_YEAR)
        .await
        .map_err(internal)
}

/// Directors with a movie whose name contains `fragment` (case-sensitive)
/// and which was released in `month`.
pub async fn get_director_names_with_movie_containing_in_month(
    ctx: &CatalogContext,
    fragment: &str,
    month: u32,
) -> CatalogResult<Vec<String>> {
    ensure_month(month)?;
    ctx.storage
        .director_names_with_movie_in_month(fragment, month)
        .await
        .map_err(internal)
}

/// Zeroes every rating count of movies released in `year`. Returns the
/// number of rating rows touched.
pub async fn reset_ratings_for_movies_in_given_year(
    ctx: &CatalogContext,
    year: i32,
) -> CatalogResult<u64> {
    ensure_year(year)?;
    let reset = ctx
        .storage
        .reset_ratings_for_year(year)
        .await
        .map_err(internal)?;
    info!(year, reset, "ratings reset");
    Ok(reset)
}

/// Movies with more than `min_female_cast` female cast entries, listing only
/// their female cast.
pub async fn get_female_cast_details_from_movies_having_more_than(
    ctx: &CatalogContext,
    min_female_cast: i64,
) -> CatalogResult<Vec<MovieDetails>> {
    let movies = ctx
        .storage
        .movies_with_more_female_cast_than(min_female_cast)
        .await
        .map_err(internal)?;
    movie_details(ctx, movies, Some(Gender::Female)).await
}

/// Each actor with a movie released in or after `year`, together with those movies.
pub async fn get_actor_movies_released_in_year_greater_than_or_equal_to(
    ctx: &CatalogContext,
    year: i32,
) -> CatalogResult<Vec<ActorMovies>> {
    ensure_year(year)?;
    let pairs = ctx
        .storage
        .actor_movie_pairs_from_year(year)
        .await
        .map_err(internal)?;

    let mut seen: HashSet<MovieId> = HashSet::new();
    let mut movie_ids: Vec<MovieId> = Vec::new();
    for (_, movie_id) in &pairs {
        if seen.insert(movie_id.clone()) {
            movie_ids.push(movie_id.clone());
        }
    }
    let movies = ctx.storage.movies_by_ids(&movie_ids).await.map_err(internal)?;
    let details: HashMap<MovieId, MovieDetails> = movie_details(ctx, movies, None)
        .await?
        .into_iter()
        .map(|d| (d.movie_id.clone(), d))
        .collect();

    let mut actors: Vec<ActorMovies> = Vec::new();
    let mut index: HashMap<ActorId, usize> = HashMap::new();
    for (actor, movie_id) in pairs {
        let slot = *index.entry(actor.actor_id.clone()).or_insert_with(|| {
            actors.push(ActorMovies {
                actor_id: actor.actor_id.clone(),
                name: actor.name.clone(),
                movies: Vec::new(),
            });
            actors.len() - 1
        });
        if let Some(movie) = details.get(&movie_id) {
            actors[slot].movies.push(movie.clone());
        }
    }
    Ok(actors)
}
