use std::collections::HashSet;

use shared::{
    domain::{ActorId, MovieId},
    error::CatalogError,
    protocol::{CatalogSeed, MovieRating, RatingCounts, RatingSeed},
};
use storage::{NewCast, NewCatalog, NewMovie};
use tracing::info;

use crate::{
    internal,
    validation::{parse_box_office, parse_release_date},
    CatalogContext, CatalogResult,
};

/// Validates the whole seed before writing anything, then loads it in one
/// transaction. Records may reference rows that are already stored.
pub async fn populate_database(ctx: &CatalogContext, seed: &CatalogSeed) -> CatalogResult<()> {
    let catalog = prepare(ctx, seed).await?;
    ctx.storage
        .populate_catalog(&catalog)
        .await
        .map_err(internal)?;
    info!(
        actors = catalog.actors.len(),
        directors = catalog.directors.len(),
        movies = catalog.movies.len(),
        cast = catalog.cast.len(),
        ratings = catalog.ratings.len(),
        "catalog populated"
    );
    Ok(())
}

async fn prepare(ctx: &CatalogContext, seed: &CatalogSeed) -> CatalogResult<NewCatalog> {
    let mut actor_ids: HashSet<&str> = HashSet::new();
    for actor in &seed.actors {
        if !actor_ids.insert(actor.actor_id.as_str()) {
            return Err(CatalogError::DuplicateRecord(format!("actor '{}'", actor.actor_id)));
        }
    }
    let mut movie_ids: HashSet<&str> = HashSet::new();
    for movie in &seed.movies {
        if !movie_ids.insert(movie.movie_id.as_str()) {
            return Err(CatalogError::DuplicateRecord(format!("movie '{}'", movie.movie_id)));
        }
    }
    let mut rated: HashSet<&str> = HashSet::new();
    for rating in &seed.movie_ratings {
        if !rated.insert(rating.movie_id.as_str()) {
            return Err(CatalogError::DuplicateRecord(format!("rating for movie '{}'", rating.movie_id)));
        }
    }

    let seeded_actors: Vec<&str> = actor_ids.iter().copied().collect();
    if let Some(taken) = ctx
        .storage
        .existing_actor_ids(&seeded_actors)
        .await
        .map_err(internal)?
        .into_iter()
        .min()
    {
        return Err(CatalogError::DuplicateRecord(format!("actor '{taken}'")));
    }
    let seeded_movies: Vec<&str> = movie_ids.iter().copied().collect();
    if let Some(taken) = ctx
        .storage
        .existing_movie_ids(&seeded_movies)
        .await
        .map_err(internal)?
        .into_iter()
        .min()
    {
        return Err(CatalogError::DuplicateRecord(format!("movie '{taken}'")));
    }

    let mut directors: Vec<String> = Vec::new();
    let mut seen_directors: HashSet<&str> = HashSet::new();
    for name in &seed.directors {
        if seen_directors.insert(name.as_str()) {
            directors.push(name.clone());
        }
    }

    let referenced_directors: Vec<&str> = seed
        .movies
        .iter()
        .map(|m| m.director_name.as_str())
        .filter(|name| !seen_directors.contains(name))
        .collect();
    let stored_directors = ctx
        .storage
        .existing_director_names(&referenced_directors)
        .await
        .map_err(internal)?;

    let referenced_actors: Vec<&str> = seed
        .movies
        .iter()
        .flat_map(|m| m.actors.iter().map(|c| c.actor_id.as_str()))
        .filter(|id| !actor_ids.contains(id))
        .collect();
    let stored_actors = ctx
        .storage
        .existing_actor_ids(&referenced_actors)
        .await
        .map_err(internal)?;

    let mut movies = Vec::with_capacity(seed.movies.len());
    let mut cast = Vec::new();
    for movie in &seed.movies {
        let director = movie.director_name.as_str();
        if !seen_directors.contains(director) && !stored_directors.contains(director) {
            return Err(CatalogError::UnknownDirector(movie.director_name.clone()));
        }
        let release_date = parse_release_date(&movie.release_date)?;
        let box_office = parse_box_office(&movie.box_office_collection_in_crores)?;
        let movie_id = MovieId::new(movie.movie_id.as_str());

        for member in &movie.actors {
            let actor = member.actor_id.as_str();
            if !actor_ids.contains(actor) && !stored_actors.contains(actor) {
                return Err(CatalogError::UnknownActor(member.actor_id.clone()));
            }
            cast.push(NewCast {
                movie_id: movie_id.clone(),
                actor_id: ActorId::new(actor),
                role: member.role.clone(),
                is_debut_movie: member.is_debut_movie,
            });
        }

        movies.push(NewMovie {
            movie_id,
            name: movie.name.clone(),
            box_office_collection_in_crores: box_office,
            release_date,
            director_name: movie.director_name.clone(),
        });
    }

    let rated_elsewhere: Vec<&str> = rated
        .iter()
        .copied()
        .filter(|id| !movie_ids.contains(id))
        .collect();
    let stored_movies = ctx
        .storage
        .existing_movie_ids(&rated_elsewhere)
        .await
        .map_err(internal)?;
    let already_rated: Vec<MovieId> = stored_movies.iter().map(MovieId::new).collect();
    if let Some(existing) = ctx
        .storage
        .ratings_for_movies(&already_rated)
        .await
        .map_err(internal)?
        .into_iter()
        .next()
    {
        return Err(CatalogError::DuplicateRecord(format!(
            "rating for movie '{}'",
            existing.movie_id
        )));
    }

    let mut ratings = Vec::with_capacity(seed.movie_ratings.len());
    for rating in &seed.movie_ratings {
        let movie = rating.movie_id.as_str();
        if !movie_ids.contains(movie) && !stored_movies.contains(movie) {
            return Err(CatalogError::UnknownMovie(rating.movie_id.clone()));
        }
        ratings.push(rating_from_seed(rating)?);
    }

    Ok(NewCatalog {
        actors: seed.actors.clone(),
        directors,
        movies,
        cast,
        ratings,
    })
}

fn rating_from_seed(seed: &RatingSeed) -> CatalogResult<MovieRating> {
    let counts = RatingCounts {
        rating_one_count: seed.rating_one_count,
        rating_two_count: seed.rating_two_count,
        rating_three_count: seed.rating_three_count,
        rating_four_count: seed.rating_four_count,
        rating_five_count: seed.rating_five_count,
    };
    let any_negative = [
        counts.rating_one_count,
        counts.rating_two_count,
        counts.rating_three_count,
        counts.rating_four_count,
        counts.rating_five_count,
    ]
    .iter()
    .any(|count| *count < 0);
    if any_negative || counts.checked_weighted_sum().is_none() {
        return Err(CatalogError::InvalidRatingCount(seed.movie_id.clone()));
    }
    Ok(MovieRating {
        movie_id: MovieId::new(seed.movie_id.as_str()),
        counts,
    })
}
