use shared::{
    domain::{ActorId, MovieId},
    protocol::{ActorSummary, MovieRating},
};
use tracing::info;

use crate::{
    internal,
    validation::{ensure_actor, ensure_director, ensure_movie},
    CatalogContext, CatalogResult,
};

pub async fn get_no_of_distinct_movies_actor_acted(
    ctx: &CatalogContext,
    actor_id: &ActorId,
) -> CatalogResult<i64> {
    ensure_actor(ctx, actor_id).await?;
    ctx.storage
        .count_distinct_movies_for_actor(actor_id)
        .await
        .map_err(internal)
}

pub async fn get_movies_directed_by_director(
    ctx: &CatalogContext,
    director_name: &str,
) -> CatalogResult<Vec<MovieId>> {
    let director_id = ensure_director(ctx, director_name).await?;
    ctx.storage
        .movie_ids_by_director(director_id)
        .await
        .map_err(internal)
}

/// 0 when the movie has no rating row.
pub async fn get_total_number_of_ratings(
    ctx: &CatalogContext,
    movie_id: &MovieId,
) -> CatalogResult<i64> {
    ensure_movie(ctx, movie_id).await?;
    let rating = ctx
        .storage
        .rating_for_movie(movie_id)
        .await
        .map_err(internal)?;
    Ok(rating.map(|counts| counts.total()).unwrap_or(0))
}

/// Weighted star average; 0 when the movie has no rating row or nobody rated it.
pub async fn get_average_rating_of_movie(
    ctx: &CatalogContext,
    movie_id: &MovieId,
) -> CatalogResult<f64> {
    ensure_movie(ctx, movie_id).await?;
    let rating = ctx
        .storage
        .rating_for_movie(movie_id)
        .await
        .map_err(internal)?;
    Ok(rating.map(|counts| counts.average()).unwrap_or(0.0))
}

pub async fn delete_movie_rating(ctx: &CatalogContext, movie_id: &MovieId) -> CatalogResult<()> {
    ensure_movie(ctx, movie_id).await?;
    let deleted = ctx.storage.delete_rating(movie_id).await.map_err(internal)?;
    info!(movie_id = %movie_id, deleted, "movie rating deleted");
    Ok(())
}

pub async fn update_director_for_given_movie(
    ctx: &CatalogContext,
    movie_id: &MovieId,
    director_name: &str,
) -> CatalogResult<()> {
    ensure_movie(ctx, movie_id).await?;
    let director_id = ensure_director(ctx, director_name).await?;
    ctx.storage
        .set_movie_director(movie_id, director_id)
        .await
        .map_err(internal)?;
    info!(movie_id = %movie_id, director = director_name, "movie director updated");
    Ok(())
}

pub async fn remove_all_actors_from_given_movie(
    ctx: &CatalogContext,
    movie_id: &MovieId,
) -> CatalogResult<()> {
    ensure_movie(ctx, movie_id).await?;
    let removed = ctx.storage.clear_cast(movie_id).await.map_err(internal)?;
    info!(movie_id = %movie_id, removed, "cast cleared");
    Ok(())
}

/// Unknown movie ids are skipped.
pub async fn get_all_rating_objects_for_given_movies(
    ctx: &CatalogContext,
    movie_ids: &[MovieId],
) -> CatalogResult<Vec<MovieRating>> {
    ctx.storage
        .ratings_for_movies(movie_ids)
        .await
        .map_err(internal)
}

/// Distinct actors across the given movies. Unknown movie ids are skipped.
pub async fn get_all_actor_objects_acted_in_given_movies(
    ctx: &CatalogContext,
    movie_ids: &[MovieId],
) -> CatalogResult<Vec<ActorSummary>> {
    ctx.storage
        .actors_in_movies(movie_ids)
        .await
        .map_err(internal)
}

pub async fn get_distinct_movies_acted_by_actor_whose_name_contains(
    ctx: &CatalogContext,
    fragment: &str,
) -> CatalogResult<Vec<MovieId>> {
    ctx.storage
        .movie_ids_with_actor_name_containing(fragment)
        .await
        .map_err(internal)
}
