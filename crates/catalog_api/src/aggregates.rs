use std::collections::BTreeMap;

use shared::protocol::{
    ActorActivity, MovieActorCount, MovieGenderCount, MovieRolesCount, RoleFrequency,
};

use crate::{internal, round3, CatalogContext, CatalogResult};

/// Average box office across all movies, rounded to 3 places; 0 with no movies.
pub async fn get_average_box_office_collections(ctx: &CatalogContext) -> CatalogResult<f64> {
    let avg = ctx.storage.average_box_office().await.map_err(internal)?;
    Ok(avg.map(round3).unwrap_or(0.0))
}

pub async fn get_movies_with_distinct_actors_count(
    ctx: &CatalogContext,
) -> CatalogResult<Vec<MovieActorCount>> {
    ctx.storage.movie_actor_counts().await.map_err(internal)
}

pub async fn get_male_and_female_actors_count_for_each_movie(
    ctx: &CatalogContext,
) -> CatalogResult<Vec<MovieGenderCount>> {
    ctx.storage.movie_gender_counts().await.map_err(internal)
}

pub async fn get_roles_count_for_each_movie(
    ctx: &CatalogContext,
) -> CatalogResult<Vec<MovieRolesCount>> {
    ctx.storage.movie_roles_counts().await.map_err(internal)
}

pub async fn get_role_frequency(ctx: &CatalogContext) -> CatalogResult<BTreeMap<String, i64>> {
    let frequencies = ctx.storage.role_frequencies(false).await.map_err(internal)?;
    Ok(frequencies.into_iter().map(|f| (f.role, f.count)).collect())
}

/// Roles ordered by the release date of their most recent movie, newest first.
pub async fn get_role_frequency_in_order(
    ctx: &CatalogContext,
) -> CatalogResult<Vec<RoleFrequency>> {
    ctx.storage.role_frequencies(true).await.map_err(internal)
}

pub async fn get_no_of_movies_and_distinct_roles_for_each_actor(
    ctx: &CatalogContext,
) -> CatalogResult<Vec<ActorActivity>> {
    ctx.storage.actor_activity().await.map_err(internal)
}

pub async fn get_movies_with_at_least_actors(
    ctx: &CatalogContext,
    min_actors: i64,
) -> CatalogResult<Vec<MovieActorCount>> {
    let counts = ctx.storage.movie_actor_counts().await.map_err(internal)?;
    Ok(counts
        .into_iter()
        .filter(|c| c.actors_count >= min_actors)
        .collect())
}

/// Rounded to 3 places; 0 with no movies.
pub async fn get_average_no_of_actors_for_all_movies(ctx: &CatalogContext) -> CatalogResult<f64> {
    let avg = ctx
        .storage
        .average_actors_per_movie()
        .await
        .map_err(internal)?;
    Ok(avg.map(round3).unwrap_or(0.0))
}
