use chrono::NaiveDate;
use shared::{
    domain::{ActorId, DirectorId, MovieId},
    error::CatalogError,
};

use crate::{internal, CatalogContext, CatalogResult};

/// Years accepted by the year-based reports.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

pub async fn ensure_movie(ctx: &CatalogContext, movie_id: &MovieId) -> CatalogResult<()> {
    if !ctx.storage.movie_exists(movie_id).await.map_err(internal)? {
        return Err(CatalogError::UnknownMovie(movie_id.to_string()));
    }
    Ok(())
}

pub async fn ensure_actor(ctx: &CatalogContext, actor_id: &ActorId) -> CatalogResult<()> {
    if !ctx.storage.actor_exists(actor_id).await.map_err(internal)? {
        return Err(CatalogError::UnknownActor(actor_id.to_string()));
    }
    Ok(())
}

pub async fn ensure_director(ctx: &CatalogContext, name: &str) -> CatalogResult<DirectorId> {
    ctx.storage
        .director_id_by_name(name)
        .await
        .map_err(internal)?
        .ok_or_else(|| CatalogError::UnknownDirector(name.to_string()))
}

pub fn ensure_year(year: i32) -> CatalogResult<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(CatalogError::InvalidYear(year));
    }
    Ok(())
}

pub fn ensure_year_range(from_year: i32, to_year: i32) -> CatalogResult<()> {
    ensure_year(from_year)?;
    ensure_year(to_year)?;
    if to_year < from_year {
        return Err(CatalogError::InvalidYear(to_year));
    }
    Ok(())
}

pub fn ensure_month(month: u32) -> CatalogResult<()> {
    if !(1..=12).contains(&month) {
        return Err(CatalogError::InvalidMonth(month));
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD`, with or without zero padding on month and day.
pub fn parse_release_date(raw: &str) -> CatalogResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CatalogError::InvalidReleaseDate(raw.to_string()))
}

pub fn parse_box_office(raw: &str) -> CatalogResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(CatalogError::InvalidBoxOfficeCollection(raw.to_string())),
    }
}
