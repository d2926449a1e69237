use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use shared::{
    domain::{ActorId, DirectorId, Gender, MovieId},
    protocol::{
        ActorActivity, ActorSeed, ActorSummary, CastDetails, MovieActorCount, MovieGenderCount,
        MovieRating, MovieRolesCount, RatingCounts, RoleFrequency,
    },
};

use crate::{push_in_list, Storage, INSERT_CHUNK};

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub movie_id: MovieId,
    pub name: String,
    pub box_office_collection_in_crores: f64,
    pub release_date: NaiveDate,
    pub director_name: String,
}

#[derive(Debug, Clone)]
pub struct NewCast {
    pub movie_id: MovieId,
    pub actor_id: ActorId,
    pub role: String,
    pub is_debut_movie: bool,
}

/// A fully validated bulk load, inserted in one transaction.
#[derive(Debug, Clone, Default)]
pub struct NewCatalog {
    pub actors: Vec<ActorSeed>,
    pub directors: Vec<String>,
    pub movies: Vec<NewMovie>,
    pub cast: Vec<NewCast>,
    pub ratings: Vec<MovieRating>,
}

/// A movie row joined with its director and optional rating row.
#[derive(Debug, Clone)]
pub struct StoredMovie {
    pub movie_id: MovieId,
    pub name: String,
    pub box_office_collection_in_crores: f64,
    pub release_date: NaiveDate,
    pub director_name: String,
    pub rating: Option<RatingCounts>,
}

/// Any one bucket clearing its bar qualifies a movie. Five stars use `>=`,
/// the rest use `>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingThresholds {
    pub min_five_star: i64,
    pub four_star_above: i64,
    pub three_star_above: i64,
    pub two_star_above: i64,
    pub one_star_above: i64,
    pub released_after_year: i32,
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self {
            min_five_star: 500,
            four_star_above: 1000,
            three_star_above: 2000,
            two_star_above: 4000,
            one_star_above: 8000,
            released_after_year: 2000,
        }
    }
}

const MOVIE_SELECT: &str = "SELECT m.movie_id, m.name, m.box_office_collection_in_crores, m.release_date, d.name,
        r.movie_id, r.rating_one_count, r.rating_two_count, r.rating_three_count,
        r.rating_four_count, r.rating_five_count
     FROM movies m
     INNER JOIN directors d ON d.id = m.director_id
     LEFT JOIN ratings r ON r.movie_id = m.movie_id ";

const YEAR_OF: &str = "CAST(strftime('%Y', m.release_date) AS INTEGER)";
const MONTH_OF: &str = "CAST(strftime('%m', m.release_date) AS INTEGER)";

fn movie_from_row(r: &SqliteRow) -> StoredMovie {
    let rating = r.get::<Option<String>, _>(5).map(|_| RatingCounts {
        rating_one_count: r.get::<i64, _>(6),
        rating_two_count: r.get::<i64, _>(7),
        rating_three_count: r.get::<i64, _>(8),
        rating_four_count: r.get::<i64, _>(9),
        rating_five_count: r.get::<i64, _>(10),
    });
    StoredMovie {
        movie_id: MovieId(r.get::<String, _>(0)),
        name: r.get::<String, _>(1),
        box_office_collection_in_crores: r.get::<f64, _>(2),
        release_date: r.get::<NaiveDate, _>(3),
        director_name: r.get::<String, _>(4),
        rating,
    }
}

fn counts_from_row(r: &SqliteRow, offset: usize) -> RatingCounts {
    RatingCounts {
        rating_one_count: r.get::<i64, _>(offset),
        rating_two_count: r.get::<i64, _>(offset + 1),
        rating_three_count: r.get::<i64, _>(offset + 2),
        rating_four_count: r.get::<i64, _>(offset + 3),
        rating_five_count: r.get::<i64, _>(offset + 4),
    }
}

fn strings(rows: Vec<SqliteRow>) -> Vec<String> {
    rows.into_iter().map(|r| r.get::<String, _>(0)).collect()
}

impl Storage {
    pub async fn populate_catalog(&self, catalog: &NewCatalog) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for chunk in catalog.actors.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO actors (actor_id, name, gender) ");
            builder.push_values(chunk, |mut b, actor| {
                b.push_bind(actor.actor_id.as_str())
                    .push_bind(actor.name.as_str())
                    .push_bind(actor.gender.as_str());
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .context("failed to insert actors")?;
        }

        for chunk in catalog.directors.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO directors (name) ");
            builder.push_values(chunk, |mut b, name| {
                b.push_bind(name.as_str());
            });
            builder.push(" ON CONFLICT(name) DO NOTHING");
            builder
                .build()
                .execute(&mut *tx)
                .await
                .context("failed to insert directors")?;
        }

        for movie in &catalog.movies {
            sqlx::query(
                "INSERT INTO movies (movie_id, name, box_office_collection_in_crores, release_date, director_id)
                 SELECT ?, ?, ?, ?, id FROM directors WHERE name = ?",
            )
            .bind(movie.movie_id.as_str())
            .bind(movie.name.as_str())
            .bind(movie.box_office_collection_in_crores)
            .bind(movie.release_date)
            .bind(movie.director_name.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert movie '{}'", movie.movie_id))?;
        }

        for chunk in catalog.cast.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO cast_members (movie_id, actor_id, role, is_debut_movie) ",
            );
            builder.push_values(chunk, |mut b, cast| {
                b.push_bind(cast.movie_id.as_str())
                    .push_bind(cast.actor_id.as_str())
                    .push_bind(cast.role.as_str())
                    .push_bind(cast.is_debut_movie);
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .context("failed to insert cast")?;
        }

        for chunk in catalog.ratings.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO ratings (movie_id, rating_one_count, rating_two_count, rating_three_count, rating_four_count, rating_five_count) ",
            );
            builder.push_values(chunk, |mut b, rating| {
                b.push_bind(rating.movie_id.as_str())
                    .push_bind(rating.counts.rating_one_count)
                    .push_bind(rating.counts.rating_two_count)
                    .push_bind(rating.counts.rating_three_count)
                    .push_bind(rating.counts.rating_four_count)
                    .push_bind(rating.counts.rating_five_count);
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .context("failed to insert ratings")?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn existing_actor_ids(&self, actor_ids: &[&str]) -> Result<HashSet<String>> {
        if actor_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT actor_id FROM actors WHERE actor_id IN ");
        push_in_list(&mut builder, actor_ids.iter().copied());
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(strings(rows).into_iter().collect())
    }

    pub async fn existing_movie_ids(&self, movie_ids: &[&str]) -> Result<HashSet<String>> {
        if movie_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT movie_id FROM movies WHERE movie_id IN ");
        push_in_list(&mut builder, movie_ids.iter().copied());
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(strings(rows).into_iter().collect())
    }

    pub async fn existing_director_names(&self, names: &[&str]) -> Result<HashSet<String>> {
        if names.is_empty() {
            return Ok(HashSet::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT name FROM directors WHERE name IN ");
        push_in_list(&mut builder, names.iter().copied());
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(strings(rows).into_iter().collect())
    }

    pub async fn movie_exists(&self, movie_id: &MovieId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movies WHERE movie_id = ?)")
            .bind(movie_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn actor_exists(&self, actor_id: &ActorId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM actors WHERE actor_id = ?)")
            .bind(actor_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn director_id_by_name(&self, name: &str) -> Result<Option<DirectorId>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM directors WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(DirectorId))
    }

    pub async fn count_distinct_movies_for_actor(&self, actor_id: &ActorId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT movie_id) FROM cast_members WHERE actor_id = ?",
        )
        .bind(actor_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn movie_ids_by_director(&self, director_id: DirectorId) -> Result<Vec<MovieId>> {
        let rows = sqlx::query("SELECT movie_id FROM movies WHERE director_id = ? ORDER BY movie_id ASC")
            .bind(director_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(strings(rows).into_iter().map(MovieId).collect())
    }

    pub async fn rating_for_movie(&self, movie_id: &MovieId) -> Result<Option<RatingCounts>> {
        let row = sqlx::query(
            "SELECT rating_one_count, rating_two_count, rating_three_count, rating_four_count, rating_five_count
             FROM ratings WHERE movie_id = ?",
        )
        .bind(movie_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| counts_from_row(&r, 0)))
    }

    pub async fn delete_rating(&self, movie_id: &MovieId) -> Result<u64> {
        Ok(sqlx::query("DELETE FROM ratings WHERE movie_id = ?")
            .bind(movie_id.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected())
    }

    pub async fn set_movie_director(
        &self,
        movie_id: &MovieId,
        director_id: DirectorId,
    ) -> Result<()> {
        sqlx::query("UPDATE movies SET director_id = ? WHERE movie_id = ?")
            .bind(director_id.0)
            .bind(movie_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear_cast(&self, movie_id: &MovieId) -> Result<u64> {
        Ok(sqlx::query("DELETE FROM cast_members WHERE movie_id = ?")
            .bind(movie_id.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected())
    }

    pub async fn ratings_for_movies(&self, movie_ids: &[MovieId]) -> Result<Vec<MovieRating>> {
        if movie_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT movie_id, rating_one_count, rating_two_count, rating_three_count, rating_four_count, rating_five_count
             FROM ratings WHERE movie_id IN ",
        );
        push_in_list(&mut builder, movie_ids.iter().map(MovieId::as_str));
        builder.push(" ORDER BY movie_id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|r| MovieRating {
                movie_id: MovieId(r.get::<String, _>(0)),
                counts: counts_from_row(r, 1),
            })
            .collect())
    }

    pub async fn actors_in_movies(&self, movie_ids: &[MovieId]) -> Result<Vec<ActorSummary>> {
        if movie_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT DISTINCT a.actor_id, a.name
             FROM actors a
             INNER JOIN cast_members c ON c.actor_id = a.actor_id
             WHERE c.movie_id IN ",
        );
        push_in_list(&mut builder, movie_ids.iter().map(MovieId::as_str));
        builder.push(" ORDER BY a.actor_id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| ActorSummary {
                actor_id: ActorId(r.get::<String, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    /// Distinct movies with an actor whose name contains `fragment` (case-sensitive).
    pub async fn movie_ids_with_actor_name_containing(
        &self,
        fragment: &str,
    ) -> Result<Vec<MovieId>> {
        let rows = sqlx::query(
            "SELECT DISTINCT c.movie_id
             FROM cast_members c
             INNER JOIN actors a ON a.actor_id = c.actor_id
             WHERE instr(a.name, ?) > 0
             ORDER BY c.movie_id ASC",
        )
        .bind(fragment)
        .fetch_all(&self.pool)
        .await?;
        Ok(strings(rows).into_iter().map(MovieId).collect())
    }

    async fn fetch_movies(
        &self,
        mut builder: QueryBuilder<'_, Sqlite>,
    ) -> Result<Vec<StoredMovie>> {
        builder.push(" ORDER BY m.release_date ASC, m.movie_id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(movie_from_row).collect())
    }

    pub async fn movies_by_ids(&self, movie_ids: &[MovieId]) -> Result<Vec<StoredMovie>> {
        if movie_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(MOVIE_SELECT);
        builder.push(" WHERE m.movie_id IN ");
        push_in_list(&mut builder, movie_ids.iter().map(MovieId::as_str));
        self.fetch_movies(builder).await
    }

    pub async fn movies_by_names(&self, names: &[String]) -> Result<Vec<StoredMovie>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(MOVIE_SELECT);
        builder.push(" WHERE m.name IN ");
        push_in_list(&mut builder, names.iter().map(String::as_str));
        self.fetch_movies(builder).await
    }

    pub async fn movies_released_in_months(
        &self,
        from_year: i32,
        to_year: i32,
        months: &[u32],
    ) -> Result<Vec<StoredMovie>> {
        let mut builder = QueryBuilder::<Sqlite>::new(MOVIE_SELECT);
        builder.push(format!(" WHERE {YEAR_OF} BETWEEN "));
        builder.push_bind(from_year);
        builder.push(" AND ");
        builder.push_bind(to_year);
        builder.push(format!(" AND {MONTH_OF} IN "));
        push_in_list(&mut builder, months.iter().map(|month| i64::from(*month)));
        self.fetch_movies(builder).await
    }

    /// Movies with strictly more than `min_female` female cast rows.
    pub async fn movies_with_more_female_cast_than(
        &self,
        min_female: i64,
    ) -> Result<Vec<StoredMovie>> {
        let mut builder = QueryBuilder::<Sqlite>::new(MOVIE_SELECT);
        builder.push(
            " WHERE (SELECT COUNT(*) FROM cast_members c
                     INNER JOIN actors a ON a.actor_id = c.actor_id
                     WHERE c.movie_id = m.movie_id AND a.gender = 'FEMALE') > ",
        );
        builder.push_bind(min_female);
        self.fetch_movies(builder).await
    }

    /// `(actor, movie)` pairs for movies released in or after `year`.
    pub async fn actor_movie_pairs_from_year(
        &self,
        year: i32,
    ) -> Result<Vec<(ActorSummary, MovieId)>> {
        let sql = format!(
            "SELECT DISTINCT a.actor_id, a.name, m.movie_id
             FROM actors a
             INNER JOIN cast_members c ON c.actor_id = a.actor_id
             INNER JOIN movies m ON m.movie_id = c.movie_id
             WHERE {YEAR_OF} >= ?
             ORDER BY a.actor_id ASC, m.release_date ASC, m.movie_id ASC"
        );
        let rows = sqlx::query(&sql).bind(year).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    ActorSummary {
                        actor_id: ActorId(r.get::<String, _>(0)),
                        name: r.get::<String, _>(1),
                    },
                    MovieId(r.get::<String, _>(2)),
                )
            })
            .collect())
    }

    /// Cast rows for the given movies, optionally restricted to one gender.
    pub async fn cast_for_movies(
        &self,
        movie_ids: &[MovieId],
        gender: Option<Gender>,
    ) -> Result<Vec<(MovieId, CastDetails)>> {
        if movie_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT c.movie_id, a.actor_id, a.name, c.role, c.is_debut_movie
             FROM cast_members c
             INNER JOIN actors a ON a.actor_id = c.actor_id
             WHERE c.movie_id IN ",
        );
        push_in_list(&mut builder, movie_ids.iter().map(MovieId::as_str));
        if let Some(gender) = gender {
            builder.push(" AND a.gender = ");
            builder.push_bind(gender.as_str());
        }
        builder.push(" ORDER BY c.id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    MovieId(r.get::<String, _>(0)),
                    CastDetails {
                        actor: ActorSummary {
                            actor_id: ActorId(r.get::<String, _>(1)),
                            name: r.get::<String, _>(2),
                        },
                        role: r.get::<String, _>(3),
                        is_debut_movie: r.get::<bool, _>(4),
                    },
                )
            })
            .collect())
    }

    pub async fn movie_names_with_actor_name_ending_with(
        &self,
        suffix: &str,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT m.name
             FROM movies m
             INNER JOIN cast_members c ON c.movie_id = m.movie_id
             INNER JOIN actors a ON a.actor_id = c.actor_id
             WHERE length(a.name) >= length(?1)
               AND (length(?1) = 0 OR lower(substr(a.name, -length(?1))) = lower(?1))
             ORDER BY m.name ASC",
        )
        .bind(suffix)
        .fetch_all(&self.pool)
        .await?;
        Ok(strings(rows))
    }

    pub async fn movie_names_with_five_star_count_between(
        &self,
        low: i64,
        high: i64,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT m.name
             FROM movies m
             INNER JOIN ratings r ON r.movie_id = m.movie_id
             WHERE r.rating_five_count BETWEEN ? AND ?
             ORDER BY m.name ASC",
        )
        .bind(low)
        .bind(high)
        .fetch_all(&self.pool)
        .await?;
        Ok(strings(rows))
    }

    pub async fn movie_names_with_ratings_above(
        &self,
        thresholds: &RatingThresholds,
    ) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT m.name
             FROM movies m
             INNER JOIN ratings r ON r.movie_id = m.movie_id
             WHERE (r.rating_five_count >= ?
                 OR r.rating_four_count > ?
                 OR r.rating_three_count > ?
                 OR r.rating_two_count > ?
                 OR r.rating_one_count > ?)
               AND {YEAR_OF} > ?
             ORDER BY m.name ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(thresholds.min_five_star)
            .bind(thresholds.four_star_above)
            .bind(thresholds.three_star_above)
            .bind(thresholds.two_star_above)
            .bind(thresholds.one_star_above)
            .bind(thresholds.released_after_year)
            .fetch_all(&self.pool)
            .await?;
        Ok(strings(rows))
    }

    pub async fn director_names_for_year(&self, year: i32) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT d.name
             FROM directors d
             INNER JOIN movies m ON m.director_id = d.id
             WHERE {YEAR_OF} = ?
             ORDER BY d.name ASC"
        );
        let rows = sqlx::query(&sql).bind(year).fetch_all(&self.pool).await?;
        Ok(strings(rows))
    }

    /// Actors whose debut cast row belongs to a movie released in `[from_year, to_year]`.
    pub async fn actor_names_debuted_between(
        &self,
        from_year: i32,
        to_year: i32,
    ) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT a.name
             FROM actors a
             INNER JOIN cast_members c ON c.actor_id = a.actor_id
             INNER JOIN movies m ON m.movie_id = c.movie_id
             WHERE c.is_debut_movie = 1 AND {YEAR_OF} BETWEEN ? AND ?
             ORDER BY a.name ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(from_year)
            .bind(to_year)
            .fetch_all(&self.pool)
            .await?;
        Ok(strings(rows))
    }

    /// Directors with one movie that both contains `fragment` and was released in `month`.
    pub async fn director_names_with_movie_in_month(
        &self,
        fragment: &str,
        month: u32,
    ) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT d.name
             FROM directors d
             INNER JOIN movies m ON m.director_id = d.id
             WHERE instr(m.name, ?) > 0 AND {MONTH_OF} = ?
             ORDER BY d.name ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(fragment)
            .bind(i64::from(month))
            .fetch_all(&self.pool)
            .await?;
        Ok(strings(rows))
    }

    pub async fn reset_ratings_for_year(&self, year: i32) -> Result<u64> {
        let sql = format!(
            "UPDATE ratings
             SET rating_one_count = 0, rating_two_count = 0, rating_three_count = 0,
                 rating_four_count = 0, rating_five_count = 0
             WHERE movie_id IN (SELECT m.movie_id FROM movies m WHERE {YEAR_OF} = ?)"
        );
        Ok(sqlx::query(&sql)
            .bind(year)
            .execute(&self.pool)
            .await?
            .rows_affected())
    }

    pub async fn average_box_office(&self) -> Result<Option<f64>> {
        let avg: Option<f64> = sqlx::query_scalar("SELECT AVG(box_office_collection_in_crores) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(avg)
    }

    pub async fn movie_actor_counts(&self) -> Result<Vec<MovieActorCount>> {
        let rows = sqlx::query(
            "SELECT m.movie_id, m.name, COUNT(DISTINCT c.actor_id)
             FROM movies m
             LEFT JOIN cast_members c ON c.movie_id = m.movie_id
             GROUP BY m.movie_id
             ORDER BY m.movie_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| MovieActorCount {
                movie_id: MovieId(r.get::<String, _>(0)),
                name: r.get::<String, _>(1),
                actors_count: r.get::<i64, _>(2),
            })
            .collect())
    }

    pub async fn movie_gender_counts(&self) -> Result<Vec<MovieGenderCount>> {
        let rows = sqlx::query(
            "SELECT m.movie_id, m.name,
                    COALESCE(SUM(CASE WHEN a.gender = 'MALE' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN a.gender = 'FEMALE' THEN 1 ELSE 0 END), 0)
             FROM movies m
             LEFT JOIN cast_members c ON c.movie_id = m.movie_id
             LEFT JOIN actors a ON a.actor_id = c.actor_id
             GROUP BY m.movie_id
             ORDER BY m.movie_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| MovieGenderCount {
                movie_id: MovieId(r.get::<String, _>(0)),
                name: r.get::<String, _>(1),
                male_actors_count: r.get::<i64, _>(2),
                female_actors_count: r.get::<i64, _>(3),
            })
            .collect())
    }

    pub async fn movie_roles_counts(&self) -> Result<Vec<MovieRolesCount>> {
        let rows = sqlx::query(
            "SELECT m.movie_id, m.name, COUNT(DISTINCT c.role)
             FROM movies m
             LEFT JOIN cast_members c ON c.movie_id = m.movie_id
             GROUP BY m.movie_id
             ORDER BY m.movie_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| MovieRolesCount {
                movie_id: MovieId(r.get::<String, _>(0)),
                name: r.get::<String, _>(1),
                roles_count: r.get::<i64, _>(2),
            })
            .collect())
    }

    /// Role → number of cast rows, most recent release first when `by_recency`,
    /// alphabetical otherwise.
    pub async fn role_frequencies(&self, by_recency: bool) -> Result<Vec<RoleFrequency>> {
        let order = if by_recency {
            "MAX(m.release_date) DESC, c.role ASC"
        } else {
            "c.role ASC"
        };
        let sql = format!(
            "SELECT c.role, COUNT(*)
             FROM cast_members c
             INNER JOIN movies m ON m.movie_id = c.movie_id
             GROUP BY c.role
             ORDER BY {order}"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| RoleFrequency {
                role: r.get::<String, _>(0),
                count: r.get::<i64, _>(1),
            })
            .collect())
    }

    pub async fn actor_activity(&self) -> Result<Vec<ActorActivity>> {
        let rows = sqlx::query(
            "SELECT a.actor_id, a.name, COUNT(DISTINCT c.movie_id), COUNT(DISTINCT c.role)
             FROM actors a
             LEFT JOIN cast_members c ON c.actor_id = a.actor_id
             GROUP BY a.actor_id
             ORDER BY a.actor_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| ActorActivity {
                actor_id: ActorId(r.get::<String, _>(0)),
                name: r.get::<String, _>(1),
                movies_count: r.get::<i64, _>(2),
                roles_count: r.get::<i64, _>(3),
            })
            .collect())
    }

    pub async fn average_actors_per_movie(&self) -> Result<Option<f64>> {
        let avg: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(actor_count) FROM (
                 SELECT COUNT(DISTINCT c.actor_id) AS actor_count
                 FROM movies m
                 LEFT JOIN cast_members c ON c.movie_id = m.movie_id
                 GROUP BY m.movie_id
             )",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(avg)
    }
}
