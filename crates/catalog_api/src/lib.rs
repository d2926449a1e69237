//! Movie catalog: bulk population from a seed document plus record
//! operations, reports and aggregates over actors, directors, movies, cast
//! and ratings.

use shared::error::CatalogError;
use storage::Storage;

mod aggregates;
mod populate;
mod records;
mod reports;
pub mod validation;

pub use aggregates::{
    get_average_box_office_collections, get_average_no_of_actors_for_all_movies,
    get_male_and_female_actors_count_for_each_movie, get_movies_with_at_least_actors,
    get_movies_with_distinct_actors_count, get_no_of_movies_and_distinct_roles_for_each_actor,
    get_role_frequency, get_role_frequency_in_order, get_roles_count_for_each_movie,
};
pub use populate::populate_database;
pub use records::{
    delete_movie_rating, get_all_actor_objects_acted_in_given_movies,
    get_all_rating_objects_for_given_movies, get_average_rating_of_movie,
    get_distinct_movies_acted_by_actor_whose_name_contains, get_movies_directed_by_director,
    get_no_of_distinct_movies_actor_acted, get_total_number_of_ratings,
    remove_all_actors_from_given_movie, update_director_for_given_movie,
};
pub use reports::{
    get_actor_movies_released_in_year_greater_than_or_equal_to, get_actor_names_debuted_after_year,
    get_director_names_with_movie_containing_in_month,
    get_female_cast_details_from_movies_having_more_than, get_movie_directors_in_given_year,
    get_movie_names_with_actor_name_ending_with, get_movie_names_with_five_star_ratings_in_range,
    get_movie_names_with_ratings_above_given_minimum, get_movies_by_given_movie_names,
    get_movies_released_in_summer, reset_ratings_for_movies_in_given_year,
};
pub use storage::RatingThresholds;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Clone)]
pub struct CatalogContext {
    pub storage: Storage,
}

impl CatalogContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

fn internal(err: anyhow::Error) -> CatalogError {
    CatalogError::Internal(format!("{err:#}"))
}

/// Rounds to three decimal places, the precision aggregates are reported at.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::round3;

    #[test]
    fn rounds_to_three_places() {
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert_eq!(round3(10.0), 10.0);
        assert_eq!(round3(1.23449), 1.234);
    }
}
