use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ActorId, CommentId, Gender, GroupId, MovieId, PostId, ReactionType, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub name: String,
    pub profile_pic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group_id: GroupId,
    pub name: String,
}

/// Count plus the labels of every reaction on a target. Labels repeat once per
/// reaction row, so the list is a multiset view rather than a distinct set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub count: i64,
    #[serde(rename = "type")]
    pub types: Vec<ReactionType>,
}

impl ReactionSummary {
    pub fn from_types(types: Vec<ReactionType>) -> Self {
        Self {
            count: types.len() as i64,
            types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyDetails {
    pub comment_id: CommentId,
    pub commenter: UserSummary,
    pub commented_at: DateTime<Utc>,
    pub comment_content: String,
    pub reactions: ReactionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDetails {
    pub comment_id: CommentId,
    pub commenter: UserSummary,
    pub commented_at: DateTime<Utc>,
    pub comment_content: String,
    pub reactions: ReactionSummary,
    pub replies_count: i64,
    pub replies: Vec<ReplyDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetails {
    pub post_id: PostId,
    pub posted_by: UserSummary,
    pub posted_at: DateTime<Utc>,
    pub posted_content: String,
    pub reactions: ReactionSummary,
    pub group: Option<GroupSummary>,
    /// Top-level comments only; replies sit under their parent comment.
    pub comments: Vec<CommentDetails>,
    /// Number of top-level comments. Replies are counted in each comment's `replies_count`.
    pub comments_count: i64,
}

/// A reply as listed under its parent comment, without reaction data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplySummary {
    pub comment_id: CommentId,
    pub commenter: UserSummary,
    pub commented_at: DateTime<Utc>,
    pub comment_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionDetail {
    pub user_id: UserId,
    pub name: String,
    pub profile_pic: String,
    pub reaction: ReactionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSeed {
    pub actor_id: String,
    pub name: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastSeed {
    pub actor_id: String,
    pub role: String,
    #[serde(default)]
    pub is_debut_movie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSeed {
    pub movie_id: String,
    pub name: String,
    #[serde(default)]
    pub actors: Vec<CastSeed>,
    pub box_office_collection_in_crores: String,
    pub release_date: String,
    pub director_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSeed {
    pub movie_id: String,
    pub rating_one_count: i64,
    pub rating_two_count: i64,
    pub rating_three_count: i64,
    pub rating_four_count: i64,
    pub rating_five_count: i64,
}

/// Everything a catalog bulk load needs, in the shape of a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default, alias = "actors_list")]
    pub actors: Vec<ActorSeed>,
    #[serde(default, alias = "movies_list")]
    pub movies: Vec<MovieSeed>,
    #[serde(default, alias = "directors_list")]
    pub directors: Vec<String>,
    #[serde(default, alias = "movie_rating_list")]
    pub movie_ratings: Vec<RatingSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub actor_id: ActorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastDetails {
    pub actor: ActorSummary,
    pub role: String,
    pub is_debut_movie: bool,
}

/// Star-bucket counts of a movie's single rating row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCounts {
    pub rating_one_count: i64,
    pub rating_two_count: i64,
    pub rating_three_count: i64,
    pub rating_four_count: i64,
    pub rating_five_count: i64,
}

impl RatingCounts {
    fn weighted_buckets(&self) -> [(i64, i64); 5] {
        [
            (self.rating_one_count, 1),
            (self.rating_two_count, 2),
            (self.rating_three_count, 3),
            (self.rating_four_count, 4),
            (self.rating_five_count, 5),
        ]
    }

    /// Number of ratings, saturating at `i64::MAX`.
    pub fn total(&self) -> i64 {
        self.weighted_buckets()
            .iter()
            .fold(0i64, |acc, (count, _)| acc.saturating_add(*count))
    }

    /// Sum of stars over all ratings, or `None` when it does not fit in an i64.
    pub fn checked_weighted_sum(&self) -> Option<i64> {
        self.weighted_buckets()
            .iter()
            .try_fold(0i64, |acc, (count, stars)| acc.checked_add(count.checked_mul(*stars)?))
    }

    /// Weighted star average; 0 when nobody rated.
    pub fn average(&self) -> f64 {
        let (weighted, total) = self
            .weighted_buckets()
            .iter()
            .fold((0.0, 0.0), |(weighted, total), (count, stars)| {
                let count = *count as f64;
                (weighted + count * *stars as f64, total + count)
            });
        if total == 0.0 {
            return 0.0;
        }
        weighted / total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRating {
    pub movie_id: MovieId,
    #[serde(flatten)]
    pub counts: RatingCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub movie_id: MovieId,
    pub name: String,
    pub cast: Vec<CastDetails>,
    pub box_office_collection_in_crores: f64,
    pub release_date: NaiveDate,
    pub director_name: String,
    pub average_rating: f64,
    pub total_number_of_ratings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorMovies {
    pub actor_id: ActorId,
    pub name: String,
    pub movies: Vec<MovieDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieActorCount {
    pub movie_id: MovieId,
    pub name: String,
    pub actors_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieGenderCount {
    pub movie_id: MovieId,
    pub name: String,
    pub male_actors_count: i64,
    pub female_actors_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRolesCount {
    pub movie_id: MovieId,
    pub name: String,
    pub roles_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorActivity {
    pub actor_id: ActorId,
    pub name: String,
    pub movies_count: i64,
    pub roles_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFrequency {
    pub role: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_rating_weights_star_buckets() {
        let counts = RatingCounts {
            rating_one_count: 3,
            rating_two_count: 4,
            rating_three_count: 7,
            rating_four_count: 9,
            rating_five_count: 2,
        };
        assert_eq!(counts.total(), 25);
        assert!((counts.average() - 77.0 / 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_rating_of_empty_counts_is_zero() {
        assert_eq!(RatingCounts::default().average(), 0.0);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let counts = RatingCounts {
            rating_five_count: i64::MAX / 2 + 1,
            rating_one_count: i64::MAX / 2,
            ..RatingCounts::default()
        };
        assert_eq!(counts.checked_weighted_sum(), None);
        assert_eq!(counts.total(), i64::MAX);
        assert!((counts.average() - 3.0).abs() < 1e-9);

        let fits = RatingCounts {
            rating_five_count: i64::MAX / 5,
            ..RatingCounts::default()
        };
        assert_eq!(fits.checked_weighted_sum(), Some(i64::MAX / 5 * 5));
    }

    #[test]
    fn reaction_summary_keeps_duplicate_labels() {
        let summary = ReactionSummary::from_types(vec![
            ReactionType::Wow,
            ReactionType::Wow,
            ReactionType::Sad,
        ]);
        assert_eq!(summary.count, 3);
        let json = serde_json::to_value(&summary).expect("json");
        assert_eq!(json["type"], serde_json::json!(["WOW", "WOW", "SAD"]));
    }

    #[test]
    fn catalog_seed_accepts_fixture_field_names() {
        let seed: CatalogSeed = serde_json::from_value(serde_json::json!({
            "actors_list": [{"actor_id": "actor_1", "name": "Actor 1", "gender": "FEMALE"}],
            "directors_list": ["Director 1"],
            "movies_list": [],
            "movie_rating_list": []
        }))
        .expect("seed");
        assert_eq!(seed.actors.len(), 1);
        assert_eq!(seed.actors[0].gender, Gender::Female);
        assert_eq!(seed.directors, vec!["Director 1".to_string()]);
    }
}
