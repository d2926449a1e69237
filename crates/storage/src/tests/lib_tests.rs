use super::*;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use shared::{
    domain::{
        ActorId, CommentId, Gender, MovieId, PostId, ReactionOutcome, ReactionTarget, ReactionType,
        UserId,
    },
    protocol::{ActorSeed, MovieRating, RatingCounts},
};

async fn memory_storage() -> Storage {
    Storage::new("sqlite::memory:").await.expect("db")
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
}

fn small_catalog() -> NewCatalog {
    NewCatalog {
        actors: vec![
            ActorSeed {
                actor_id: "actor_1".into(),
                name: "Will Smith".into(),
                gender: Gender::Male,
            },
            ActorSeed {
                actor_id: "actor_2".into(),
                name: "Jada Pinkett".into(),
                gender: Gender::Female,
            },
        ],
        directors: vec!["Director 1".into(), "Director 2".into(), "Director 1".into()],
        movies: vec![
            NewMovie {
                movie_id: MovieId::new("movie_1"),
                name: "Big Summer".into(),
                box_office_collection_in_crores: 10.0,
                release_date: date("2008-06-01"),
                director_name: "Director 1".into(),
            },
            NewMovie {
                movie_id: MovieId::new("movie_2"),
                name: "Winter".into(),
                box_office_collection_in_crores: 20.0,
                release_date: date("2000-01-15"),
                director_name: "Director 2".into(),
            },
        ],
        cast: vec![
            NewCast {
                movie_id: MovieId::new("movie_1"),
                actor_id: ActorId::new("actor_1"),
                role: "hero".into(),
                is_debut_movie: true,
            },
            NewCast {
                movie_id: MovieId::new("movie_1"),
                actor_id: ActorId::new("actor_2"),
                role: "heroine".into(),
                is_debut_movie: false,
            },
            NewCast {
                movie_id: MovieId::new("movie_2"),
                actor_id: ActorId::new("actor_1"),
                role: "villain".into(),
                is_debut_movie: false,
            },
        ],
        ratings: vec![MovieRating {
            movie_id: MovieId::new("movie_1"),
            counts: RatingCounts {
                rating_one_count: 1,
                rating_two_count: 0,
                rating_three_count: 0,
                rating_four_count: 0,
                rating_five_count: 1500,
            },
        }],
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = memory_storage().await;
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("feed.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.pool().close().await;

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn memory_urls_have_no_parent_directory() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/feed.db?mode=rwc"),
        Some(PathBuf::from("./data/feed.db"))
    );
}

#[tokio::test]
async fn toggles_reaction_through_create_update_remove() {
    let storage = memory_storage().await;
    let user = storage.create_user("alice", "a.png").await.expect("user");
    let post = storage
        .insert_post(user, "hello", None, Utc::now())
        .await
        .expect("post");
    let target = ReactionTarget::Post(post);

    let first = storage
        .toggle_reaction(user, target, ReactionType::Wow, Utc::now())
        .await
        .expect("create");
    assert_eq!(first, ReactionOutcome::Created);

    let second = storage
        .toggle_reaction(user, target, ReactionType::Sad, Utc::now())
        .await
        .expect("update");
    assert_eq!(second, ReactionOutcome::Updated);
    assert_eq!(storage.count_reactions_on(target).await.expect("count"), 1);
    assert_eq!(
        storage.reaction_for(user, target).await.expect("reaction"),
        Some(ReactionType::Sad)
    );

    let third = storage
        .toggle_reaction(user, target, ReactionType::Sad, Utc::now())
        .await
        .expect("remove");
    assert_eq!(third, ReactionOutcome::Removed);
    assert_eq!(storage.count_reactions_on(target).await.expect("count"), 0);
}

#[tokio::test]
async fn schema_rejects_second_reaction_row_for_same_user_and_target() {
    let storage = memory_storage().await;
    let user = storage.create_user("bob", "").await.expect("user");
    let post = storage
        .insert_post(user, "hello", None, Utc::now())
        .await
        .expect("post");
    storage
        .toggle_reaction(user, ReactionTarget::Post(post), ReactionType::Lit, Utc::now())
        .await
        .expect("react");

    let duplicate = sqlx::query(
        "INSERT INTO reactions (reaction_type, post_id, reacted_at, reacted_by) VALUES ('LOVE', ?, ?, ?)",
    )
    .bind(post.0)
    .bind(Utc::now())
    .bind(user.0)
    .execute(storage.pool())
    .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn reactions_on_post_and_comment_are_independent() {
    let storage = memory_storage().await;
    let user = storage.create_user("carol", "").await.expect("user");
    let post = storage
        .insert_post(user, "hello", None, Utc::now())
        .await
        .expect("post");
    let comment = storage
        .insert_comment(user, post, "first", None, Utc::now())
        .await
        .expect("comment");

    storage
        .toggle_reaction(user, ReactionTarget::Post(post), ReactionType::Haha, Utc::now())
        .await
        .expect("post reaction");
    storage
        .toggle_reaction(user, ReactionTarget::Comment(comment), ReactionType::Haha, Utc::now())
        .await
        .expect("comment reaction");

    assert_eq!(storage.total_reaction_count().await.expect("total"), 2);
    assert_eq!(
        storage.posts_reacted_by_user(user).await.expect("reacted"),
        vec![post]
    );
}

#[tokio::test]
async fn deleting_post_cascades_to_comments_and_reactions() {
    let storage = memory_storage().await;
    let user = storage.create_user("dave", "").await.expect("user");
    let post = storage
        .insert_post(user, "doomed", None, Utc::now())
        .await
        .expect("post");
    let comment = storage
        .insert_comment(user, post, "c", None, Utc::now())
        .await
        .expect("comment");
    let reply = storage
        .insert_comment(user, post, "r", Some(comment), Utc::now())
        .await
        .expect("reply");
    storage
        .toggle_reaction(user, ReactionTarget::Comment(reply), ReactionType::Love, Utc::now())
        .await
        .expect("reply reaction");
    storage
        .toggle_reaction(user, ReactionTarget::Post(post), ReactionType::Love, Utc::now())
        .await
        .expect("post reaction");

    assert!(storage.delete_post(post).await.expect("delete"));
    assert!(storage.load_comment(comment).await.expect("load").is_none());
    assert!(storage.load_comment(reply).await.expect("load").is_none());
    assert_eq!(storage.total_reaction_count().await.expect("total"), 0);
    assert!(!storage.delete_post(post).await.expect("second delete"));
}

#[tokio::test]
async fn group_feed_pages_newest_first() {
    let storage = memory_storage().await;
    let user = storage.create_user("erin", "").await.expect("user");
    let group = storage
        .create_group_with_members("book club", user, &[])
        .await
        .expect("group");
    let base = Utc::now();
    let mut posts = Vec::new();
    for i in 0..3 {
        posts.push(
            storage
                .insert_post(user, &format!("post {i}"), Some(group), base + ChronoDuration::seconds(i))
                .await
                .expect("post"),
        );
    }

    let first_page = storage.posts_in_group(group, 0, 2).await.expect("page");
    assert_eq!(
        first_page.iter().map(|p| p.post_id).collect::<Vec<_>>(),
        vec![posts[2], posts[1]]
    );
    let second_page = storage.posts_in_group(group, 2, 2).await.expect("page");
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].post_id, posts[0]);
    assert_eq!(
        second_page[0].group.as_ref().map(|g| g.name.as_str()),
        Some("book club")
    );
}

#[tokio::test]
async fn group_creation_makes_only_creator_admin() {
    let storage = memory_storage().await;
    let owner = storage.create_user("owner", "").await.expect("owner");
    let a = storage.create_user("a", "").await.expect("a");
    let b = storage.create_user("b", "").await.expect("b");

    let group = storage
        .create_group_with_members("g", owner, &[a, b, owner])
        .await
        .expect("group");
    let members = storage.list_group_members(group).await.expect("members");
    assert_eq!(members, vec![(owner, true), (a, false), (b, false)]);

    assert!(!storage.add_membership(group, a, false).await.expect("re-add"));
    assert!(storage.promote_to_admin(group, a).await.expect("promote"));
    assert!(!storage.promote_to_admin(group, a).await.expect("promote again"));
    assert_eq!(storage.membership_status(group, a).await.expect("status"), Some(true));
    assert!(storage.remove_membership(group, b).await.expect("remove"));
    assert_eq!(storage.membership_status(group, b).await.expect("status"), None);
}

#[tokio::test]
async fn existing_user_ids_resolves_set_in_one_query() {
    let storage = memory_storage().await;
    let a = storage.create_user("a", "").await.expect("a");
    let b = storage.create_user("b", "").await.expect("b");
    let found = storage
        .existing_user_ids(&[a, b, UserId(999)])
        .await
        .expect("lookup");
    assert_eq!(found.len(), 2);
    assert!(found.contains(&a) && found.contains(&b));
}

#[tokio::test]
async fn comment_batches_include_replies_with_parent_ids() {
    let storage = memory_storage().await;
    let user = storage.create_user("frank", "f.png").await.expect("user");
    let post = storage
        .insert_post(user, "p", None, Utc::now())
        .await
        .expect("post");
    let comment = storage
        .insert_comment(user, post, "c", None, Utc::now())
        .await
        .expect("comment");
    let reply = storage
        .insert_comment(user, post, "r", Some(comment), Utc::now())
        .await
        .expect("reply");

    let rows = storage.comments_for_posts(&[post]).await.expect("comments");
    assert_eq!(rows.len(), 2);
    let reply_row = rows
        .iter()
        .find(|row| row.comment_id == reply)
        .expect("reply row");
    assert_eq!(reply_row.parent_comment, Some(comment));
    assert_eq!(reply_row.author.profile_pic, "f.png");

    let replies = storage.replies_for_comment(comment).await.expect("replies");
    assert_eq!(replies.len(), 1);
    assert!(storage
        .replies_for_comment(CommentId(12345))
        .await
        .expect("none")
        .is_empty());
    assert!(storage.load_post(PostId(12345)).await.expect("load").is_none());
}

#[tokio::test]
async fn populates_catalog_and_answers_aggregates() {
    let storage = memory_storage().await;
    storage
        .populate_catalog(&small_catalog())
        .await
        .expect("populate");

    let counts = storage.movie_actor_counts().await.expect("counts");
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].actors_count, 2);

    let summer = storage
        .movies_released_in_months(2005, 2010, &[5, 6, 7])
        .await
        .expect("summer");
    assert_eq!(summer.len(), 1);
    assert_eq!(summer[0].director_name, "Director 1");
    assert_eq!(summer[0].rating.map(|r| r.rating_five_count), Some(1500));

    assert_eq!(
        storage
            .movie_names_with_actor_name_ending_with("SMITH")
            .await
            .expect("smith"),
        vec!["Big Summer".to_string(), "Winter".to_string()]
    );
    assert_eq!(
        storage
            .movie_names_with_five_star_count_between(1000, 3000)
            .await
            .expect("range"),
        vec!["Big Summer".to_string()]
    );
    assert_eq!(
        storage.director_names_for_year(2000).await.expect("directors"),
        vec!["Director 2".to_string()]
    );
    assert_eq!(
        storage
            .director_names_with_movie_in_month("Big", 6)
            .await
            .expect("big in june"),
        vec!["Director 1".to_string()]
    );
    assert_eq!(
        storage
            .actor_names_debuted_between(2001, 2100)
            .await
            .expect("debuts"),
        vec!["Will Smith".to_string()]
    );

    let avg = storage.average_box_office().await.expect("avg");
    assert_eq!(avg, Some(15.0));
}

#[tokio::test]
async fn reset_ratings_only_touches_requested_year() {
    let storage = memory_storage().await;
    storage
        .populate_catalog(&small_catalog())
        .await
        .expect("populate");

    assert_eq!(storage.reset_ratings_for_year(1999).await.expect("reset"), 0);
    assert_eq!(storage.reset_ratings_for_year(2008).await.expect("reset"), 1);
    let rating = storage
        .rating_for_movie(&MovieId::new("movie_1"))
        .await
        .expect("rating")
        .expect("row survives");
    assert_eq!(rating.total(), 0);
}

#[tokio::test]
async fn empty_catalog_aggregates_are_absent() {
    let storage = memory_storage().await;
    assert_eq!(storage.average_box_office().await.expect("avg"), None);
    assert_eq!(storage.average_actors_per_movie().await.expect("avg"), None);
    assert!(storage.role_frequencies(true).await.expect("roles").is_empty());
}
