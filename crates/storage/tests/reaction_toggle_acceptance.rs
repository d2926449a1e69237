use chrono::Utc;
use shared::domain::{ReactionTarget, ReactionType};
use storage::Storage;

async fn file_storage(dir: &tempfile::TempDir) -> Storage {
    let url = format!("sqlite://{}", dir.path().join("toggle.db").display());
    Storage::new(&url).await.expect("db")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_by_one_user_leave_at_most_one_reaction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = file_storage(&dir).await;

    let author = storage.create_user("author", "").await.expect("author");
    let fan = storage.create_user("fan", "").await.expect("fan");
    let post = storage
        .insert_post(author, "contended", None, Utc::now())
        .await
        .expect("post");
    let target = ReactionTarget::Post(post);

    let mut handles = Vec::new();
    for n in 0..24 {
        let storage = storage.clone();
        let kind = if n % 3 == 0 {
            ReactionType::Love
        } else {
            ReactionType::Wow
        };
        handles.push(tokio::spawn(async move {
            storage
                .toggle_reaction(fan, target, kind, Utc::now())
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("toggle");
    }

    let count = storage.count_reactions_on(target).await.expect("count");
    assert!(count <= 1, "found {count} reactions for one user on one post");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_by_distinct_users_all_land() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = file_storage(&dir).await;

    let author = storage.create_user("author", "").await.expect("author");
    let post = storage
        .insert_post(author, "popular", None, Utc::now())
        .await
        .expect("post");
    let target = ReactionTarget::Post(post);

    let mut fans = Vec::new();
    for n in 0..10 {
        fans.push(
            storage
                .create_user(&format!("fan-{n}"), "")
                .await
                .expect("fan"),
        );
    }

    let mut handles = Vec::new();
    for fan in fans {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage
                .toggle_reaction(fan, target, ReactionType::Lit, Utc::now())
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("toggle");
    }

    assert_eq!(storage.count_reactions_on(target).await.expect("count"), 10);
    let metrics = storage.reaction_metrics(post).await.expect("metrics");
    assert_eq!(metrics, vec![(ReactionType::Lit, 10)]);
}
