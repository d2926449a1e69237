//! Social-feed operations: posts, comments, replies, reactions and groups.
//!
//! Every public operation validates its preconditions first (see
//! [`validation`]), then performs its store calls. Failures surface as one
//! [`FeedError`] variant per violated precondition.

use shared::error::FeedError;
use storage::Storage;

mod commands;
mod queries;
pub mod validation;

pub use commands::{
    add_member_to_group, create_comment, create_group, create_post, create_user, delete_post,
    make_member_as_admin, react_to_comment, react_to_post, remove_member_from_group,
    reply_to_comment, set_reaction,
};
pub use queries::{
    get_group_feed, get_post, get_posts_reacted_by_user,
    get_posts_with_more_comments_than_reactions, get_posts_with_more_positive_reactions,
    get_reaction_metrics, get_reactions_to_post, get_replies_for_comment,
    get_silent_group_members, get_total_reaction_count, get_user_posts,
};

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Clone)]
pub struct FeedContext {
    pub storage: Storage,
}

impl FeedContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

fn internal(err: anyhow::Error) -> FeedError {
    FeedError::Internal(format!("{err:#}"))
}
