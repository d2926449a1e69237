use std::collections::{BTreeMap, HashMap};

use shared::{
    domain::{CommentId, GroupId, PostId, ReactionType, UserId},
    protocol::{
        CommentDetails, PostDetails, ReactionDetail, ReactionSummary, ReplyDetails, ReplySummary,
    },
};
use storage::{StoredComment, StoredPost};
use tracing::debug;

use crate::{
    internal,
    validation::{
        ensure_limit, ensure_member, ensure_offset, ensure_valid_comment, ensure_valid_group,
        ensure_valid_post, ensure_valid_user,
    },
    FeedContext, FeedResult,
};

pub async fn get_post(ctx: &FeedContext, post_id: PostId) -> FeedResult<PostDetails> {
    let post = ensure_valid_post(ctx, post_id).await?;
    let mut details = assemble_posts(ctx, vec![post]).await?;
    details.pop().ok_or(shared::error::FeedError::InvalidPost(post_id.0))
}

/// All posts by the user, newest first.
pub async fn get_user_posts(ctx: &FeedContext, user_id: UserId) -> FeedResult<Vec<PostDetails>> {
    ensure_valid_user(ctx, user_id).await?;
    let posts = ctx.storage.posts_by_user(user_id).await.map_err(internal)?;
    assemble_posts(ctx, posts).await
}

pub async fn get_group_feed(
    ctx: &FeedContext,
    user_id: UserId,
    group_id: GroupId,
    offset: i64,
    limit: i64,
) -> FeedResult<Vec<PostDetails>> {
    ensure_valid_user(ctx, user_id).await?;
    ensure_valid_group(ctx, group_id).await?;
    ensure_member(ctx, user_id, group_id).await?;
    ensure_offset(offset)?;
    ensure_limit(limit)?;

    let posts = ctx
        .storage
        .posts_in_group(group_id, offset, limit)
        .await
        .map_err(internal)?;
    assemble_posts(ctx, posts).await
}

pub async fn get_replies_for_comment(
    ctx: &FeedContext,
    comment_id: CommentId,
) -> FeedResult<Vec<ReplySummary>> {
    ensure_valid_comment(ctx, comment_id).await?;
    let replies = ctx
        .storage
        .replies_for_comment(comment_id)
        .await
        .map_err(internal)?;
    Ok(replies
        .into_iter()
        .map(|reply| ReplySummary {
            comment_id: reply.comment_id,
            commenter: reply.author,
            commented_at: reply.commented_at,
            comment_content: reply.content,
        })
        .collect())
}

pub async fn get_reactions_to_post(
    ctx: &FeedContext,
    post_id: PostId,
) -> FeedResult<Vec<ReactionDetail>> {
    ensure_valid_post(ctx, post_id).await?;
    ctx.storage
        .post_reaction_details(post_id)
        .await
        .map_err(internal)
}

/// Reaction type to count for one post. Types with no reactions are absent.
pub async fn get_reaction_metrics(
    ctx: &FeedContext,
    post_id: PostId,
) -> FeedResult<BTreeMap<ReactionType, i64>> {
    ensure_valid_post(ctx, post_id).await?;
    let metrics = ctx
        .storage
        .reaction_metrics(post_id)
        .await
        .map_err(internal)?;
    Ok(metrics.into_iter().collect())
}

/// Counts reactions on posts and comments alike.
pub async fn get_total_reaction_count(ctx: &FeedContext) -> FeedResult<i64> {
    ctx.storage.total_reaction_count().await.map_err(internal)
}

pub async fn get_posts_with_more_positive_reactions(ctx: &FeedContext) -> FeedResult<Vec<PostId>> {
    ctx.storage
        .posts_with_more_positive_reactions()
        .await
        .map_err(internal)
}

pub async fn get_posts_reacted_by_user(
    ctx: &FeedContext,
    user_id: UserId,
) -> FeedResult<Vec<PostId>> {
    ensure_valid_user(ctx, user_id).await?;
    ctx.storage
        .posts_reacted_by_user(user_id)
        .await
        .map_err(internal)
}

pub async fn get_posts_with_more_comments_than_reactions(
    ctx: &FeedContext,
) -> FeedResult<Vec<PostId>> {
    ctx.storage
        .posts_with_more_comments_than_reactions()
        .await
        .map_err(internal)
}

pub async fn get_silent_group_members(
    ctx: &FeedContext,
    group_id: GroupId,
) -> FeedResult<Vec<UserId>> {
    ensure_valid_group(ctx, group_id).await?;
    ctx.storage
        .silent_group_members(group_id)
        .await
        .map_err(internal)
}

/// Builds nested post details with a fixed number of store round trips,
/// regardless of how many posts, comments or replies are involved.
async fn assemble_posts(ctx: &FeedContext, posts: Vec<StoredPost>) -> FeedResult<Vec<PostDetails>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }
    let post_ids: Vec<PostId> = posts.iter().map(|p| p.post_id).collect();

    let comments = ctx
        .storage
        .comments_for_posts(&post_ids)
        .await
        .map_err(internal)?;
    let comment_ids: Vec<CommentId> = comments.iter().map(|c| c.comment_id).collect();
    debug!(posts = post_ids.len(), comments = comment_ids.len(), "assembling post details");

    let mut post_reactions: HashMap<PostId, Vec<ReactionType>> = HashMap::new();
    for (post_id, kind) in ctx
        .storage
        .reactions_for_posts(&post_ids)
        .await
        .map_err(internal)?
    {
        post_reactions.entry(post_id).or_default().push(kind);
    }

    let mut comment_reactions: HashMap<CommentId, Vec<ReactionType>> = HashMap::new();
    for (comment_id, kind) in ctx
        .storage
        .reactions_for_comments(&comment_ids)
        .await
        .map_err(internal)?
    {
        comment_reactions.entry(comment_id).or_default().push(kind);
    }

    let mut replies_by_parent: HashMap<CommentId, Vec<ReplyDetails>> = HashMap::new();
    let mut top_level: Vec<StoredComment> = Vec::new();
    for comment in comments {
        match comment.parent_comment {
            Some(parent) => {
                let reactions = reaction_summary(&mut comment_reactions, comment.comment_id);
                replies_by_parent.entry(parent).or_default().push(ReplyDetails {
                    comment_id: comment.comment_id,
                    commenter: comment.author,
                    commented_at: comment.commented_at,
                    comment_content: comment.content,
                    reactions,
                });
            }
            None => top_level.push(comment),
        }
    }

    let mut comments_by_post: HashMap<PostId, Vec<CommentDetails>> = HashMap::new();
    for comment in top_level {
        let replies = replies_by_parent.remove(&comment.comment_id).unwrap_or_default();
        let reactions = reaction_summary(&mut comment_reactions, comment.comment_id);
        comments_by_post
            .entry(comment.post_id)
            .or_default()
            .push(CommentDetails {
                comment_id: comment.comment_id,
                commenter: comment.author,
                commented_at: comment.commented_at,
                comment_content: comment.content,
                reactions,
                replies_count: replies.len() as i64,
                replies,
            });
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let comments = comments_by_post.remove(&post.post_id).unwrap_or_default();
            let reactions = post_reactions
                .remove(&post.post_id)
                .map(ReactionSummary::from_types)
                .unwrap_or_default();
            PostDetails {
                post_id: post.post_id,
                posted_by: post.author,
                posted_at: post.posted_at,
                posted_content: post.content,
                reactions,
                group: post.group,
                comments_count: comments.len() as i64,
                comments,
            }
        })
        .collect())
}

fn reaction_summary(
    index: &mut HashMap<CommentId, Vec<ReactionType>>,
    comment_id: CommentId,
) -> ReactionSummary {
    index
        .remove(&comment_id)
        .map(ReactionSummary::from_types)
        .unwrap_or_default()
}
