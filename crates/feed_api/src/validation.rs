use shared::{
    domain::{CommentId, GroupId, PostId, ReactionType, UserId},
    error::FeedError,
    protocol::GroupSummary,
};
use storage::{StoredComment, StoredPost};

use crate::{internal, FeedContext, FeedResult};

pub async fn ensure_valid_user(ctx: &FeedContext, user_id: UserId) -> FeedResult<()> {
    let exists = ctx.storage.user_exists(user_id).await.map_err(internal)?;
    if !exists {
        return Err(FeedError::InvalidUser(user_id.0));
    }
    Ok(())
}

pub async fn ensure_valid_post(ctx: &FeedContext, post_id: PostId) -> FeedResult<StoredPost> {
    ctx.storage
        .load_post(post_id)
        .await
        .map_err(internal)?
        .ok_or(FeedError::InvalidPost(post_id.0))
}

pub async fn ensure_valid_comment(
    ctx: &FeedContext,
    comment_id: CommentId,
) -> FeedResult<StoredComment> {
    ctx.storage
        .load_comment(comment_id)
        .await
        .map_err(internal)?
        .ok_or(FeedError::InvalidComment(comment_id.0))
}

pub async fn ensure_valid_group(ctx: &FeedContext, group_id: GroupId) -> FeedResult<GroupSummary> {
    ctx.storage
        .load_group(group_id)
        .await
        .map_err(internal)?
        .ok_or(FeedError::InvalidGroup(group_id.0))
}

/// Fails with the first id in `member_ids` that has no user row.
pub async fn ensure_valid_members(ctx: &FeedContext, member_ids: &[UserId]) -> FeedResult<()> {
    let existing = ctx
        .storage
        .existing_user_ids(member_ids)
        .await
        .map_err(internal)?;
    match member_ids.iter().find(|id| !existing.contains(id)) {
        Some(missing) => Err(FeedError::InvalidMember(missing.0)),
        None => Ok(()),
    }
}

/// Returns the member's admin flag.
pub async fn ensure_member(
    ctx: &FeedContext,
    user_id: UserId,
    group_id: GroupId,
) -> FeedResult<bool> {
    ctx.storage
        .membership_status(group_id, user_id)
        .await
        .map_err(internal)?
        .ok_or(FeedError::UserNotInGroup {
            user_id: user_id.0,
            group_id: group_id.0,
        })
}

pub async fn ensure_admin(ctx: &FeedContext, user_id: UserId, group_id: GroupId) -> FeedResult<()> {
    if !ensure_member(ctx, user_id, group_id).await? {
        return Err(FeedError::UserNotAdmin {
            user_id: user_id.0,
            group_id: group_id.0,
        });
    }
    Ok(())
}

pub fn ensure_post_content(content: &str) -> FeedResult<()> {
    if content.trim().is_empty() {
        return Err(FeedError::InvalidPostContent);
    }
    Ok(())
}

pub fn ensure_comment_content(content: &str) -> FeedResult<()> {
    if content.trim().is_empty() {
        return Err(FeedError::InvalidCommentContent);
    }
    Ok(())
}

pub fn ensure_reply_content(content: &str) -> FeedResult<()> {
    if content.trim().is_empty() {
        return Err(FeedError::InvalidReplyContent);
    }
    Ok(())
}

pub fn ensure_group_name(name: &str) -> FeedResult<()> {
    if name.trim().is_empty() {
        return Err(FeedError::InvalidGroupName);
    }
    Ok(())
}

pub fn ensure_offset(offset: i64) -> FeedResult<()> {
    if offset < 0 {
        return Err(FeedError::InvalidOffset(offset));
    }
    Ok(())
}

pub fn ensure_limit(limit: i64) -> FeedResult<()> {
    if limit <= 0 {
        return Err(FeedError::InvalidLimit(limit));
    }
    Ok(())
}

pub fn ensure_post_owner(user_id: UserId, post: &StoredPost) -> FeedResult<()> {
    if post.author.user_id != user_id {
        return Err(FeedError::UserCannotDeletePost {
            user_id: user_id.0,
            post_id: post.post_id.0,
        });
    }
    Ok(())
}

pub fn parse_reaction_type(raw: &str) -> FeedResult<ReactionType> {
    raw.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_is_rejected_per_kind() {
        assert_eq!(ensure_post_content("  "), Err(FeedError::InvalidPostContent));
        assert_eq!(ensure_comment_content(""), Err(FeedError::InvalidCommentContent));
        assert_eq!(ensure_reply_content("\n"), Err(FeedError::InvalidReplyContent));
        assert_eq!(ensure_group_name(""), Err(FeedError::InvalidGroupName));
        assert!(ensure_post_content("hi").is_ok());
    }

    #[test]
    fn paging_bounds() {
        assert!(ensure_offset(0).is_ok());
        assert_eq!(ensure_offset(-1), Err(FeedError::InvalidOffset(-1)));
        assert!(ensure_limit(1).is_ok());
        assert_eq!(ensure_limit(0), Err(FeedError::InvalidLimit(0)));
    }

    #[test]
    fn unknown_reaction_label_is_invalid_reaction_type() {
        assert_eq!(
            parse_reaction_type("CONFUSED"),
            Err(FeedError::InvalidReactionType("CONFUSED".into()))
        );
        assert_eq!(parse_reaction_type("love"), Ok(ReactionType::Love));
    }
}
