use chrono::Utc;
use shared::domain::{
    CommentId, GroupId, PostId, ReactionOutcome, ReactionTarget, ReactionType, UserId,
};
use tracing::info;

use crate::{
    internal,
    validation::{
        ensure_admin, ensure_comment_content, ensure_group_name, ensure_member, ensure_post_content,
        ensure_post_owner, ensure_reply_content, ensure_valid_comment, ensure_valid_group,
        ensure_valid_members, ensure_valid_post, ensure_valid_user,
    },
    FeedContext, FeedResult,
};

pub async fn create_user(ctx: &FeedContext, name: &str, profile_pic: &str) -> FeedResult<UserId> {
    let user_id = ctx
        .storage
        .create_user(name, profile_pic)
        .await
        .map_err(internal)?;
    info!(user_id = user_id.0, "user created");
    Ok(user_id)
}

/// Posts into a group require the author to be a member of it.
pub async fn create_post(
    ctx: &FeedContext,
    user_id: UserId,
    content: &str,
    group_id: Option<GroupId>,
) -> FeedResult<PostId> {
    ensure_valid_user(ctx, user_id).await?;
    ensure_post_content(content)?;
    if let Some(group_id) = group_id {
        ensure_valid_group(ctx, group_id).await?;
        ensure_member(ctx, user_id, group_id).await?;
    }

    let post_id = ctx
        .storage
        .insert_post(user_id, content, group_id, Utc::now())
        .await
        .map_err(internal)?;
    info!(post_id = post_id.0, user_id = user_id.0, group_id = ?group_id.map(|g| g.0), "post created");
    Ok(post_id)
}

pub async fn create_comment(
    ctx: &FeedContext,
    user_id: UserId,
    post_id: PostId,
    content: &str,
) -> FeedResult<CommentId> {
    ensure_valid_user(ctx, user_id).await?;
    ensure_valid_post(ctx, post_id).await?;
    ensure_comment_content(content)?;

    let comment_id = ctx
        .storage
        .insert_comment(user_id, post_id, content, None, Utc::now())
        .await
        .map_err(internal)?;
    info!(comment_id = comment_id.0, post_id = post_id.0, "comment created");
    Ok(comment_id)
}

/// Replies stay one level deep: replying to a reply attaches the new reply
/// to that reply's top-level comment.
pub async fn reply_to_comment(
    ctx: &FeedContext,
    user_id: UserId,
    comment_id: CommentId,
    content: &str,
) -> FeedResult<CommentId> {
    ensure_valid_user(ctx, user_id).await?;
    let comment = ensure_valid_comment(ctx, comment_id).await?;
    ensure_reply_content(content)?;

    let parent = comment.parent_comment.unwrap_or(comment.comment_id);
    let reply_id = ctx
        .storage
        .insert_comment(user_id, comment.post_id, content, Some(parent), Utc::now())
        .await
        .map_err(internal)?;
    info!(reply_id = reply_id.0, parent_comment = parent.0, "reply created");
    Ok(reply_id)
}

pub async fn react_to_post(
    ctx: &FeedContext,
    user_id: UserId,
    post_id: PostId,
    reaction_type: ReactionType,
) -> FeedResult<ReactionOutcome> {
    set_reaction(ctx, user_id, ReactionTarget::Post(post_id), reaction_type).await
}

pub async fn react_to_comment(
    ctx: &FeedContext,
    user_id: UserId,
    comment_id: CommentId,
    reaction_type: ReactionType,
) -> FeedResult<ReactionOutcome> {
    set_reaction(ctx, user_id, ReactionTarget::Comment(comment_id), reaction_type).await
}

/// Toggle semantics: no reaction creates one, the same type removes it, a
/// different type replaces it in place. At most one reaction exists per
/// (user, target) afterwards.
pub async fn set_reaction(
    ctx: &FeedContext,
    user_id: UserId,
    target: ReactionTarget,
    reaction_type: ReactionType,
) -> FeedResult<ReactionOutcome> {
    ensure_valid_user(ctx, user_id).await?;
    match target {
        ReactionTarget::Post(post_id) => {
            ensure_valid_post(ctx, post_id).await?;
        }
        ReactionTarget::Comment(comment_id) => {
            ensure_valid_comment(ctx, comment_id).await?;
        }
    }

    let outcome = ctx
        .storage
        .toggle_reaction(user_id, target, reaction_type, Utc::now())
        .await
        .map_err(internal)?;
    info!(user_id = user_id.0, ?target, %reaction_type, ?outcome, "reaction toggled");
    Ok(outcome)
}

pub async fn delete_post(ctx: &FeedContext, user_id: UserId, post_id: PostId) -> FeedResult<()> {
    ensure_valid_user(ctx, user_id).await?;
    let post = ensure_valid_post(ctx, post_id).await?;
    ensure_post_owner(user_id, &post)?;

    ctx.storage.delete_post(post_id).await.map_err(internal)?;
    info!(post_id = post_id.0, user_id = user_id.0, "post deleted");
    Ok(())
}

/// The creator becomes the only admin; duplicate member ids collapse to one membership.
pub async fn create_group(
    ctx: &FeedContext,
    user_id: UserId,
    name: &str,
    member_ids: &[UserId],
) -> FeedResult<GroupId> {
    ensure_valid_user(ctx, user_id).await?;
    ensure_group_name(name)?;
    ensure_valid_members(ctx, member_ids).await?;

    let mut members: Vec<UserId> = member_ids.to_vec();
    members.sort_unstable();
    members.dedup();

    let group_id = ctx
        .storage
        .create_group_with_members(name, user_id, &members)
        .await
        .map_err(internal)?;
    info!(group_id = group_id.0, creator = user_id.0, members = members.len(), "group created");
    Ok(group_id)
}

/// Adding an existing member is a no-op.
pub async fn add_member_to_group(
    ctx: &FeedContext,
    user_id: UserId,
    new_member_id: UserId,
    group_id: GroupId,
) -> FeedResult<()> {
    ensure_valid_user(ctx, user_id).await?;
    ensure_valid_members(ctx, &[new_member_id]).await?;
    ensure_valid_group(ctx, group_id).await?;
    ensure_admin(ctx, user_id, group_id).await?;

    let added = ctx
        .storage
        .add_membership(group_id, new_member_id, false)
        .await
        .map_err(internal)?;
    if added {
        info!(group_id = group_id.0, member_id = new_member_id.0, "member added");
    }
    Ok(())
}

pub async fn remove_member_from_group(
    ctx: &FeedContext,
    user_id: UserId,
    member_id: UserId,
    group_id: GroupId,
) -> FeedResult<()> {
    ensure_valid_user(ctx, user_id).await?;
    ensure_valid_members(ctx, &[member_id]).await?;
    ensure_valid_group(ctx, group_id).await?;
    ensure_member(ctx, user_id, group_id).await?;
    ensure_member(ctx, member_id, group_id).await?;
    ensure_admin(ctx, user_id, group_id).await?;

    ctx.storage
        .remove_membership(group_id, member_id)
        .await
        .map_err(internal)?;
    info!(group_id = group_id.0, member_id = member_id.0, removed_by = user_id.0, "member removed");
    Ok(())
}

/// Promoting an existing admin is a no-op.
pub async fn make_member_as_admin(
    ctx: &FeedContext,
    user_id: UserId,
    member_id: UserId,
    group_id: GroupId,
) -> FeedResult<()> {
    ensure_valid_user(ctx, user_id).await?;
    ensure_valid_members(ctx, &[member_id]).await?;
    ensure_valid_group(ctx, group_id).await?;
    ensure_member(ctx, user_id, group_id).await?;
    ensure_member(ctx, member_id, group_id).await?;
    ensure_admin(ctx, user_id, group_id).await?;

    let promoted = ctx
        .storage
        .promote_to_admin(group_id, member_id)
        .await
        .map_err(internal)?;
    if promoted {
        info!(group_id = group_id.0, member_id = member_id.0, "member promoted to admin");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::FeedError;
    use storage::Storage;

    async fn setup() -> (FeedContext, UserId, UserId) {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let ctx = FeedContext::new(storage);
        let alice = create_user(&ctx, "alice", "alice.png").await.expect("alice");
        let bob = create_user(&ctx, "bob", "bob.png").await.expect("bob");
        (ctx, alice, bob)
    }

    #[tokio::test]
    async fn same_reaction_twice_toggles_off() {
        let (ctx, alice, _) = setup().await;
        let post = create_post(&ctx, alice, "hello", None).await.expect("post");

        let first = react_to_post(&ctx, alice, post, ReactionType::Love)
            .await
            .expect("react");
        let second = react_to_post(&ctx, alice, post, ReactionType::Love)
            .await
            .expect("react again");

        assert_eq!(first, ReactionOutcome::Created);
        assert_eq!(second, ReactionOutcome::Removed);
        assert_eq!(
            ctx.storage
                .count_reactions_on(ReactionTarget::Post(post))
                .await
                .expect("count"),
            0
        );
    }

    #[tokio::test]
    async fn different_reaction_replaces_existing_one() {
        let (ctx, alice, bob) = setup().await;
        let post = create_post(&ctx, alice, "hello", None).await.expect("post");
        let comment = create_comment(&ctx, bob, post, "nice").await.expect("comment");

        react_to_comment(&ctx, alice, comment, ReactionType::ThumbsUp)
            .await
            .expect("react");
        let outcome = react_to_comment(&ctx, alice, comment, ReactionType::Angry)
            .await
            .expect("switch");

        assert_eq!(outcome, ReactionOutcome::Updated);
        let target = ReactionTarget::Comment(comment);
        assert_eq!(ctx.storage.count_reactions_on(target).await.expect("count"), 1);
        assert_eq!(
            ctx.storage.reaction_for(alice, target).await.expect("reaction"),
            Some(ReactionType::Angry)
        );
    }

    #[tokio::test]
    async fn reacting_requires_known_user_and_target() {
        let (ctx, alice, _) = setup().await;
        let post = create_post(&ctx, alice, "hello", None).await.expect("post");

        let err = react_to_post(&ctx, UserId(404), post, ReactionType::Wow)
            .await
            .expect_err("unknown user");
        assert_eq!(err, FeedError::InvalidUser(404));

        let err = react_to_post(&ctx, alice, PostId(404), ReactionType::Wow)
            .await
            .expect_err("unknown post");
        assert_eq!(err, FeedError::InvalidPost(404));

        let err = react_to_comment(&ctx, alice, CommentId(404), ReactionType::Wow)
            .await
            .expect_err("unknown comment");
        assert_eq!(err, FeedError::InvalidComment(404));
    }

    #[tokio::test]
    async fn reply_to_reply_attaches_to_top_level_comment() {
        let (ctx, alice, bob) = setup().await;
        let post = create_post(&ctx, alice, "hello", None).await.expect("post");
        let comment = create_comment(&ctx, bob, post, "top").await.expect("comment");
        let reply = reply_to_comment(&ctx, alice, comment, "first reply")
            .await
            .expect("reply");
        let nested = reply_to_comment(&ctx, bob, reply, "reply to reply")
            .await
            .expect("nested");

        let stored = ctx
            .storage
            .load_comment(nested)
            .await
            .expect("load")
            .expect("exists");
        assert_eq!(stored.parent_comment, Some(comment));
        assert_eq!(stored.post_id, post);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let (ctx, alice, _) = setup().await;
        assert_eq!(
            create_post(&ctx, alice, "", None).await,
            Err(FeedError::InvalidPostContent)
        );
        let post = create_post(&ctx, alice, "x", None).await.expect("post");
        assert_eq!(
            create_comment(&ctx, alice, post, "").await,
            Err(FeedError::InvalidCommentContent)
        );
        let comment = create_comment(&ctx, alice, post, "c").await.expect("comment");
        assert_eq!(
            reply_to_comment(&ctx, alice, comment, "").await,
            Err(FeedError::InvalidReplyContent)
        );
    }

    #[tokio::test]
    async fn only_owner_may_delete_post() {
        let (ctx, alice, bob) = setup().await;
        let post = create_post(&ctx, alice, "mine", None).await.expect("post");

        let err = delete_post(&ctx, bob, post).await.expect_err("not owner");
        assert_eq!(
            err,
            FeedError::UserCannotDeletePost {
                user_id: bob.0,
                post_id: post.0
            }
        );
        delete_post(&ctx, alice, post).await.expect("owner delete");
        assert_eq!(
            delete_post(&ctx, alice, post).await,
            Err(FeedError::InvalidPost(post.0))
        );
    }

    #[tokio::test]
    async fn create_group_deduplicates_members() {
        let (ctx, alice, bob) = setup().await;
        let carol = create_user(&ctx, "carol", "").await.expect("carol");

        let group = create_group(&ctx, alice, "G", &[bob, carol, bob])
            .await
            .expect("group");
        let members = ctx.storage.list_group_members(group).await.expect("members");
        assert_eq!(members, vec![(alice, true), (bob, false), (carol, false)]);
    }

    #[tokio::test]
    async fn create_group_keeps_creator_admin_when_listed_as_member() {
        let (ctx, alice, bob) = setup().await;
        let group = create_group(&ctx, alice, "G", &[alice, bob])
            .await
            .expect("group");
        assert_eq!(
            ctx.storage.membership_status(group, alice).await.expect("status"),
            Some(true)
        );
    }

    #[tokio::test]
    async fn create_group_rejects_unknown_member_and_blank_name() {
        let (ctx, alice, bob) = setup().await;
        assert_eq!(
            create_group(&ctx, alice, "G", &[bob, UserId(77)]).await,
            Err(FeedError::InvalidMember(77))
        );
        assert_eq!(
            create_group(&ctx, alice, " ", &[bob]).await,
            Err(FeedError::InvalidGroupName)
        );
    }

    #[tokio::test]
    async fn non_admin_member_cannot_remove_members() {
        let (ctx, alice, bob) = setup().await;
        let carol = create_user(&ctx, "carol", "").await.expect("carol");
        let group = create_group(&ctx, alice, "G", &[bob, carol])
            .await
            .expect("group");

        let err = remove_member_from_group(&ctx, bob, carol, group)
            .await
            .expect_err("bob is not admin");
        assert_eq!(
            err,
            FeedError::UserNotAdmin {
                user_id: bob.0,
                group_id: group.0
            }
        );
    }

    #[tokio::test]
    async fn membership_commands_require_membership() {
        let (ctx, alice, bob) = setup().await;
        let carol = create_user(&ctx, "carol", "").await.expect("carol");
        let group = create_group(&ctx, alice, "G", &[]).await.expect("group");

        assert_eq!(
            add_member_to_group(&ctx, bob, carol, group).await,
            Err(FeedError::UserNotInGroup {
                user_id: bob.0,
                group_id: group.0
            })
        );
        assert_eq!(
            remove_member_from_group(&ctx, alice, carol, group).await,
            Err(FeedError::UserNotInGroup {
                user_id: carol.0,
                group_id: group.0
            })
        );
        assert_eq!(
            make_member_as_admin(&ctx, alice, carol, group).await,
            Err(FeedError::UserNotInGroup {
                user_id: carol.0,
                group_id: group.0
            })
        );
        assert_eq!(
            add_member_to_group(&ctx, alice, carol, GroupId(999)).await,
            Err(FeedError::InvalidGroup(999))
        );
    }

    #[tokio::test]
    async fn admin_can_add_promote_and_remove() {
        let (ctx, alice, bob) = setup().await;
        let carol = create_user(&ctx, "carol", "").await.expect("carol");
        let group = create_group(&ctx, alice, "G", &[]).await.expect("group");

        add_member_to_group(&ctx, alice, bob, group).await.expect("add bob");
        add_member_to_group(&ctx, alice, bob, group).await.expect("add bob twice");
        make_member_as_admin(&ctx, alice, bob, group).await.expect("promote");
        add_member_to_group(&ctx, bob, carol, group)
            .await
            .expect("bob adds carol as admin");
        remove_member_from_group(&ctx, bob, carol, group)
            .await
            .expect("bob removes carol");

        let members = ctx.storage.list_group_members(group).await.expect("members");
        assert_eq!(members, vec![(alice, true), (bob, true)]);
    }

    #[tokio::test]
    async fn group_posts_require_membership() {
        let (ctx, alice, bob) = setup().await;
        let group = create_group(&ctx, alice, "G", &[]).await.expect("group");

        assert_eq!(
            create_post(&ctx, bob, "intruder", Some(group)).await,
            Err(FeedError::UserNotInGroup {
                user_id: bob.0,
                group_id: group.0
            })
        );
        assert_eq!(
            create_post(&ctx, alice, "hi", Some(GroupId(999))).await,
            Err(FeedError::InvalidGroup(999))
        );
        create_post(&ctx, alice, "welcome", Some(group))
            .await
            .expect("member post");
    }
}
