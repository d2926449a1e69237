use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use shared::{
    domain::{CommentId, GroupId, PostId, ReactionOutcome, ReactionTarget, ReactionType, UserId},
    protocol::{GroupSummary, ReactionDetail, UserSummary},
};

use crate::{push_in_list, Storage};

/// A post row joined with its author and, when present, its group.
#[derive(Debug, Clone)]
pub struct StoredPost {
    pub post_id: PostId,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub author: UserSummary,
    pub group: Option<GroupSummary>,
}

/// A comment or reply row joined with its author. `parent_comment` is set for replies.
#[derive(Debug, Clone)]
pub struct StoredComment {
    pub comment_id: CommentId,
    pub post_id: PostId,
    pub parent_comment: Option<CommentId>,
    pub content: String,
    pub commented_at: DateTime<Utc>,
    pub author: UserSummary,
}

const POST_SELECT: &str = "SELECT p.id, p.content, p.posted_at, u.id, u.name, u.profile_pic, g.id, g.name
     FROM posts p
     INNER JOIN users u ON u.id = p.posted_by
     LEFT JOIN feed_groups g ON g.id = p.group_id ";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.parent_comment, c.content, c.commented_at, u.id, u.name, u.profile_pic
     FROM comments c
     INNER JOIN users u ON u.id = c.commented_by ";

fn post_from_row(r: &SqliteRow) -> StoredPost {
    StoredPost {
        post_id: PostId(r.get::<i64, _>(0)),
        content: r.get::<String, _>(1),
        posted_at: r.get::<DateTime<Utc>, _>(2),
        author: UserSummary {
            user_id: UserId(r.get::<i64, _>(3)),
            name: r.get::<String, _>(4),
            profile_pic: r.get::<String, _>(5),
        },
        group: r
            .get::<Option<i64>, _>(6)
            .map(|group_id| GroupSummary {
                group_id: GroupId(group_id),
                name: r.get::<Option<String>, _>(7).unwrap_or_default(),
            }),
    }
}

fn comment_from_row(r: &SqliteRow) -> StoredComment {
    StoredComment {
        comment_id: CommentId(r.get::<i64, _>(0)),
        post_id: PostId(r.get::<i64, _>(1)),
        parent_comment: r.get::<Option<i64>, _>(2).map(CommentId),
        content: r.get::<String, _>(3),
        commented_at: r.get::<DateTime<Utc>, _>(4),
        author: UserSummary {
            user_id: UserId(r.get::<i64, _>(5)),
            name: r.get::<String, _>(6),
            profile_pic: r.get::<String, _>(7),
        },
    }
}

fn reaction_type_from_row(raw: &str) -> Result<ReactionType> {
    raw.parse::<ReactionType>()
        .with_context(|| format!("corrupt reaction_type '{raw}' in store"))
}

fn target_column(target: ReactionTarget) -> (&'static str, i64) {
    match target {
        ReactionTarget::Post(post_id) => ("post_id", post_id.0),
        ReactionTarget::Comment(comment_id) => ("comment_id", comment_id.0),
    }
}

impl Storage {
    pub async fn create_user(&self, name: &str, profile_pic: &str) -> Result<UserId> {
        let rec = sqlx::query("INSERT INTO users (name, profile_pic) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(profile_pic)
            .fetch_one(&self.pool)
            .await?;
        Ok(UserId(rec.get::<i64, _>(0)))
    }

    pub async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// The subset of `user_ids` that exist, resolved with a single query.
    pub async fn existing_user_ids(&self, user_ids: &[UserId]) -> Result<HashSet<UserId>> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM users WHERE id IN ");
        push_in_list(&mut builder, user_ids.iter().map(|id| id.0));
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| UserId(r.get::<i64, _>(0)))
            .collect())
    }

    pub async fn insert_post(
        &self,
        user_id: UserId,
        content: &str,
        group_id: Option<GroupId>,
        posted_at: DateTime<Utc>,
    ) -> Result<PostId> {
        let rec = sqlx::query(
            "INSERT INTO posts (content, posted_at, posted_by, group_id) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(content)
        .bind(posted_at)
        .bind(user_id.0)
        .bind(group_id.map(|id| id.0))
        .fetch_one(&self.pool)
        .await?;
        Ok(PostId(rec.get::<i64, _>(0)))
    }

    pub async fn load_post(&self, post_id: PostId) -> Result<Option<StoredPost>> {
        let sql = format!("{POST_SELECT} WHERE p.id = ?");
        let row = sqlx::query(&sql)
            .bind(post_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn posts_by_user(&self, user_id: UserId) -> Result<Vec<StoredPost>> {
        let sql = format!("{POST_SELECT} WHERE p.posted_by = ? ORDER BY p.posted_at DESC, p.id DESC");
        let rows = sqlx::query(&sql)
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    /// One page of a group's posts, newest first.
    pub async fn posts_in_group(
        &self,
        group_id: GroupId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<StoredPost>> {
        let sql = format!(
            "{POST_SELECT} WHERE p.group_id = ? ORDER BY p.posted_at DESC, p.id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(group_id.0)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn delete_post(&self, post_id: PostId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    pub async fn insert_comment(
        &self,
        user_id: UserId,
        post_id: PostId,
        content: &str,
        parent_comment: Option<CommentId>,
        commented_at: DateTime<Utc>,
    ) -> Result<CommentId> {
        let rec = sqlx::query(
            "INSERT INTO comments (content, commented_at, commented_by, post_id, parent_comment)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(content)
        .bind(commented_at)
        .bind(user_id.0)
        .bind(post_id.0)
        .bind(parent_comment.map(|id| id.0))
        .fetch_one(&self.pool)
        .await?;
        Ok(CommentId(rec.get::<i64, _>(0)))
    }

    pub async fn load_comment(&self, comment_id: CommentId) -> Result<Option<StoredComment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = ?");
        let row = sqlx::query(&sql)
            .bind(comment_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(comment_from_row))
    }

    /// Every comment and reply on the given posts, oldest first.
    pub async fn comments_for_posts(&self, post_ids: &[PostId]) -> Result<Vec<StoredComment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(COMMENT_SELECT);
        builder.push(" WHERE c.post_id IN ");
        push_in_list(&mut builder, post_ids.iter().map(|id| id.0));
        builder.push(" ORDER BY c.commented_at ASC, c.id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn replies_for_comment(&self, comment_id: CommentId) -> Result<Vec<StoredComment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.parent_comment = ? ORDER BY c.commented_at ASC, c.id ASC");
        let rows = sqlx::query(&sql)
            .bind(comment_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    /// Applies toggle semantics for one (user, target) pair inside a single
    /// write transaction: same type removes, different type overwrites, none inserts.
    pub async fn toggle_reaction(
        &self,
        user_id: UserId,
        target: ReactionTarget,
        reaction_type: ReactionType,
        reacted_at: DateTime<Utc>,
    ) -> Result<ReactionOutcome> {
        let (column, target_id) = target_column(target);
        let mut tx = self.pool.begin().await?;

        // Opening with a write takes the database write lock before anything is read.
        let delete_sql = format!(
            "DELETE FROM reactions WHERE reacted_by = ? AND {column} = ? AND reaction_type = ?"
        );
        let removed = sqlx::query(&delete_sql)
            .bind(user_id.0)
            .bind(target_id)
            .bind(reaction_type.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let outcome = if removed > 0 {
            ReactionOutcome::Removed
        } else {
            let update_sql = format!(
                "UPDATE reactions SET reaction_type = ?, reacted_at = ? WHERE reacted_by = ? AND {column} = ?"
            );
            let updated = sqlx::query(&update_sql)
                .bind(reaction_type.as_str())
                .bind(reacted_at)
                .bind(user_id.0)
                .bind(target_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if updated > 0 {
                ReactionOutcome::Updated
            } else {
                let insert_sql = format!(
                    "INSERT INTO reactions (reaction_type, {column}, reacted_at, reacted_by) VALUES (?, ?, ?, ?)"
                );
                sqlx::query(&insert_sql)
                    .bind(reaction_type.as_str())
                    .bind(target_id)
                    .bind(reacted_at)
                    .bind(user_id.0)
                    .execute(&mut *tx)
                    .await?;
                ReactionOutcome::Created
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn reaction_for(
        &self,
        user_id: UserId,
        target: ReactionTarget,
    ) -> Result<Option<ReactionType>> {
        let (column, target_id) = target_column(target);
        let sql = format!("SELECT reaction_type FROM reactions WHERE reacted_by = ? AND {column} = ?");
        let row = sqlx::query(&sql)
            .bind(user_id.0)
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| reaction_type_from_row(&r.get::<String, _>(0)))
            .transpose()
    }

    pub async fn count_reactions_on(&self, target: ReactionTarget) -> Result<i64> {
        let (column, target_id) = target_column(target);
        let sql = format!("SELECT COUNT(*) FROM reactions WHERE {column} = ?");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn total_reaction_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn reaction_metrics(&self, post_id: PostId) -> Result<Vec<(ReactionType, i64)>> {
        let rows = sqlx::query(
            "SELECT reaction_type, COUNT(*) FROM reactions
             WHERE post_id = ?
             GROUP BY reaction_type
             ORDER BY reaction_type ASC",
        )
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| -> Result<(ReactionType, i64)> {
                Ok((reaction_type_from_row(&r.get::<String, _>(0))?, r.get::<i64, _>(1)))
            })
            .collect()
    }

    /// `(post, reaction)` pairs for the given posts in reaction order.
    pub async fn reactions_for_posts(
        &self,
        post_ids: &[PostId],
    ) -> Result<Vec<(PostId, ReactionType)>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT post_id, reaction_type FROM reactions WHERE post_id IN ");
        push_in_list(&mut builder, post_ids.iter().map(|id| id.0));
        builder.push(" ORDER BY id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| -> Result<(PostId, ReactionType)> {
                Ok((
                    PostId(r.get::<i64, _>(0)),
                    reaction_type_from_row(&r.get::<String, _>(1))?,
                ))
            })
            .collect()
    }

    pub async fn reactions_for_comments(
        &self,
        comment_ids: &[CommentId],
    ) -> Result<Vec<(CommentId, ReactionType)>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT comment_id, reaction_type FROM reactions WHERE comment_id IN ",
        );
        push_in_list(&mut builder, comment_ids.iter().map(|id| id.0));
        builder.push(" ORDER BY id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| -> Result<(CommentId, ReactionType)> {
                Ok((
                    CommentId(r.get::<i64, _>(0)),
                    reaction_type_from_row(&r.get::<String, _>(1))?,
                ))
            })
            .collect()
    }

    pub async fn post_reaction_details(&self, post_id: PostId) -> Result<Vec<ReactionDetail>> {
        let rows = sqlx::query(
            "SELECT u.id, u.name, u.profile_pic, r.reaction_type
             FROM reactions r
             INNER JOIN users u ON u.id = r.reacted_by
             WHERE r.post_id = ?
             ORDER BY r.id ASC",
        )
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| -> Result<ReactionDetail> {
                Ok(ReactionDetail {
                    user_id: UserId(r.get::<i64, _>(0)),
                    name: r.get::<String, _>(1),
                    profile_pic: r.get::<String, _>(2),
                    reaction: reaction_type_from_row(&r.get::<String, _>(3))?,
                })
            })
            .collect()
    }

    pub async fn posts_with_more_positive_reactions(&self) -> Result<Vec<PostId>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT p.id FROM posts p
             LEFT JOIN reactions r ON r.post_id = p.id
             GROUP BY p.id
             HAVING SUM(CASE WHEN r.reaction_type IN ",
        );
        push_in_list(&mut builder, ReactionType::positive().map(ReactionType::as_str));
        builder.push(" THEN 1 ELSE 0 END) > SUM(CASE WHEN r.reaction_type IN ");
        push_in_list(&mut builder, ReactionType::negative().map(ReactionType::as_str));
        builder.push(" THEN 1 ELSE 0 END) ORDER BY p.id ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| PostId(r.get::<i64, _>(0)))
            .collect())
    }

    pub async fn posts_reacted_by_user(&self, user_id: UserId) -> Result<Vec<PostId>> {
        let rows = sqlx::query(
            "SELECT post_id FROM reactions
             WHERE reacted_by = ? AND post_id IS NOT NULL
             ORDER BY id ASC",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| PostId(r.get::<i64, _>(0)))
            .collect())
    }

    pub async fn posts_with_more_comments_than_reactions(&self) -> Result<Vec<PostId>> {
        let rows = sqlx::query(
            "SELECT p.id FROM posts p
             WHERE (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
                 > (SELECT COUNT(*) FROM reactions r WHERE r.post_id = p.id)
             ORDER BY p.id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| PostId(r.get::<i64, _>(0)))
            .collect())
    }

    /// Creates the group and all memberships atomically. `creator` is the only admin.
    pub async fn create_group_with_members(
        &self,
        name: &str,
        creator: UserId,
        members: &[UserId],
    ) -> Result<GroupId> {
        let mut tx = self.pool.begin().await?;
        let rec = sqlx::query("INSERT INTO feed_groups (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;
        let group_id = GroupId(rec.get::<i64, _>(0));

        sqlx::query("INSERT INTO memberships (group_id, member_id, is_admin) VALUES (?, ?, 1)")
            .bind(group_id.0)
            .bind(creator.0)
            .execute(&mut *tx)
            .await?;

        let others: Vec<UserId> = members.iter().copied().filter(|id| *id != creator).collect();
        for chunk in others.chunks(crate::INSERT_CHUNK) {
            let mut builder =
                QueryBuilder::<Sqlite>::new("INSERT INTO memberships (group_id, member_id, is_admin) ");
            builder.push_values(chunk, |mut b, member| {
                b.push_bind(group_id.0).push_bind(member.0).push_bind(false);
            });
            builder.push(" ON CONFLICT(group_id, member_id) DO NOTHING");
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(group_id)
    }

    pub async fn load_group(&self, group_id: GroupId) -> Result<Option<GroupSummary>> {
        let row = sqlx::query("SELECT id, name FROM feed_groups WHERE id = ?")
            .bind(group_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| GroupSummary {
            group_id: GroupId(r.get::<i64, _>(0)),
            name: r.get::<String, _>(1),
        }))
    }

    /// `Some(is_admin)` when the user belongs to the group.
    pub async fn membership_status(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<bool>> {
        let row = sqlx::query("SELECT is_admin FROM memberships WHERE group_id = ? AND member_id = ?")
            .bind(group_id.0)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<bool, _>(0)))
    }

    /// Returns false when the user was already a member.
    pub async fn add_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
        is_admin: bool,
    ) -> Result<bool> {
        let inserted = sqlx::query(
            "INSERT INTO memberships (group_id, member_id, is_admin) VALUES (?, ?, ?)
             ON CONFLICT(group_id, member_id) DO NOTHING",
        )
        .bind(group_id.0)
        .bind(user_id.0)
        .bind(is_admin)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(inserted > 0)
    }

    pub async fn remove_membership(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM memberships WHERE group_id = ? AND member_id = ?")
            .bind(group_id.0)
            .bind(user_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    /// Returns false when the member was already an admin.
    pub async fn promote_to_admin(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE memberships SET is_admin = 1 WHERE group_id = ? AND member_id = ? AND is_admin = 0",
        )
        .bind(group_id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated > 0)
    }

    /// `(member, is_admin)` for every member, ordered by user id.
    pub async fn list_group_members(&self, group_id: GroupId) -> Result<Vec<(UserId, bool)>> {
        let rows = sqlx::query(
            "SELECT member_id, is_admin FROM memberships WHERE group_id = ? ORDER BY member_id ASC",
        )
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| (UserId(r.get::<i64, _>(0)), r.get::<bool, _>(1)))
            .collect())
    }

    /// Members of the group who have never posted in it.
    pub async fn silent_group_members(&self, group_id: GroupId) -> Result<Vec<UserId>> {
        let rows = sqlx::query(
            "SELECT m.member_id FROM memberships m
             WHERE m.group_id = ?1
               AND NOT EXISTS (
                   SELECT 1 FROM posts p WHERE p.group_id = ?1 AND p.posted_by = m.member_id
               )
             ORDER BY m.member_id ASC",
        )
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| UserId(r.get::<i64, _>(0)))
            .collect())
    }
}
