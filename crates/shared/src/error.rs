use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub kind: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Failures of the social-feed operations, one variant per violated precondition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("user {0} does not exist")]
    InvalidUser(i64),
    #[error("post {0} does not exist")]
    InvalidPost(i64),
    #[error("comment {0} does not exist")]
    InvalidComment(i64),
    #[error("group {0} does not exist")]
    InvalidGroup(i64),
    #[error("member {0} does not exist")]
    InvalidMember(i64),
    #[error("post content must not be empty")]
    InvalidPostContent,
    #[error("comment content must not be empty")]
    InvalidCommentContent,
    #[error("reply content must not be empty")]
    InvalidReplyContent,
    #[error("unknown reaction type '{0}'")]
    InvalidReactionType(String),
    #[error("group name must not be empty")]
    InvalidGroupName,
    #[error("offset must not be negative, got {0}")]
    InvalidOffset(i64),
    #[error("limit must be positive, got {0}")]
    InvalidLimit(i64),
    #[error("user {user_id} cannot delete post {post_id}")]
    UserCannotDeletePost { user_id: i64, post_id: i64 },
    #[error("user {user_id} is not a member of group {group_id}")]
    UserNotInGroup { user_id: i64, group_id: i64 },
    #[error("user {user_id} is not an admin of group {group_id}")]
    UserNotAdmin { user_id: i64, group_id: i64 },
    #[error("internal error: {0}")]
    Internal(String),
}

impl FeedError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FeedError::InvalidUser(_)
            | FeedError::InvalidPost(_)
            | FeedError::InvalidComment(_)
            | FeedError::InvalidGroup(_)
            | FeedError::InvalidMember(_) => ErrorCode::NotFound,
            FeedError::InvalidPostContent
            | FeedError::InvalidCommentContent
            | FeedError::InvalidReplyContent
            | FeedError::InvalidReactionType(_)
            | FeedError::InvalidGroupName
            | FeedError::InvalidOffset(_)
            | FeedError::InvalidLimit(_) => ErrorCode::Validation,
            FeedError::UserCannotDeletePost { .. }
            | FeedError::UserNotInGroup { .. }
            | FeedError::UserNotAdmin { .. } => ErrorCode::Forbidden,
            FeedError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::InvalidUser(_) => "invalid_user",
            FeedError::InvalidPost(_) => "invalid_post",
            FeedError::InvalidComment(_) => "invalid_comment",
            FeedError::InvalidGroup(_) => "invalid_group",
            FeedError::InvalidMember(_) => "invalid_member",
            FeedError::InvalidPostContent => "invalid_post_content",
            FeedError::InvalidCommentContent => "invalid_comment_content",
            FeedError::InvalidReplyContent => "invalid_reply_content",
            FeedError::InvalidReactionType(_) => "invalid_reaction_type",
            FeedError::InvalidGroupName => "invalid_group_name",
            FeedError::InvalidOffset(_) => "invalid_offset",
            FeedError::InvalidLimit(_) => "invalid_limit",
            FeedError::UserCannotDeletePost { .. } => "user_cannot_delete_post",
            FeedError::UserNotInGroup { .. } => "user_not_in_group",
            FeedError::UserNotAdmin { .. } => "user_not_admin",
            FeedError::Internal(_) => "internal",
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(value: FeedError) -> Self {
        ApiError::new(value.code(), value.kind(), value.to_string())
    }
}

/// Failures of the movie catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("actor '{0}' does not exist")]
    UnknownActor(String),
    #[error("movie '{0}' does not exist")]
    UnknownMovie(String),
    #[error("director '{0}' does not exist")]
    UnknownDirector(String),
    #[error("release date '{0}' is not a YYYY-MM-DD date")]
    InvalidReleaseDate(String),
    #[error("box office collection '{0}' is not a non-negative number")]
    InvalidBoxOfficeCollection(String),
    #[error("rating counts for movie '{0}' must not be negative")]
    InvalidRatingCount(String),
    #[error("unknown gender '{0}'")]
    InvalidGender(String),
    #[error("year {0} is out of range")]
    InvalidYear(i32),
    #[error("month {0} is out of range")]
    InvalidMonth(u32),
    #[error("duplicate record: {0}")]
    DuplicateRecord(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CatalogError::UnknownActor(_)
            | CatalogError::UnknownMovie(_)
            | CatalogError::UnknownDirector(_) => ErrorCode::NotFound,
            CatalogError::Internal(_) => ErrorCode::Internal,
            _ => ErrorCode::Validation,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::UnknownActor(_) => "unknown_actor",
            CatalogError::UnknownMovie(_) => "unknown_movie",
            CatalogError::UnknownDirector(_) => "unknown_director",
            CatalogError::InvalidReleaseDate(_) => "invalid_release_date",
            CatalogError::InvalidBoxOfficeCollection(_) => "invalid_box_office_collection",
            CatalogError::InvalidRatingCount(_) => "invalid_rating_count",
            CatalogError::InvalidGender(_) => "invalid_gender",
            CatalogError::InvalidYear(_) => "invalid_year",
            CatalogError::InvalidMonth(_) => "invalid_month",
            CatalogError::DuplicateRecord(_) => "duplicate_record",
            CatalogError::Internal(_) => "internal",
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        ApiError::new(value.code(), value.kind(), value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_errors_map_to_wire_codes() {
        let err: ApiError = FeedError::UserNotAdmin {
            user_id: 1,
            group_id: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.kind, "user_not_admin");
        assert_eq!(err.message, "user 1 is not an admin of group 2");
    }

    #[test]
    fn catalog_lookup_failures_are_not_found() {
        let err: ApiError = CatalogError::UnknownMovie("movie_9".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.kind, "unknown_movie");
    }
}
