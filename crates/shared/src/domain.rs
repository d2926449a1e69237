use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, FeedError};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

macro_rules! key_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(PostId);
id_newtype!(CommentId);
id_newtype!(GroupId);
id_newtype!(DirectorId);

key_newtype!(ActorId);
key_newtype!(MovieId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionType {
    Wow,
    Lit,
    Love,
    Haha,
    ThumbsUp,
    ThumbsDown,
    Angry,
    Sad,
}

impl ReactionType {
    pub const ALL: [ReactionType; 8] = [
        ReactionType::Wow,
        ReactionType::Lit,
        ReactionType::Love,
        ReactionType::Haha,
        ReactionType::ThumbsUp,
        ReactionType::ThumbsDown,
        ReactionType::Angry,
        ReactionType::Sad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionType::Wow => "WOW",
            ReactionType::Lit => "LIT",
            ReactionType::Love => "LOVE",
            ReactionType::Haha => "HAHA",
            ReactionType::ThumbsUp => "THUMBS_UP",
            ReactionType::ThumbsDown => "THUMBS_DOWN",
            ReactionType::Angry => "ANGRY",
            ReactionType::Sad => "SAD",
        }
    }

    pub fn is_positive(self) -> bool {
        match self {
            ReactionType::ThumbsUp
            | ReactionType::Lit
            | ReactionType::Love
            | ReactionType::Haha
            | ReactionType::Wow => true,
            ReactionType::ThumbsDown | ReactionType::Sad | ReactionType::Angry => false,
        }
    }

    pub fn positive() -> impl Iterator<Item = ReactionType> {
        Self::ALL.into_iter().filter(|kind| kind.is_positive())
    }

    pub fn negative() -> impl Iterator<Item = ReactionType> {
        Self::ALL.into_iter().filter(|kind| !kind.is_positive())
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionType {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| FeedError::InvalidReactionType(s.to_string()))
    }
}

/// What a reaction is attached to. A reaction belongs to exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReactionTarget {
    Post(PostId),
    Comment(CommentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionOutcome {
    Created,
    Updated,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl FromStr for Gender {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            _ => Err(CatalogError::InvalidGender(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reaction_labels_case_insensitively() {
        assert_eq!("thumbs_up".parse::<ReactionType>().unwrap(), ReactionType::ThumbsUp);
        assert_eq!("thumbs-down".parse::<ReactionType>().unwrap(), ReactionType::ThumbsDown);
        assert_eq!("WOW".parse::<ReactionType>().unwrap(), ReactionType::Wow);
    }

    #[test]
    fn rejects_unknown_reaction_label() {
        let err = "MEH".parse::<ReactionType>().expect_err("should fail");
        assert!(matches!(err, FeedError::InvalidReactionType(label) if label == "MEH"));
    }

    #[test]
    fn splits_reactions_into_positive_and_negative() {
        assert_eq!(ReactionType::positive().count(), 5);
        assert_eq!(
            ReactionType::negative().collect::<Vec<_>>(),
            vec![ReactionType::ThumbsDown, ReactionType::Angry, ReactionType::Sad]
        );
    }

    #[test]
    fn reaction_type_serializes_as_label() {
        let json = serde_json::to_string(&ReactionType::ThumbsUp).expect("json");
        assert_eq!(json, "\"THUMBS_UP\"");
    }
}
