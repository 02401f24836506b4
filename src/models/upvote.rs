use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'upvotes' table: one row per (post, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Upvote {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
}

/// Result of a toggle: the row that was created or the row that was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added(Upvote),
    Removed(Upvote),
}

impl ToggleOutcome {
    pub fn upvote(&self) -> &Upvote {
        match self {
            ToggleOutcome::Added(upvote) | ToggleOutcome::Removed(upvote) => upvote,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, ToggleOutcome::Added(_))
    }
}
