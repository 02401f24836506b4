use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::trimmed_len;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(custom(function = validate_content))]
    pub content: String,
}

fn validate_content(content: &str) -> Result<(), ValidationError> {
    let len = trimmed_len(content);
    if len == 0 {
        return Err(ValidationError::new("content").with_message("Comment is required".into()));
    }
    if len > 1000 {
        return Err(ValidationError::new("content")
            .with_message("Comment must be at most 1000 characters".into()));
    }
    Ok(())
}

/// DTO for displaying a comment with author info.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub fullname: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
