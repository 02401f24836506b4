use std::sync::Arc;

use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    cache::{ListingCache, ROADMAP_KEY},
    error::AppError,
    models::comment::{Comment, CreateCommentRequest},
    utils::html::clean_html,
};

#[derive(Clone)]
pub struct CommentService {
    pool: SqlitePool,
    cache: Option<Arc<dyn ListingCache>>,
}

impl CommentService {
    pub fn new(pool: SqlitePool, cache: Option<Arc<dyn ListingCache>>) -> Self {
        Self { pool, cache }
    }

    pub async fn create(
        &self,
        post_id: i64,
        user_id: i64,
        payload: CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        payload.validate()?;

        let post = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        if post.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, user_id, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, post_id, user_id, content, created_at
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(clean_html(&payload.content))
        .bind(chrono::Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {:?}", e);
            AppError::from(e)
        })?;

        self.invalidate_roadmap().await;
        Ok(comment)
    }

    /// Removes a comment. Only its author may do so.
    pub async fn delete(&self, comment_id: i64, user_id: i64) -> Result<(), AppError> {
        let author = sqlx::query_scalar::<_, i64>("SELECT user_id FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))?;

        if author != user_id {
            return Err(AppError::Forbidden(
                "You are not allowed to delete this comment".to_string(),
            ));
        }

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        self.invalidate_roadmap().await;
        Ok(())
    }

    // Roadmap entries carry comment counts.
    async fn invalidate_roadmap(&self) {
        if let Some(cache) = &self.cache {
            cache.remove(ROADMAP_KEY).await;
        }
    }
}
