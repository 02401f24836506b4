use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::{
    cache::{ListingCache, ROADMAP_KEY},
    error::{AppError, is_unique_violation},
    models::upvote::{ToggleOutcome, Upvote},
};

const MAX_ADD_ATTEMPTS: u32 = 8;

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl From<ToggleError> for AppError {
    fn from(err: ToggleError) -> Self {
        match err {
            ToggleError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            ToggleError::Store(e) => AppError::from(e),
        }
    }
}

/// Like/unlike for posts.
#[derive(Clone)]
pub struct UpvoteService {
    pool: SqlitePool,
    cache: Option<Arc<dyn ListingCache>>,
}

impl UpvoteService {
    pub fn new(pool: SqlitePool, cache: Option<Arc<dyn ListingCache>>) -> Self {
        Self { pool, cache }
    }

    /// Adds the user's upvote to the post if absent, removes it if present.
    ///
    /// Two identical toggles racing past the lookup are settled by the
    /// UNIQUE(post_id, user_id) constraint: the losing insert reports the
    /// winner's row as `Added` (inserting again if that row is already gone),
    /// and a delete that finds nothing left still reports `Removed`.
    pub async fn toggle(&self, post_id: i64, user_id: i64) -> Result<ToggleOutcome, ToggleError> {
        if !self.exists("SELECT 1 FROM users WHERE id = ?", user_id).await? {
            return Err(ToggleError::NotFound("User"));
        }
        if !self.exists("SELECT 1 FROM posts WHERE id = ?", post_id).await? {
            return Err(ToggleError::NotFound("Post"));
        }

        let outcome = match self.find(post_id, user_id).await? {
            None => self.add(post_id, user_id).await?,
            Some(upvote) => {
                let deleted = sqlx::query("DELETE FROM upvotes WHERE id = ?")
                    .bind(upvote.id)
                    .execute(&self.pool)
                    .await?
                    .rows_affected();
                if deleted == 0 {
                    tracing::debug!(post_id, user_id, "Upvote already removed by a concurrent toggle");
                }
                ToggleOutcome::Removed(upvote)
            }
        };

        if let Some(cache) = &self.cache {
            cache.remove(ROADMAP_KEY).await;
        }

        tracing::info!(post_id, user_id, added = outcome.is_added(), "Upvote toggled");
        Ok(outcome)
    }

    /// Number of upvotes on a post, always counted from the rows themselves.
    pub async fn count(&self, post_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM upvotes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn add(&self, post_id: i64, user_id: i64) -> Result<ToggleOutcome, ToggleError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let inserted = sqlx::query_as::<_, Upvote>(
                "INSERT INTO upvotes (post_id, user_id) VALUES (?, ?) RETURNING id, post_id, user_id",
            )
            .bind(post_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(upvote) => return Ok(ToggleOutcome::Added(upvote)),
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(post_id, user_id, "Upvote already added by a concurrent toggle");
                    if let Some(existing) = self.find(post_id, user_id).await? {
                        return Ok(ToggleOutcome::Added(existing));
                    }
                    // Removed again before the re-read; every retry means
                    // another toggle finished in between.
                    if attempts >= MAX_ADD_ATTEMPTS {
                        return Err(e.into());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn find(&self, post_id: i64, user_id: i64) -> Result<Option<Upvote>, sqlx::Error> {
        sqlx::query_as::<_, Upvote>(
            "SELECT id, post_id, user_id FROM upvotes WHERE post_id = ? AND user_id = ?",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn exists(&self, sql: &'static str, id: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }
}
