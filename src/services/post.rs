use std::sync::Arc;

use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    cache::{ListingCache, ROADMAP_KEY},
    error::AppError,
    models::{
        comment::CommentResponse,
        post::{
            CreatePostRequest, Post, PostDetail, PostListParams, PostStatus, PostSummary, Roadmap,
            UnknownStatus, UpdatePostRequest,
        },
        user::User,
    },
    utils::html::clean_html,
};

/// Columns of a `PostSummary`. `?1` is the viewer's id (NULL when anonymous).
const SUMMARY_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.category, p.detail, p.status, p.user_id,
        u.username AS author_username,
        p.created_at,
        (SELECT COUNT(*) FROM upvotes v WHERE v.post_id = p.id) AS upvotes,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments,
        EXISTS (
            SELECT 1 FROM upvotes v WHERE v.post_id = p.id AND v.user_id = ?1
        ) AS upvoted_by_viewer
    FROM posts p
    JOIN users u ON u.id = p.user_id
"#;

const POST_COLUMNS: &str = "id, title, category, detail, status, user_id, created_at, updated_at";

/// Feedback posts: listing, detail, authoring and the roadmap.
#[derive(Clone)]
pub struct PostService {
    pool: SqlitePool,
    cache: Option<Arc<dyn ListingCache>>,
}

impl PostService {
    pub fn new(pool: SqlitePool, cache: Option<Arc<dyn ListingCache>>) -> Self {
        Self { pool, cache }
    }

    /// Lists posts with optional category filter, sort order and "only my
    /// upvotes" restriction.
    ///
    /// Without an explicit sort a category listing is newest first; every other
    /// listing defaults to most upvotes.
    pub async fn list(
        &self,
        params: &PostListParams,
        viewer: Option<&User>,
    ) -> Result<Vec<PostSummary>, AppError> {
        let sort_by = params
            .sort_by()
            .map_err(|msg| AppError::field("sortBy", &msg))?;
        let category = params.category();

        let only_upvoted = params.only_user_upvotes();
        if only_upvoted && viewer.is_none() {
            return Err(AppError::Unauthorized(
                "You must be logged in to view your upvotes.".to_string(),
            ));
        }

        let order = match (sort_by, category) {
            (None, Some(_)) => "p.created_at DESC, p.id DESC",
            (sort_by, _) => sort_by.unwrap_or_default().order_clause(),
        };

        let sql = format!(
            r#"{SUMMARY_SELECT}
            WHERE (?2 IS NULL OR p.category = ?2)
              AND (?3 = 0 OR EXISTS (
                  SELECT 1 FROM upvotes v WHERE v.post_id = p.id AND v.user_id = ?1
              ))
            ORDER BY {order}"#
        );

        let posts = sqlx::query_as::<_, PostSummary>(&sql)
            .bind(viewer.map(|u| u.id))
            .bind(category)
            .bind(only_upvoted)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list posts: {:?}", e);
                AppError::from(e)
            })?;

        Ok(posts)
    }

    /// One post with its comments, newest comment first.
    pub async fn get(&self, post_id: i64, viewer: Option<&User>) -> Result<PostDetail, AppError> {
        let sql = format!("{SUMMARY_SELECT} WHERE p.id = ?2");
        let post = sqlx::query_as::<_, PostSummary>(&sql)
            .bind(viewer.map(|u| u.id))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Post not found".to_string()))?;

        let comment_list = sqlx::query_as::<_, CommentResponse>(
            r#"
            SELECT
                c.id, c.post_id, c.user_id, u.username, u.fullname,
                c.content, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = ?
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PostDetail { post, comment_list })
    }

    /// New posts always start as suggestions.
    pub async fn create(&self, user_id: i64, payload: CreatePostRequest) -> Result<Post, AppError> {
        payload.validate()?;

        let now = chrono::Utc::now();
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (title, category, detail, status, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(payload.title.trim())
        .bind(payload.category.trim())
        .bind(clean_html(&payload.detail))
        .bind(PostStatus::Suggestion.as_str())
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {:?}", e);
            AppError::from(e)
        })?;

        self.invalidate_roadmap().await;
        tracing::info!(post_id = post.id, user_id, "Post created");
        Ok(post)
    }

    /// Edits a post. Only its author may do so.
    pub async fn update(
        &self,
        post_id: i64,
        user_id: i64,
        payload: UpdatePostRequest,
    ) -> Result<Post, AppError> {
        payload.validate()?;
        let status: PostStatus = payload
            .status
            .parse()
            .map_err(|e: UnknownStatus| AppError::field("status", &e.to_string()))?;

        self.ensure_owner(post_id, user_id, "edit").await?;

        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = ?, category = ?, detail = ?, status = ?, updated_at = ?
            WHERE id = ?
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(payload.title.trim())
        .bind(payload.category.trim())
        .bind(clean_html(&payload.detail))
        .bind(status.as_str())
        .bind(chrono::Utc::now())
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

        self.invalidate_roadmap().await;
        tracing::info!(post_id, user_id, status = %status, "Post updated");
        Ok(post)
    }

    /// Deletes a post together with its comments and upvotes. Author only.
    pub async fn delete(&self, post_id: i64, user_id: i64) -> Result<(), AppError> {
        self.ensure_owner(post_id, user_id, "delete").await?;

        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete post: {:?}", e);
                AppError::from(e)
            })?;

        self.invalidate_roadmap().await;
        tracing::info!(post_id, user_id, "Post deleted");
        Ok(())
    }

    /// Posts past the suggestion stage, grouped by status.
    ///
    /// Read-through: a fresh cached copy is served as is, otherwise the store
    /// is queried and the result cached. A cached value that no longer
    /// deserializes counts as a miss.
    pub async fn roadmap(&self) -> Result<Roadmap, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(ROADMAP_KEY).await {
                match serde_json::from_str::<Roadmap>(&cached) {
                    Ok(roadmap) => return Ok(roadmap),
                    Err(e) => tracing::warn!("Discarding unreadable cached roadmap: {}", e),
                }
            }
        }

        let sql = format!(
            "{SUMMARY_SELECT} WHERE p.status != ?2 ORDER BY upvotes DESC, p.id DESC"
        );
        let posts = sqlx::query_as::<_, PostSummary>(&sql)
            .bind(None::<i64>)
            .bind(PostStatus::Suggestion.as_str())
            .fetch_all(&self.pool)
            .await?;

        let roadmap = Roadmap::from_posts(posts);

        if let Some(cache) = &self.cache {
            cache.set(ROADMAP_KEY, serde_json::to_string(&roadmap)?).await;
        }

        Ok(roadmap)
    }

    async fn ensure_owner(&self, post_id: i64, user_id: i64, action: &str) -> Result<(), AppError> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Post not found".to_string()))?;

        if owner != user_id {
            tracing::warn!(post_id, user_id, "Rejected {} by non-owner", action);
            return Err(AppError::Forbidden(format!(
                "You are not allowed to {action} this post"
            )));
        }
        Ok(())
    }

    async fn invalidate_roadmap(&self) {
        if let Some(cache) = &self.cache {
            cache.remove(ROADMAP_KEY).await;
        }
    }
}
