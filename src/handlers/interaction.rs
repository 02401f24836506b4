use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;

use crate::{
    error::AppError,
    middleware::AuthUser,
    models::{comment::CreateCommentRequest, upvote::ToggleOutcome},
    services::{comment::CommentService, upvote::UpvoteService},
};

/// Toggle the current user's upvote on a post.
pub async fn toggle_upvote(
    State(upvotes): State<UpvoteService>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = upvotes.toggle(post_id, user.id).await?;
    let count = upvotes.count(post_id).await?;

    let label = match outcome {
        ToggleOutcome::Added(_) => "added",
        ToggleOutcome::Removed(_) => "removed",
    };

    Ok(Json(json!({
        "outcome": label,
        "upvote": outcome.upvote(),
        "upvotes": count,
    })))
}

/// Create a new comment.
pub async fn create_comment(
    State(comments): State<CommentService>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCommentRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments.create(post_id, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Delete a comment. Requires: Login + Author.
pub async fn delete_comment(
    State(comments): State<CommentService>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    comments.delete(comment_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
