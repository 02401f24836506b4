use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::AppError,
    middleware::{AuthUser, CurrentUser},
    models::post::{CreatePostRequest, PostListParams, UpdatePostRequest},
    services::post::PostService,
};

/// List posts, filtered by category and sorted by upvotes or comments.
/// `userUpvotes=true` needs a session.
pub async fn list_posts(
    State(posts): State<PostService>,
    CurrentUser(viewer): CurrentUser,
    WithRejection(Query(params), _): WithRejection<Query<PostListParams>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let list = posts.list(&params, viewer.as_ref()).await?;
    Ok(Json(list))
}

/// Get a single post with its comments.
pub async fn get_post(
    State(posts): State<PostService>,
    CurrentUser(viewer): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.get(id, viewer.as_ref()).await?;
    Ok(Json(post))
}

/// Create a new post.
pub async fn create_post(
    State(posts): State<PostService>,
    AuthUser(user): AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePostRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Edit a post. Requires: Login + Author.
pub async fn update_post(
    State(posts): State<PostService>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdatePostRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.update(id, user.id, payload).await?;
    Ok(Json(post))
}

/// Delete a post. Requires: Login + Author.
pub async fn delete_post(
    State(posts): State<PostService>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    posts.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Planned, in-progress and live posts.
pub async fn roadmap(State(posts): State<PostService>) -> Result<impl IntoResponse, AppError> {
    let roadmap = posts.roadmap().await?;
    Ok(Json(roadmap))
}
