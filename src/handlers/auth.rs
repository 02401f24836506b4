// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use serde::Deserialize;

use crate::{
    error::AppError,
    middleware::AuthUser,
    models::user::{LoginRequest, RegisterRequest, UserField, UserProfile},
    services::auth::AuthService,
};

/// Registers a new user and logs them in.
///
/// Returns 201 Created with the profile and the session cookie.
pub async fn register(
    State(auth): State<AuthService>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = auth.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(auth.session_cookie(token)),
        Json(UserProfile::select(&user, &[UserField::Email])),
    ))
}

/// Authenticates a user and sets the session cookie.
///
/// Unknown usernames and wrong passwords get the same 401.
pub async fn login(
    State(auth): State<AuthService>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = auth.login(payload).await?;

    Ok((
        jar.add(auth.session_cookie(token)),
        Json(UserProfile::from(&user)),
    ))
}

/// Clears the session cookie and sends the browser to the auth page.
pub async fn logout(State(auth): State<AuthService>, jar: CookieJar) -> impl IntoResponse {
    (jar.add(auth.logout()), Redirect::to("/auth"))
}

#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    /// Comma-separated optional fields, e.g. `email,created_at`.
    pub fields: Option<String>,
}

/// Get the current user's profile.
pub async fn me(
    State(auth): State<AuthService>,
    AuthUser(user): AuthUser,
    WithRejection(Query(params), _): WithRejection<Query<ProfileParams>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let fields = UserField::parse_list(params.fields.as_deref().unwrap_or_default())
        .map_err(|msg| AppError::field("fields", &msg))?;

    let profile = auth.profile(user.id, &fields).await?;
    Ok(Json(profile))
}
