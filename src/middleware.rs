// src/middleware.rs

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::{
    error::AppError,
    models::user::User,
    services::auth::{AuthError, AuthService},
};

/// The session's user, or `None` for anonymous requests.
/// Inserted by `resolve_session`.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// A logged-in user. Extracting it from an anonymous request yields 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Axum Middleware: Session resolution.
///
/// Decodes the session cookie and injects `CurrentUser` into the request
/// extensions. A validly signed session whose user has disappeared is not
/// downgraded to anonymous: the request is refused with 401 and the cookie is
/// cleared.
pub async fn resolve_session(
    State(auth): State<AuthService>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match auth.current_user(&jar).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Err(AuthError::SessionRevoked) => (
            StatusCode::UNAUTHORIZED,
            jar.add(auth.logout()),
            Json(json!({ "error": "Your session has ended. Please log in again." })),
        )
            .into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone())
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("You must be logged in".to_string()))
    }
}
