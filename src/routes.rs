// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, community, interaction},
    middleware::resolve_session,
    state::AppState,
};

/// Assembles the main application router.
///
/// * Session-aware routes sit behind `resolve_session`.
/// * Register, login and logout skip it, so a stale cookie can always be
///   replaced or cleared.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let post_routes = Router::new()
        .route("/", get(community::list_posts).post(community::create_post))
        .route(
            "/{id}",
            get(community::get_post)
                .put(community::update_post)
                .delete(community::delete_post),
        )
        .route("/{id}/upvote", post(interaction::toggle_upvote))
        .route("/{id}/comments", post(interaction::create_comment));

    let session_routes = Router::new()
        .nest("/api/posts", post_routes)
        .route("/api/comments/{id}", delete(interaction::delete_comment))
        .route("/api/roadmap", get(community::roadmap))
        .route("/api/auth/me", get(auth::me))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session));

    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout));

    Router::new()
        .merge(session_routes)
        .merge(auth_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
