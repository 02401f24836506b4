// tests/common/mod.rs
#![allow(dead_code)]

use std::time::Duration;

use axum_extra::extract::cookie::CookieJar;
use pheedback::{
    config::Config,
    db,
    models::user::{RegisterRequest, User},
    routes,
    services::auth::{AuthService, SessionToken},
    state::AppState,
};
use axum::extract::FromRef;

pub const SESSION_COOKIE: &str = "Pheedback-Session";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        session_secrets: vec!["test_secret_for_integration_tests".to_string()],
        session_cookie_secure: true,
        bind_addr: ([127, 0, 0, 1], 0).into(),
        roadmap_cache_ttl: Duration::from_secs(60),
        cors_origins: vec!["http://localhost:3000".to_string()],
        // Cheap hashing keeps the suite fast.
        hash_memory_kib: 1024,
        hash_iterations: 1,
        rust_log: "error".to_string(),
    }
}

/// Fresh in-memory store with migrations applied.
pub async fn test_state() -> AppState {
    test_state_with(test_config()).await
}

pub async fn test_state_with(config: Config) -> AppState {
    let pool = db::connect(&config.database_url, 1)
        .await
        .expect("Failed to open in-memory SQLite");
    db::migrate(&pool).await.expect("Failed to migrate database");
    AppState::new(pool, config).expect("Invalid test configuration")
}

pub fn auth(state: &AppState) -> AuthService {
    AuthService::from_ref(state)
}

pub fn register_request(username: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
        fullname: format!("{username} Example"),
        email: format!("{username}@example.com"),
    }
}

/// Registers a user straight through the service.
pub async fn register(state: &AppState, username: &str, password: &str) -> (User, SessionToken) {
    auth(state)
        .register(register_request(username, password))
        .await
        .expect("Registration failed")
}

/// A request cookie jar holding the given session.
pub fn jar_with(state: &AppState, token: SessionToken) -> CookieJar {
    CookieJar::new().add(auth(state).session_cookie(token))
}

/// Inserts a post directly, bypassing validation, and returns its id.
pub async fn insert_post(state: &AppState, user_id: i64, title: &str, category: &str, status: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO posts (title, category, detail, status, user_id, created_at, updated_at)
        VALUES (?, ?, 'Some details about it', ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(category)
    .bind(status)
    .bind(user_id)
    .bind(chrono::Utc::now())
    .bind(chrono::Utc::now())
    .fetch_one(&state.pool)
    .await
    .expect("Failed to insert post")
}

/// Spawns the app on a random port. Returns the base URL and the state.
pub async fn spawn_app() -> (String, AppState) {
    let state = test_state().await;
    let app = routes::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, state)
}

/// Client that does not follow redirects, so logout's 303 is observable.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// The full `Set-Cookie` header for the session cookie, if the response set one.
pub fn set_session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .map(str::to_owned)
}

/// `name=value` part of a `Set-Cookie` header, ready for a `Cookie` header.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}
