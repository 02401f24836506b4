mod common;

use common::{client, cookie_pair, set_session_cookie, spawn_app};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn registration(username: &str, password: &str) -> Value {
    json!({
        "username": username,
        "password": password,
        "fullname": "Alice Example",
        "email": format!("{username}@example.com"),
    })
}

/// Registers through the API and returns the `Cookie` header value.
async fn register_via_api(address: &str, username: &str, password: &str) -> String {
    let response = client()
        .post(format!("{}/api/auth/register", address))
        .json(&registration(username, password))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::CREATED);
    cookie_pair(&set_session_cookie(&response).expect("No session cookie set"))
}

async fn create_post_via_api(address: &str, cookie: &str, title: &str) -> i64 {
    let response = client()
        .post(format!("{}/api/posts", address))
        .header("Cookie", cookie)
        .json(&json!({
            "title": title,
            "category": "Feature",
            "detail": "Some details about it",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn unknown_path_returns_404() {
    let (address, _) = spawn_app().await;

    let response = client()
        .get(format!("{}/api/does-not-exist", address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_sets_a_hardened_session_cookie() {
    let (address, _) = spawn_app().await;

    let response = client()
        .post(format!("{}/api/auth/register", address))
        .json(&registration("alice", "secret1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = set_session_cookie(&response).expect("No session cookie set");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn register_validation_and_conflict() {
    let (address, _) = spawn_app().await;

    let response = client()
        .post(format!("{}/api/auth/register", address))
        .json(&registration("ab", "secret1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["fieldErrors"]["username"],
        "Username must be at least 3 characters long"
    );

    register_via_api(&address, "alice", "secret1").await;
    let response = client()
        .post(format!("{}/api/auth/register", address))
        .json(&registration("alice", "secret1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert!(body["fieldErrors"]["username"].is_string());
}

#[tokio::test]
async fn incomplete_or_malformed_body_is_a_json_400() {
    let (address, _) = spawn_app().await;

    let response = client()
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": "alice",
            "password": "secret1",
            "fullname": "Alice Example",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"))
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please fill in all fields");

    let response = client()
        .post(format!("{}/api/auth/login", address))
        .header("Content-Type", "application/json")
        .body("{\"username\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (address, _) = spawn_app().await;
    register_via_api(&address, "alice", "secret1").await;

    let wrong_password = client()
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": "alice", "password": "nope123" }))
        .send()
        .await
        .unwrap();
    let unknown_user = client()
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": "nobody", "password": "secret1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert!(set_session_cookie(&wrong_password).is_none());

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn me_requires_a_session() {
    let (address, _) = spawn_app().await;

    let response = client()
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = register_via_api(&address, "alice", "secret1").await;
    let response = client()
        .get(format!("{}/api/auth/me?fields=email,created_at", address))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body["created_at"].is_string());

    let response = client()
        .get(format!("{}/api/auth/me?fields=password_hash", address))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tampered_cookie_is_treated_as_anonymous() {
    let (address, _) = spawn_app().await;
    let cookie = register_via_api(&address, "alice", "secret1").await;
    let tampered = format!("{cookie}x");

    let response = client()
        .get(format!("{}/api/roadmap", address))
        .header("Cookie", &tampered)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client()
        .get(format!("{}/api/auth/me", address))
        .header("Cookie", &tampered)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_cookie_and_redirects() {
    let (address, _) = spawn_app().await;

    let response = client()
        .post(format!("{}/api/auth/logout", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/auth")
    );
    let cookie = set_session_cookie(&response).expect("Logout should reset the cookie");
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn upvote_toggle_flow() {
    let (address, _) = spawn_app().await;
    let cookie = register_via_api(&address, "alice", "secret1").await;
    let post_id = create_post_via_api(&address, &cookie, "Dark mode").await;

    let anonymous = client()
        .post(format!("{}/api/posts/{}/upvote", address, post_id))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let response = client()
            .post(format!("{}/api/posts/{}/upvote", address, post_id))
            .header("Cookie", &cookie)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        outcomes.push((body["outcome"].clone(), body["upvotes"].clone()));
    }
    assert_eq!(outcomes[0], (json!("added"), json!(1)));
    assert_eq!(outcomes[1], (json!("removed"), json!(0)));

    let missing = client()
        .post(format!("{}/api/posts/{}/upvote", address, post_id + 1))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_reflects_viewer_upvotes() {
    let (address, _) = spawn_app().await;
    let cookie = register_via_api(&address, "alice", "secret1").await;
    let post_id = create_post_via_api(&address, &cookie, "Dark mode").await;
    client()
        .post(format!("{}/api/posts/{}/upvote", address, post_id))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();

    let response = client()
        .get(format!("{}/api/posts?userUpvotes=true", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client()
        .get(format!("{}/api/posts?userUpvotes=true&sortBy=Most%20Upvotes", address))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body[0]["id"], post_id);
    assert_eq!(body[0]["upvotes"], 1);
    assert_eq!(body[0]["upvoted_by_viewer"], true);
}

#[tokio::test]
async fn stale_session_forces_logout() {
    let (address, state) = spawn_app().await;
    let cookie = register_via_api(&address, "alice", "secret1").await;

    sqlx::query("DELETE FROM users WHERE username = ?")
        .bind("alice")
        .execute(&state.pool)
        .await
        .unwrap();

    let response = client()
        .get(format!("{}/api/roadmap", address))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cleared = set_session_cookie(&response).expect("Stale session should be cleared");
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn non_owner_cannot_edit_or_delete() {
    let (address, _) = spawn_app().await;
    let alice = register_via_api(&address, "alice", "secret1").await;
    let bob = register_via_api(&address, "bobby", "secret2").await;
    let post_id = create_post_via_api(&address, &alice, "Dark mode").await;

    let response = client()
        .put(format!("{}/api/posts/{}", address, post_id))
        .header("Cookie", &bob)
        .json(&json!({
            "title": "Hijacked",
            "category": "Feature",
            "detail": "Some details about it",
            "status": "Live",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client()
        .delete(format!("{}/api/posts/{}", address, post_id))
        .header("Cookie", &bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client()
        .delete(format!("{}/api/posts/{}", address, post_id))
        .header("Cookie", &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
