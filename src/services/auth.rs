// src/services/auth.rs

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use sqlx::SqlitePool;
use thiserror::Error;
use validator::Validate;

use crate::{
    error::{AppError, FieldErrors, field_errors, is_unique_violation},
    models::user::{LoginRequest, RegisterRequest, User, UserField, UserProfile},
    utils::{
        hash::PasswordHasher,
        session::{SessionCodec, SessionPayload},
    },
};

const INVALID_CREDENTIALS: &str = "Username/Password combination is incorrect";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid registration or login fields")]
    Validation(FieldErrors),

    #[error("User with username {0} already exists")]
    DuplicateUsername(String),

    /// Unknown username and wrong password look exactly the same.
    #[error("Username/Password combination is incorrect")]
    InvalidCredentials,

    /// The session is validly signed but its user is gone.
    #[error("session refers to a user that no longer exists")]
    SessionRevoked,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(fields) => AppError::Validation(fields),
            AuthError::DuplicateUsername(username) => AppError::FieldConflict {
                field: "username".to_string(),
                message: format!("User with username {username} already exists"),
            },
            AuthError::InvalidCredentials => AppError::Unauthorized(INVALID_CREDENTIALS.to_string()),
            AuthError::SessionRevoked => {
                AppError::Unauthorized("Your session has ended. Please log in again.".to_string())
            }
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Opaque signed cookie value proving who is logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Registration, login, logout and current-user resolution.
#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    sessions: Arc<SessionCodec>,
    hasher: PasswordHasher,
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        pool: SqlitePool,
        sessions: Arc<SessionCodec>,
        hasher: PasswordHasher,
        dummy_hash: Arc<str>,
    ) -> Self {
        Self {
            pool,
            sessions,
            hasher,
            dummy_hash,
        }
    }

    /// Creates an account and logs it in.
    ///
    /// The username pre-check only gives a friendly error early; the UNIQUE
    /// constraint on `users.username` decides when two registrations race.
    pub async fn register(&self, payload: RegisterRequest) -> Result<(User, SessionToken), AuthError> {
        payload
            .validate()
            .map_err(|e| AuthError::Validation(field_errors(&e)))?;
        let username = payload.username.trim();

        let taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        let password_hash = self.hash_password(payload.password.clone()).await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, fullname, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, username, fullname, email, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(payload.fullname.trim())
        .bind(payload.email.trim())
        .bind(&password_hash)
        .bind(chrono::Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::DuplicateUsername(username.to_string())
            } else {
                tracing::error!("Failed to register user: {:?}", e);
                AuthError::Store(e)
            }
        })?;

        tracing::info!(user_id = user.id, "User registered");

        let token = self.issue(user.id)?;
        Ok((user, token))
    }

    /// Checks credentials and starts a session.
    pub async fn login(&self, payload: LoginRequest) -> Result<(User, SessionToken), AuthError> {
        payload
            .validate()
            .map_err(|e| AuthError::Validation(field_errors(&e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, fullname, email, password_hash, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(payload.username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let stored_hash: Arc<str> = match &user {
            Some(user) => user.password_hash.as_str().into(),
            None => self.dummy_hash.clone(),
        };

        let is_valid = self.verify_password(payload.password, stored_hash).await?;

        match user {
            Some(user) if is_valid => {
                let token = self.issue(user.id)?;
                Ok((user, token))
            }
            _ => {
                tracing::info!("Rejected login attempt");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// The cookie that ends a session. Logging out always succeeds, whether or
    /// not the request carried a valid session.
    pub fn logout(&self) -> Cookie<'static> {
        self.sessions.removal_cookie()
    }

    /// The cookie that carries a freshly issued session.
    pub fn session_cookie(&self, token: SessionToken) -> Cookie<'static> {
        self.sessions.session_cookie(token.0)
    }

    /// Resolves the user behind the request's session cookie.
    ///
    /// `Ok(None)` means anonymous (no cookie, or one that does not verify).
    /// A verified session whose user no longer exists is `SessionRevoked`; the
    /// caller must clear the cookie instead of carrying on anonymously.
    pub async fn current_user(&self, jar: &CookieJar) -> Result<Option<User>, AuthError> {
        let Some(SessionPayload { user_id }) = self.sessions.read(jar) else {
            return Ok(None);
        };

        match self.find_user(user_id).await? {
            Some(user) => Ok(Some(user)),
            None => {
                tracing::warn!(user_id, "Session refers to a missing user, forcing logout");
                Err(AuthError::SessionRevoked)
            }
        }
    }

    /// Loads a user with only the requested optional fields exposed.
    pub async fn profile(&self, user_id: i64, fields: &[UserField]) -> Result<UserProfile, AuthError> {
        let user = self
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(UserProfile::select(&user, fields))
    }

    pub async fn find_user(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, fullname, email, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    fn issue(&self, user_id: i64) -> Result<SessionToken, AuthError> {
        self.sessions
            .encode(&SessionPayload { user_id })
            .map(SessionToken)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    // Argon2 is deliberately slow; keep it off the async workers.
    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn verify_password(&self, password: String, hash: Arc<str>) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}
