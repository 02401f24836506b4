// src/utils/session.rs

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, ConfigError, SESSION_MAX_AGE_SECS},
    error::AppError,
};

pub const SESSION_COOKIE_NAME: &str = "Pheedback-Session";

/// Cookie settings and signing secrets for the session codec.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub name: String,
    /// Newest first. The first secret signs; every secret is accepted on decode.
    pub secrets: Vec<String>,
    pub secure: bool,
    pub max_age_secs: u64,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            secrets: config.session_secrets.clone(),
            secure: config.session_cookie_secure,
            max_age_secs: SESSION_MAX_AGE_SECS,
        }
    }
}

/// What a session proves: who is logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPayload {
    pub user_id: i64,
}

/// JWT claims carried in the cookie value.
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// Subject - the user id, as a string.
    sub: String,
    /// Issued at, Unix seconds.
    iat: i64,
    /// Expiration time as Unix timestamp.
    exp: i64,
}

/// Signs session payloads into cookie values and verifies them back.
pub struct SessionCodec {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_keys: Vec<DecodingKey>,
    validation: Validation,
}

impl SessionCodec {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        if config.secrets.is_empty() || config.secrets.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::MissingSessionSecret);
        }

        let encoding_key = EncodingKey::from_secret(config.secrets[0].as_bytes());
        let decoding_keys = config
            .secrets
            .iter()
            .map(|s| DecodingKey::from_secret(s.as_bytes()))
            .collect();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            config,
            encoding_key,
            decoding_keys,
            validation,
        })
    }

    /// Signs `payload` into an opaque cookie value.
    pub fn encode(&self, payload: &SessionPayload) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        self.encode_at(payload, now)
    }

    fn encode_at(&self, payload: &SessionPayload, issued_at: i64) -> Result<String, AppError> {
        let claims = Claims {
            sub: payload.user_id.to_string(),
            iat: issued_at,
            exp: issued_at + self.config.max_age_secs as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Verifies a cookie value. Anything malformed, expired or signed with an
    /// unknown secret yields `None`.
    pub fn decode(&self, value: &str) -> Option<SessionPayload> {
        if value.is_empty() {
            return None;
        }

        self.decoding_keys.iter().find_map(|key| {
            let data = decode::<Claims>(value, key, &self.validation).ok()?;
            let user_id = data.claims.sub.parse().ok()?;
            Some(SessionPayload { user_id })
        })
    }

    /// Reads and verifies the session cookie from a request's jar.
    pub fn read(&self, jar: &CookieJar) -> Option<SessionPayload> {
        jar.get(&self.config.name)
            .and_then(|cookie| self.decode(cookie.value()))
    }

    /// The `Set-Cookie` cookie that starts a session.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut cookie = self.base_cookie(token);
        cookie.set_max_age(time::Duration::seconds(self.config.max_age_secs as i64));
        cookie
    }

    /// A cookie that makes the browser drop the session.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base_cookie(String::new());
        cookie.make_removal();
        cookie
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.config.name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .build()
    }
}
