// src/models/user.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::trimmed_len;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub fullname: String,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = validate_username))]
    pub username: String,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Passwords must be at least 6 characters long"
    ))]
    pub password: String,

    #[validate(custom(function = validate_fullname))]
    pub fullname: String,

    #[validate(
        contains(pattern = "@", message = "Please enter a valid email address"),
        length(max = 254, message = "Please enter a valid email address")
    )]
    pub email: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !(3..=50).contains(&trimmed_len(username)) {
        return Err(ValidationError::new("username")
            .with_message("Username must be at least 3 characters long".into()));
    }
    Ok(())
}

fn validate_fullname(fullname: &str) -> Result<(), ValidationError> {
    if trimmed_len(fullname) == 0 || fullname.len() > 100 {
        return Err(ValidationError::new("fullname").with_message("Please enter your full name".into()));
    }
    Ok(())
}

/// DTO for user login.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Please fill in all fields"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "Please fill in all fields"))]
    pub password: String,
}

/// Optional columns a caller may ask for on top of id, username and fullname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Email,
    CreatedAt,
}

impl FromStr for UserField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(UserField::Email),
            "created_at" => Ok(UserField::CreatedAt),
            other => Err(format!("Unknown user field '{other}'")),
        }
    }
}

impl UserField {
    /// Parses a comma-separated selection such as `email,created_at`.
    pub fn parse_list(raw: &str) -> Result<Vec<UserField>, String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(UserField::from_str)
            .collect()
    }
}

/// A user as shown to clients, with only the selected optional fields filled in.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub fullname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl UserProfile {
    pub fn select(user: &User, fields: &[UserField]) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            email: fields
                .contains(&UserField::Email)
                .then(|| user.email.clone()),
            created_at: fields
                .contains(&UserField::CreatedAt)
                .then_some(user.created_at),
        }
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile::select(user, &[])
    }
}
