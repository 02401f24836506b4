use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use validator::{Validate, ValidationError};

use super::{comment::CommentResponse, trimmed_len};

/// Where a post sits on the roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    Suggestion,
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    Live,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Suggestion => "Suggestion",
            PostStatus::Planned => "Planned",
            PostStatus::InProgress => "In Progress",
            PostStatus::Live => "Live",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown post status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for PostStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Suggestion" => Ok(PostStatus::Suggestion),
            "Planned" => Ok(PostStatus::Planned),
            "In Progress" => Ok(PostStatus::InProgress),
            "Live" => Ok(PostStatus::Live),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for PostStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub detail: String,
    #[sqlx(try_from = "String")]
    pub status: PostStatus,
    pub user_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A post as it appears in listings, with derived counts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub detail: String,
    #[sqlx(try_from = "String")]
    pub status: PostStatus,
    pub user_id: i64,
    pub author_username: String,
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Number of rows in `upvotes` for this post.
    pub upvotes: i64,
    /// Number of rows in `comments` for this post.
    pub comments: i64,

    /// UI helper: whether the current viewer has upvoted this post.
    /// Always false for anonymous viewers.
    #[serde(default)]
    pub upvoted_by_viewer: bool,
}

/// A single post with its comments.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostSummary,
    pub comment_list: Vec<CommentResponse>,
}

/// Posts that made it past the suggestion stage, grouped by status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roadmap {
    pub planned: Vec<PostSummary>,
    pub in_progress: Vec<PostSummary>,
    pub live: Vec<PostSummary>,
}

impl Roadmap {
    pub fn from_posts(posts: Vec<PostSummary>) -> Self {
        let mut roadmap = Roadmap::default();
        for post in posts {
            match post.status {
                PostStatus::Planned => roadmap.planned.push(post),
                PostStatus::InProgress => roadmap.in_progress.push(post),
                PostStatus::Live => roadmap.live.push(post),
                PostStatus::Suggestion => {}
            }
        }
        roadmap
    }
}

/// DTO for creating a new post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(custom(function = validate_title))]
    pub title: String,

    #[validate(custom(function = validate_category))]
    pub category: String,

    #[validate(custom(function = validate_detail))]
    pub detail: String,
}

/// DTO for editing a post. Only the owner may send it.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(custom(function = validate_title))]
    pub title: String,

    #[validate(custom(function = validate_category))]
    pub category: String,

    #[validate(custom(function = validate_detail))]
    pub detail: String,

    #[validate(custom(function = validate_status))]
    pub status: String,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = trimmed_len(title);
    if !(2..=100).contains(&len) {
        return Err(ValidationError::new("title")
            .with_message("Title must be between 2 and 100 characters.".into()));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), ValidationError> {
    let len = trimmed_len(category);
    if !(1..=50).contains(&len) {
        return Err(ValidationError::new("category").with_message("Category is required.".into()));
    }
    Ok(())
}

fn validate_detail(detail: &str) -> Result<(), ValidationError> {
    let len = trimmed_len(detail);
    if !(5..=10_000).contains(&len) {
        return Err(ValidationError::new("detail")
            .with_message("Detail must be between 5 and 10000 characters.".into()));
    }
    Ok(())
}

fn validate_status(status: &str) -> Result<(), ValidationError> {
    status.parse::<PostStatus>().map(|_| ()).map_err(|_| {
        ValidationError::new("status")
            .with_message("Status must be Suggestion, Planned, In Progress or Live.".into())
    })
}

/// Listing order offered by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    MostUpvotes,
    LeastUpvotes,
    MostComments,
    LeastComments,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Most Upvotes" => Ok(SortBy::MostUpvotes),
            "Least Upvotes" => Ok(SortBy::LeastUpvotes),
            "Most Comments" => Ok(SortBy::MostComments),
            "Least Comments" => Ok(SortBy::LeastComments),
            other => Err(format!("Unknown sort order '{other}'")),
        }
    }
}

impl SortBy {
    /// ORDER BY clause for the listing query. Ties fall back to newest first.
    pub fn order_clause(&self) -> &'static str {
        match self {
            SortBy::MostUpvotes => "upvotes DESC, p.id DESC",
            SortBy::LeastUpvotes => "upvotes ASC, p.id DESC",
            SortBy::MostComments => "comments DESC, p.id DESC",
            SortBy::LeastComments => "comments ASC, p.id DESC",
        }
    }
}

/// Query parameters for listing posts.
///
/// Empty strings are treated as absent, which is what an unselected filter
/// form submits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListParams {
    pub category: Option<String>,

    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    /// Only posts the current user has upvoted. Requires a session.
    #[serde(rename = "userUpvotes")]
    pub user_upvotes: Option<bool>,
}

impl PostListParams {
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// `None` when no explicit order was requested.
    pub fn sort_by(&self) -> Result<Option<SortBy>, String> {
        match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }

    pub fn only_user_upvotes(&self) -> bool {
        self.user_upvotes.unwrap_or(false)
    }
}
