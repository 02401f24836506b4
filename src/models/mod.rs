// src/models/mod.rs

pub mod comment;
pub mod post;
pub mod upvote;
pub mod user;

/// Number of characters in `value` once surrounding whitespace is removed.
pub(crate) fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}
