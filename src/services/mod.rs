pub mod auth;
pub mod comment;
pub mod post;
pub mod upvote;
