//! Purpose: Client API for the Dogear book-review backend.
//! Exports: `Client` plus DTOs, request builders, and validation helpers.
//! Role: Everything a frontend needs to talk to the backend; no rendering here.
//! Invariants: All requests flow through `Client::dispatch` in `http`.

mod auth;
mod comments;
mod follows;
mod http;
mod likes;
mod posts;
mod recommend;
mod search;
mod types;
mod users;
pub mod validation;

pub use auth::NewAccount;
pub use http::{ApiResult, Client, DEFAULT_API_BASE_URL, Payload};
pub use posts::NewPost;
pub use types::{
    Comment, FollowStatus, LikeToggle, Post, PostLikes, SearchHit, Tag, UserProfile, UserRef,
};
pub use users::FALLBACK_AUTHOR;
