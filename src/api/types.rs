//! Purpose: Public response types for the Dogear backend.
//! Exports: post/comment/user/search/like/follow DTOs.
//! Role: Mirror the backend's response schemas; no client-side invariants.
//! Invariants: Timestamps stay as the backend's RFC 3339 strings; rendering
//! parses them when needed.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Tag {
    pub id: u64,
    pub name: String,
}

/// A book-review post.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub content: String,
    pub isbn: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub like_count: u64,
    pub created_at: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// A comment; `depth` 0 is top-level, 1 is a reply to `parent_id`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub user_id: u64,
    #[serde(default)]
    pub parent_id: Option<u64>,
    pub content: String,
    pub depth: u8,
    pub created_at: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub total_views: u64,
    pub created_at: String,
}

/// Minimal user reference used in follower/following listings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct UserRef {
    pub id: u64,
    pub username: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SearchHit {
    pub post_id: u64,
    pub title: String,
    pub book_title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub isbn: String,
    pub created_at: String,
}

/// Result of toggling a like on a post.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PostLikes {
    pub like_count: u64,
    #[serde(default)]
    pub users: Vec<UserRef>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct FollowStatus {
    pub is_following: bool,
}
