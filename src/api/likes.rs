//! Purpose: Like operations (toggle, counts, my liked posts).
//! Exports: `Client` like methods.

use super::http::{ApiResult, Client};
use super::types::{LikeToggle, Post, PostLikes};

impl Client {
    /// Posts the current user has liked, paginated.
    pub fn liked_posts(&self, page: u32, limit: u32) -> ApiResult<Vec<Post>> {
        self.get(
            &["likes", "user"],
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
    }

    pub fn post_likes(&self, post_id: u64) -> ApiResult<PostLikes> {
        self.get(&["likes", &post_id.to_string(), "likes"], &[])
    }

    /// Toggle the like state; the response carries the new state and count.
    pub fn toggle_like(&self, post_id: u64) -> ApiResult<LikeToggle> {
        self.send_empty("POST", &["likes", &post_id.to_string(), "like"])
    }
}
