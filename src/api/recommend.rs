//! Purpose: Feed recommendations (popular and personalized).
//! Exports: `Client` recommendation methods.

use super::http::{ApiResult, Client};
use super::types::Post;

impl Client {
    pub fn popular_posts(&self, page: u32, limit: u32) -> ApiResult<Vec<Post>> {
        self.get(
            &["recommendation", "popular"],
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
    }

    /// Personalized feed; requires an authenticated session.
    pub fn recommended_posts(&self, page: u32, limit: u32) -> ApiResult<Vec<Post>> {
        self.get(
            &["recommendation", ""],
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
    }
}
