//! Purpose: Post CRUD plus related-post and per-user listings.
//! Exports: `NewPost`; `Client` post methods.
//! Role: Method+path mapping only; the dispatcher owns all contract logic.

use super::http::{ApiResult, Client};
use super::types::Post;
use serde::Serialize;

/// A post to be created: review text plus the book it reviews.
#[derive(Clone, Debug, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub isbn: String,
    pub book_title: String,
    pub book_author: String,
}

#[derive(Serialize)]
struct PostUpdateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

impl Client {
    pub fn post(&self, post_id: u64) -> ApiResult<Post> {
        self.get(&["posts", &post_id.to_string()], &[])
    }

    pub fn create_post(&self, post: &NewPost) -> ApiResult<Post> {
        self.send("POST", &["posts", ""], post)
    }

    pub fn update_post(
        &self,
        post_id: u64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> ApiResult<Post> {
        self.send(
            "PUT",
            &["posts", &post_id.to_string()],
            &PostUpdateRequest { title, content },
        )
    }

    pub fn delete_post(&self, post_id: u64) -> ApiResult<()> {
        let _: serde_json::Value = self.send_empty("DELETE", &["posts", &post_id.to_string()])?;
        Ok(())
    }

    pub fn related_posts(&self, post_id: u64, limit: u32) -> ApiResult<Vec<Post>> {
        self.get(
            &["posts", &post_id.to_string(), "related"],
            &[("limit", limit.to_string())],
        )
    }

    pub fn user_posts(&self, user_id: u64) -> ApiResult<Vec<Post>> {
        self.get(&["posts", "users", &user_id.to_string()], &[])
    }
}
