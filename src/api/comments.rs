//! Purpose: Comment operations (threaded one level deep).
//! Exports: `Client` comment methods.
//! Role: Method+path mapping; depth is assigned server-side from `parent_id`.

use super::http::{ApiResult, Client};
use super::types::Comment;
use serde::Serialize;

#[derive(Serialize)]
struct CommentCreateRequest<'a> {
    content: &'a str,
    post_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<u64>,
}

#[derive(Serialize)]
struct CommentUpdateRequest<'a> {
    content: &'a str,
}

impl Client {
    pub fn comments(&self, post_id: u64) -> ApiResult<Vec<Comment>> {
        self.get(&["posts", &post_id.to_string(), "comments"], &[])
    }

    /// Create a comment; pass `parent_id` to reply to a top-level comment.
    pub fn create_comment(
        &self,
        post_id: u64,
        content: &str,
        parent_id: Option<u64>,
    ) -> ApiResult<Comment> {
        self.send(
            "POST",
            &["posts", &post_id.to_string(), "comments"],
            &CommentCreateRequest {
                content,
                post_id,
                parent_id,
            },
        )
    }

    pub fn update_comment(&self, comment_id: u64, content: &str) -> ApiResult<Comment> {
        self.send(
            "PUT",
            &["posts", "comments", &comment_id.to_string()],
            &CommentUpdateRequest { content },
        )
    }

    pub fn delete_comment(&self, comment_id: u64) -> ApiResult<()> {
        let _: serde_json::Value =
            self.send_empty("DELETE", &["posts", "comments", &comment_id.to_string()])?;
        Ok(())
    }
}
