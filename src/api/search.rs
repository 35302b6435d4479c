//! Purpose: Combined post/book search.
//! Exports: `Client::search`.
//! Invariants: At most 3 tag filters, enforced before the request goes out.

use super::http::{ApiResult, Client};
use super::types::SearchHit;
use super::validation::MAX_SEARCH_TAGS;
use crate::error::{Error, ErrorKind};

impl Client {
    /// Search posts by title, book title, or exact ISBN, optionally filtered
    /// by up to [`MAX_SEARCH_TAGS`] tags. Tags repeat as `tags` query params.
    pub fn search(&self, query: &str, tags: &[String], page: u32) -> ApiResult<Vec<SearchHit>> {
        if tags.len() > MAX_SEARCH_TAGS {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("at most {MAX_SEARCH_TAGS} tags per search"))
                .with_hint("Drop some --tag flags and retry."));
        }
        let mut params = vec![
            ("q", query.to_string()),
            ("page", page.to_string()),
        ];
        for tag in tags {
            params.push(("tags", tag.clone()));
        }
        self.get(&["search", ""], &params)
    }
}
