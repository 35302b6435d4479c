//! Purpose: User profile operations and batch author resolution.
//! Exports: `FALLBACK_AUTHOR`; `Client` user methods.
//! Role: Profile reads/updates plus the one concurrent helper in the client.
//! Invariants: Author resolution deduplicates ids and never fails as a whole;
//! a failed lookup yields the fallback label for that id only.

use super::http::{ApiResult, Client};
use super::types::UserProfile;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Display label substituted when an author lookup fails.
pub const FALLBACK_AUTHOR: &str = "anonymous";

#[derive(Serialize)]
struct PasswordUpdateRequest<'a> {
    password: &'a str,
    new_password: &'a str,
    new_password_test: &'a str,
}

#[derive(Serialize)]
struct ProfileUpdateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<&'a str>,
}

impl Client {
    pub fn user(&self, user_id: u64) -> ApiResult<UserProfile> {
        self.get(&["user", &user_id.to_string()], &[])
    }

    pub fn update_password(
        &self,
        current: &str,
        new_password: &str,
        new_password_test: &str,
    ) -> ApiResult<()> {
        let _: serde_json::Value = self.send(
            "PUT",
            &["password"],
            &PasswordUpdateRequest {
                password: current,
                new_password,
                new_password_test,
            },
        )?;
        Ok(())
    }

    pub fn update_profile(
        &self,
        username: Option<&str>,
        bio: Option<&str>,
    ) -> ApiResult<UserProfile> {
        self.send("PUT", &["userinfo"], &ProfileUpdateRequest { username, bio })
    }

    /// Resolve author display names for a batch of user ids. Duplicate ids are
    /// looked up once; lookups run concurrently and a per-id failure maps that
    /// id to [`FALLBACK_AUTHOR`] without aborting the rest.
    pub fn resolve_authors(&self, user_ids: &[u64]) -> HashMap<u64, String> {
        let unique: BTreeSet<u64> = user_ids.iter().copied().collect();
        std::thread::scope(|scope| {
            let handles: Vec<_> = unique
                .iter()
                .map(|&id| (id, scope.spawn(move || self.user(id))))
                .collect();
            handles
                .into_iter()
                .map(|(id, handle)| {
                    let name = match handle.join() {
                        Ok(Ok(user)) => user.username,
                        _ => FALLBACK_AUTHOR.to_string(),
                    };
                    (id, name)
                })
                .collect()
        })
    }
}
