//! Purpose: Follow graph operations.
//! Exports: `Client` follow methods.
//! Invariants: The following-list envelope accepts the backend's misspelled
//! `follwing` key as well as the correct one.

use super::http::{ApiResult, Client};
use super::types::{FollowStatus, UserRef};
use serde::Deserialize;

#[derive(Deserialize)]
struct FollowersEnvelope {
    #[serde(default)]
    followers: Vec<UserRef>,
}

#[derive(Deserialize)]
struct FollowingEnvelope {
    // Deployed backends spell this key "follwing"; newer ones fix it.
    #[serde(default, alias = "follwing")]
    following: Vec<UserRef>,
}

impl Client {
    pub fn follow(&self, user_id: u64) -> ApiResult<()> {
        let _: serde_json::Value =
            self.send_empty("POST", &["users", &user_id.to_string(), "follow"])?;
        Ok(())
    }

    pub fn unfollow(&self, user_id: u64) -> ApiResult<()> {
        let _: serde_json::Value =
            self.send_empty("DELETE", &["users", &user_id.to_string(), "unfollow"])?;
        Ok(())
    }

    pub fn followers(&self, user_id: u64) -> ApiResult<Vec<UserRef>> {
        let envelope: FollowersEnvelope =
            self.get(&["users", &user_id.to_string(), "followers"], &[])?;
        Ok(envelope.followers)
    }

    pub fn following(&self, user_id: u64) -> ApiResult<Vec<UserRef>> {
        let envelope: FollowingEnvelope =
            self.get(&["users", &user_id.to_string(), "following"], &[])?;
        Ok(envelope.following)
    }

    pub fn follow_status(&self, user_id: u64) -> ApiResult<FollowStatus> {
        self.get(&["users", &user_id.to_string(), "follow-status"], &[])
    }
}
