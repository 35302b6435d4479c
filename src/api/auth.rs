//! Purpose: Authentication operations (login, signup, logout, withdrawal).
//! Exports: `NewAccount`; `Client` auth methods.
//! Role: Session lifecycle entry points; the only writers of session state.
//! Invariants: Login stores the token before attempting user-id extraction.
//! Invariants: Logout and withdrawal always leave the session cleared.

use super::http::{ApiResult, Client};
use super::types::UserProfile;
use crate::error::ErrorKind;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Serialize)]
struct WithdrawRequest<'a> {
    password: &'a str,
}

/// Signup form. `password_test` is the confirmation field the backend expects
/// alongside the password itself.
#[derive(Clone, Debug, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_test: String,
    pub bio: Option<String>,
}

impl Client {
    /// Log in and persist the session. The user id comes from the token's
    /// JWT `sub` claim when the token is decodable; login still succeeds
    /// when it is not.
    pub fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let response: LoginResponse =
            self.send("POST", &["auth", "login"], &LoginRequest { email, password })?;
        let user_id = jwt_subject(&response.access_token);
        self.session().save(&response.access_token, user_id.as_deref())
    }

    pub fn signup(&self, account: &NewAccount) -> ApiResult<UserProfile> {
        self.send("POST", &["auth", "signup"], account)
    }

    /// Tell the backend, then drop local state. Already being logged out on
    /// the server is not an error.
    pub fn logout(&self) -> ApiResult<()> {
        let result: ApiResult<Value> = self.send_empty("POST", &["auth", "logout"]);
        self.session().clear()?;
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::Unauthorized => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Delete the account, then drop local state.
    pub fn withdraw(&self, password: &str) -> ApiResult<()> {
        let _: Value = self.send("DELETE", &["auth", "withdraw"], &WithdrawRequest { password })?;
        self.session().clear()
    }
}

/// Extract the `sub` claim from a JWT's payload segment. Returns None for
/// anything that does not look like a decodable three-part token.
fn jwt_subject(token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    claims.get("sub").and_then(Value::as_str).map(str::to_string)
}
