//! Purpose: Request dispatcher for the Dogear REST backend.
//! Exports: `Client`, `Payload`, `DEFAULT_API_BASE_URL`.
//! Role: Uniform request construction, bearer injection, response classification.
//! Invariants: Caller headers apply over the JSON defaults; the session token
//! always wins for Authorization.
//! Invariants: Every failure carries exactly one of Unauthorized/Network/Server.
//! Invariants: A 401 clears the session before the error is returned and is
//! never re-classified.
//! Invariants: No retries, no timeouts, no cancellation; one attempt per call.
#![allow(clippy::result_large_err)]

use crate::error::{Error, ErrorKind};
use crate::session::Session;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub type ApiResult<T> = Result<T, Error>;

/// Compiled-in default backend origin; override per client with `Client::new`.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// A classified successful response body. The variant is decided by the
/// response's declared content type, not by any schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn into_json(self) -> ApiResult<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(_) => Err(Error::new(ErrorKind::Server)
                .with_message("expected a json response body")),
        }
    }
}

#[derive(Clone)]
pub struct Client {
    base_url: Url,
    session: Session,
    agent: ureq::Agent,
}

impl Client {
    /// Client over the given base origin, with a fresh default on-disk session.
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            session: Session::from_default_file(),
            agent: ureq::AgentBuilder::new().build(),
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn get<R>(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        let url = self.build_url(segments, query)?;
        let payload = self.dispatch("GET", &url, None, &[])?;
        decode(payload)
    }

    pub(crate) fn send<T, R>(&self, method: &str, segments: &[&str], body: &T) -> ApiResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = self.build_url(segments, &[])?;
        let body = serde_json::to_string(body).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode request json")
                .with_source(err)
        })?;
        let payload = self.dispatch(method, &url, Some(&body), &[])?;
        decode(payload)
    }

    pub(crate) fn send_empty<R>(&self, method: &str, segments: &[&str]) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        let url = self.build_url(segments, &[])?;
        let payload = self.dispatch(method, &url, None, &[])?;
        decode(payload)
    }

    /// Issue one request and classify the outcome. `headers` are applied over
    /// the JSON defaults (a repeated name replaces the default); Authorization
    /// comes from the session regardless. Callers never see transport-level
    /// errors directly.
    pub fn dispatch(
        &self,
        method: &str,
        url: &Url,
        body: Option<&str>,
        headers: &[(&str, &str)],
    ) -> ApiResult<Payload> {
        let mut request = self
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.set(name, value);
        }
        if let Some(token) = self.session.token() {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = match body {
            Some(payload) => request.send_string(payload),
            None => request.call(),
        };

        match response {
            Ok(resp) => {
                debug!(method, path = url.path(), status = resp.status(), "request ok");
                classify_body(resp)
            }
            Err(ureq::Error::Status(401, resp)) => {
                debug!(method, path = url.path(), status = 401u16, "unauthorized");
                // Session must be gone before the caller sees the error; a
                // failed removal still leaves the error kind Unauthorized.
                let _ = self.session.clear();
                let detail = read_detail(resp);
                Err(Error::new(ErrorKind::Unauthorized)
                    .with_message(detail.unwrap_or_else(|| "authentication required".to_string()))
                    .with_status(401))
            }
            Err(ureq::Error::Status(status, resp)) => {
                debug!(method, path = url.path(), status, "server error");
                let detail = read_detail(resp);
                Err(Error::new(ErrorKind::Server)
                    .with_message(detail.unwrap_or_else(|| "unknown error".to_string()))
                    .with_status(status))
            }
            Err(ureq::Error::Transport(err)) => {
                debug!(method, path = url.path(), "transport failure");
                Err(Error::new(ErrorKind::Network)
                    .with_message("network error")
                    .with_source(err))
            }
        }
    }

    pub(crate) fn build_url(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                Error::new(ErrorKind::Usage).with_message("base url cannot be a base")
            })?;
            path.clear();
            for segment in segments {
                path.push(segment);
            }
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        if query.is_empty() {
            url.set_query(None);
        }
        Ok(url)
    }
}

fn classify_body(resp: ureq::Response) -> ApiResult<Payload> {
    let is_json = resp
        .header("content-type")
        .is_some_and(|value| value.contains("application/json"));
    let body = resp.into_string().map_err(|err| {
        Error::new(ErrorKind::Network)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    if !is_json {
        return Ok(Payload::Text(body));
    }
    // Malformed JSON on a declared-JSON response is a generic failure; callers
    // cannot distinguish it from other server failures.
    let value = serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Server)
            .with_message("invalid response json")
            .with_source(err)
    })?;
    Ok(Payload::Json(value))
}

/// Pull the backend's `detail` message out of an error body, if it has one.
fn read_detail(resp: ureq::Response) -> Option<String> {
    let body = resp.into_string().ok()?;
    let value: Value = serde_json::from_str(&body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn decode<R>(payload: Payload) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let value = payload.into_json()?;
    serde_json::from_value(value).map_err(|err| {
        Error::new(ErrorKind::Server)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid api base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(
            Error::new(ErrorKind::Usage).with_message("api base url must use http or https")
        );
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("api base url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
