//! Purpose: End-to-end tests for the client against an in-process mock backend.
//! Exports: None (integration test module).
//! Role: Validate bearer injection, response classification, and session effects.
//! Invariants: Each test runs its own loopback server on an ephemeral port.
//! Invariants: Session state is in-memory or under a temp dir, never the real file.

use axum::Router;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dogear::api::{Client, Payload};
use dogear::{ErrorKind, Session};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn spawn_backend(router: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
            axum::serve(listener, router).await.expect("serve");
        });
    });
    format!("http://{addr}")
}

fn client_for(router: Router) -> Client {
    let base_url = spawn_backend(router);
    Client::new(base_url)
        .expect("client")
        .with_session(Session::in_memory())
}

fn jwt_with_sub(sub: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{sub}","exp":1900000000}}"#));
    format!("{header}.{payload}.sig")
}

fn profile_json(id: u64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "bio": "",
        "total_views": 0,
        "created_at": "2026-01-01T00:00:00Z",
    })
}

#[test]
fn login_saves_token_and_decoded_user_id() {
    let token = jwt_with_sub("7");
    let login_token = token.clone();
    let router = Router::new().route(
        "/auth/login",
        post(move || {
            let token = login_token.clone();
            async move { axum::Json(json!({"access_token": token})) }
        }),
    );
    let client = client_for(router);

    client.login("reader@example.com", "secret1!a").expect("login");
    assert_eq!(client.session().token(), Some(token));
    assert_eq!(client.session().user_id().as_deref(), Some("7"));
}

#[test]
fn login_with_opaque_token_still_succeeds() {
    let router = Router::new().route(
        "/auth/login",
        post(|| async { axum::Json(json!({"access_token": "opaque-token"})) }),
    );
    let client = client_for(router);

    client.login("reader@example.com", "secret1!a").expect("login");
    assert_eq!(client.session().token().as_deref(), Some("opaque-token"));
    assert_eq!(client.session().user_id(), None);
}

#[test]
fn bearer_header_is_sent_when_logged_in() {
    let seen = Arc::new(Mutex::new(Vec::<Option<String>>::new()));
    let recorder = seen.clone();
    let router = Router::new().route(
        "/user/:id",
        get(move |headers: HeaderMap, Path(id): Path<u64>| {
            let recorder = recorder.clone();
            async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                recorder.lock().expect("lock").push(auth);
                axum::Json(profile_json(id, "jo"))
            }
        }),
    );
    let client = client_for(router);

    client.user(7).expect("anonymous request");
    client.session().save("tok", Some("7")).expect("save");
    client.user(7).expect("authenticated request");

    let headers = seen.lock().expect("lock").clone();
    assert_eq!(headers, vec![None, Some("Bearer tok".to_string())]);
}

#[test]
fn unauthorized_clears_session_and_keeps_detail() {
    let router = Router::new().route(
        "/user/:id",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({"detail": "token expired"})),
            )
        }),
    );
    let client = client_for(router);
    client.session().save("stale", Some("7")).expect("save");

    let err = client.user(7).expect_err("unauthorized");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.message(), Some("token expired"));
    assert_eq!(err.status(), Some(401));
    assert_eq!(client.session().token(), None);
    assert_eq!(client.session().user_id(), None);
}

#[test]
fn server_error_carries_backend_detail() {
    let router = Router::new().route(
        "/posts/:id",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                axum::Json(json!({"detail": "not found"})),
            )
        }),
    );
    let client = client_for(router);

    let err = client.post(99).expect_err("missing post");
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.message(), Some("not found"));
    assert_eq!(err.status(), Some(404));
}

#[test]
fn server_error_without_detail_is_generic() {
    let router = Router::new().route(
        "/posts/:id",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let client = client_for(router);

    let err = client.post(1).expect_err("server failure");
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.message(), Some("unknown error"));
    assert_eq!(err.status(), Some(500));
}

#[test]
fn payload_classification_follows_content_type() {
    let router = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .route("/data", get(|| async { axum::Json(json!({"ok": true})) }));
    let client = client_for(router);

    let url = client.base_url().join("ping").expect("url");
    let payload = client.dispatch("GET", &url, None, &[]).expect("text");
    assert_eq!(payload, Payload::Text("pong".to_string()));

    let url = client.base_url().join("data").expect("url");
    let payload = client.dispatch("GET", &url, None, &[]).expect("json");
    assert_eq!(payload, Payload::Json(json!({"ok": true})));
}

#[test]
fn caller_headers_override_defaults_but_not_the_token() {
    let seen = Arc::new(Mutex::new(Vec::<(Option<String>, Option<String>, Option<String>)>::new()));
    let recorder = seen.clone();
    let router = Router::new().route(
        "/ingest",
        post(move |headers: HeaderMap, _body: String| {
            let recorder = recorder.clone();
            async move {
                let read = |name: header::HeaderName| {
                    headers
                        .get(name)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string)
                };
                recorder.lock().expect("lock").push((
                    read(header::CONTENT_TYPE),
                    read(header::ACCEPT),
                    read(header::AUTHORIZATION),
                ));
                axum::Json(json!({"ok": true}))
            }
        }),
    );
    let client = client_for(router);
    client.session().save("tok", Some("7")).expect("save");
    let url = client.base_url().join("ingest").expect("url");

    client
        .dispatch("POST", &url, Some("plain body"), &[("Content-Type", "text/plain")])
        .expect("override");
    client.dispatch("POST", &url, Some("{}"), &[]).expect("defaults");

    let requests = seen.lock().expect("lock").clone();
    assert_eq!(
        requests[0],
        (
            Some("text/plain".to_string()),
            Some("application/json".to_string()),
            Some("Bearer tok".to_string()),
        )
    );
    assert_eq!(requests[1].0.as_deref(), Some("application/json"));
}

#[test]
fn malformed_json_body_is_a_server_error() {
    let router = Router::new().route(
        "/posts/:id",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "application/json")],
                "{not json".to_string(),
            )
                .into_response()
        }),
    );
    let client = client_for(router);

    let err = client.post(1).expect_err("malformed body");
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.message(), Some("invalid response json"));
}

#[test]
fn unreachable_backend_classifies_as_network() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let client = Client::new(format!("http://127.0.0.1:{port}"))
        .expect("client")
        .with_session(Session::in_memory());

    let err = client.post(1).expect_err("unreachable");
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[test]
fn resolve_authors_deduplicates_and_falls_back() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let counter = lookups.clone();
    let router = Router::new().route(
        "/user/:id",
        get(move |Path(id): Path<u64>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if id == 3 {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        axum::Json(json!({"detail": "broken"})),
                    )
                        .into_response()
                } else {
                    axum::Json(profile_json(id, if id == 1 { "jo" } else { "kim" }))
                        .into_response()
                }
            }
        }),
    );
    let client = client_for(router);

    let authors = client.resolve_authors(&[1, 2, 1, 3, 2]);
    assert_eq!(lookups.load(Ordering::SeqCst), 3);
    assert_eq!(authors.get(&1).map(String::as_str), Some("jo"));
    assert_eq!(authors.get(&2).map(String::as_str), Some("kim"));
    assert_eq!(authors.get(&3).map(String::as_str), Some("anonymous"));
}

#[test]
fn following_accepts_misspelled_backend_key() {
    let router = Router::new().route(
        "/users/:id/following",
        get(|| async {
            axum::Json(json!({
                "follwing": [
                    {"id": 1, "username": "jo"},
                    {"id": 2, "username": "kim"},
                ]
            }))
        }),
    );
    let client = client_for(router);

    let following = client.following(5).expect("following");
    assert_eq!(following.len(), 2);
    assert_eq!(following[0].username, "jo");
}

#[test]
fn signup_sends_password_confirmation_field() {
    let body = Arc::new(Mutex::new(Value::Null));
    let capture = body.clone();
    let router = Router::new().route(
        "/auth/signup",
        post(move |axum::Json(payload): axum::Json<Value>| {
            let capture = capture.clone();
            async move {
                *capture.lock().expect("lock") = payload;
                axum::Json(profile_json(11, "book_lover"))
            }
        }),
    );
    let client = client_for(router);

    let profile = client
        .signup(&dogear::api::NewAccount {
            username: "book_lover".to_string(),
            email: "reader@example.com".to_string(),
            password: "secret1!a".to_string(),
            password_test: "secret1!a".to_string(),
            bio: None,
        })
        .expect("signup");
    assert_eq!(profile.id, 11);

    let sent = body.lock().expect("lock").clone();
    assert_eq!(sent["password"], "secret1!a");
    assert_eq!(sent["password_test"], "secret1!a");
}

#[test]
fn password_update_sends_all_three_fields() {
    let body = Arc::new(Mutex::new(Value::Null));
    let capture = body.clone();
    let router = Router::new().route(
        "/password",
        put(move |axum::Json(payload): axum::Json<Value>| {
            let capture = capture.clone();
            async move {
                *capture.lock().expect("lock") = payload;
                axum::Json(json!({"detail": "ok"}))
            }
        }),
    );
    let client = client_for(router);

    client
        .update_password("old1!aaa", "new1!aaa", "new1!aaa")
        .expect("update");
    let sent = body.lock().expect("lock").clone();
    assert_eq!(sent["password"], "old1!aaa");
    assert_eq!(sent["new_password"], "new1!aaa");
    assert_eq!(sent["new_password_test"], "new1!aaa");
}

#[test]
fn profile_update_omits_unset_fields() {
    let body = Arc::new(Mutex::new(Value::Null));
    let capture = body.clone();
    let router = Router::new().route(
        "/userinfo",
        put(move |axum::Json(payload): axum::Json<Value>| {
            let capture = capture.clone();
            async move {
                *capture.lock().expect("lock") = payload;
                axum::Json(profile_json(7, "new_name"))
            }
        }),
    );
    let client = client_for(router);

    client.update_profile(Some("new_name"), None).expect("update");
    let sent = body.lock().expect("lock").clone();
    assert_eq!(sent["username"], "new_name");
    assert!(sent.get("bio").is_none());
}

#[test]
fn withdraw_clears_session_on_success() {
    let router = Router::new().route(
        "/auth/withdraw",
        delete(|| async { axum::Json(json!({"detail": "deleted"})) }),
    );
    let client = client_for(router);
    client.session().save("tok", Some("7")).expect("save");

    client.withdraw("secret1!a").expect("withdraw");
    assert_eq!(client.session().token(), None);
    assert_eq!(client.session().user_id(), None);
}

#[test]
fn logout_tolerates_expired_session() {
    let router = Router::new().route(
        "/auth/logout",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({"detail": "token expired"})),
            )
        }),
    );
    let client = client_for(router);
    client.session().save("stale", Some("7")).expect("save");

    client.logout().expect("logout");
    assert_eq!(client.session().token(), None);
}

#[test]
fn create_post_hits_trailing_slash_route() {
    let router = Router::new().route(
        "/posts/",
        post(|axum::Json(payload): axum::Json<Value>| async move {
            axum::Json(json!({
                "id": 1,
                "user_id": 7,
                "title": payload["title"],
                "content": payload["content"],
                "isbn": payload["isbn"],
                "views": 0,
                "like_count": 0,
                "created_at": "2026-01-01T00:00:00Z",
                "tags": [],
            }))
        }),
    );
    let client = client_for(router);

    let post = client
        .create_post(&dogear::api::NewPost {
            title: "Loved it".to_string(),
            content: "Great book.".to_string(),
            isbn: "9788936434267".to_string(),
            book_title: "The Vegetarian".to_string(),
            book_author: "Han Kang".to_string(),
        })
        .expect("create");
    assert_eq!(post.id, 1);
    assert_eq!(post.title, "Loved it");
}

#[test]
fn search_sends_repeated_tag_params() {
    let query = Arc::new(Mutex::new(String::new()));
    let capture = query.clone();
    let router = Router::new().route(
        "/search/",
        get(move |uri: axum::http::Uri| {
            let capture = capture.clone();
            async move {
                *capture.lock().expect("lock") = uri.query().unwrap_or("").to_string();
                axum::Json(json!([]))
            }
        }),
    );
    let client = client_for(router);

    let hits = client
        .search("vegetarian", &["fiction".to_string(), "korean".to_string()], 2)
        .expect("search");
    assert!(hits.is_empty());
    let sent = query.lock().expect("lock").clone();
    assert_eq!(sent, "q=vegetarian&page=2&tags=fiction&tags=korean");
}

#[test]
fn search_rejects_more_than_three_tags_client_side() {
    let client = Client::new("http://127.0.0.1:1")
        .expect("client")
        .with_session(Session::in_memory());
    let tags: Vec<String> = ["a", "b", "c", "d"].iter().map(|t| t.to_string()).collect();

    let err = client.search("x", &tags, 1).expect_err("too many tags");
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn toggle_like_round_trip() {
    let liked = Arc::new(AtomicUsize::new(0));
    let state = liked.clone();
    let router = Router::new().route(
        "/likes/:id/like",
        post(move || {
            let state = state.clone();
            async move {
                let count = state.fetch_add(1, Ordering::SeqCst) + 1;
                axum::Json(json!({"liked": count % 2 == 1, "like_count": count % 2}))
            }
        }),
    );
    let client = client_for(router);

    let first = client.toggle_like(42).expect("like");
    assert!(first.liked);
    assert_eq!(first.like_count, 1);

    let second = client.toggle_like(42).expect("unlike");
    assert!(!second.liked);
    assert_eq!(second.like_count, 0);
}
