use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use messagely_api::{AppStateInner, router};
use messagely_core::{CredentialStore, HashConfig, Hasher, MessageQueryService};
use messagely_db::Database;

const SECRET: &str = "test-secret";

struct TestApp {
    db: Arc<Database>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let hasher = Hasher::new(HashConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let state = Arc::new(AppStateInner {
            credentials: CredentialStore::new(db.clone(), hasher),
            messages: MessageQueryService::new(db.clone()),
            jwt_secret: SECRET.to_string(),
        });
        Self {
            db,
            router: router(state),
        }
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "password": password,
                    "first_name": format!("{}-first", username),
                    "last_name": format!("{}-last", username),
                    "phone": "555-0100",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    fn send(&self, from: &str, to: &str, body: &str) {
        self.db
            .insert_message(uuid::Uuid::new_v4(), from, to, body, chrono::Utc::now())
            .unwrap();
    }
}

#[tokio::test]
async fn register_conflict_is_409() {
    let app = TestApp::new();
    app.register("alice", "pw").await;

    let (status, body) = app
        .call(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "password": "other",
                "first_name": "A",
                "last_name": "B",
                "phone": "1",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["status"], 409);
}

#[tokio::test]
async fn login_distinguishes_failures() {
    let app = TestApp::new();
    app.register("alice", "right").await;

    let (status, body) = app
        .call("POST", "/auth/login", None, Some(json!({"username": "alice", "password": "right"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = app
        .call("POST", "/auth/login", None, Some(json!({"username": "alice", "password": "wrong"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("POST", "/auth/login", None, Some(json!({"username": "ghost", "password": "x"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_routes_require_a_token() {
    let app = TestApp::new();
    app.register("alice", "pw").await;

    let (status, _) = app.call("GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/users", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_and_detail() {
    let app = TestApp::new();
    let token = app.register("alice", "pw").await;
    app.register("bob", "pw").await;

    let (status, body) = app.call("GET", "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["username"], "alice");
    assert!(users[0].get("password").is_none());

    let (status, body) = app.call("GET", "/users/alice", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let user = &body["user"];
    for field in ["username", "first_name", "last_name", "phone", "join_at", "last_login_at"] {
        assert!(user.get(field).is_some(), "missing {}", field);
    }
    assert_eq!(user["first_name"], "alice-first");
}

#[tokio::test]
async fn other_users_routes_are_rejected() {
    let app = TestApp::new();
    let token = app.register("alice", "pw").await;
    app.register("bob", "pw").await;

    for uri in ["/users/bob", "/users/bob/to", "/users/bob/from"] {
        let (status, _) = app.call("GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn directional_message_views() {
    let app = TestApp::new();
    let alice = app.register("alice", "pw").await;
    let bob = app.register("bob", "pw").await;
    app.send("alice", "bob", "hi");

    let (status, body) = app.call("GET", "/users/alice/from", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["body"], "hi");
    assert_eq!(messages[0]["to_user"]["username"], "bob");
    assert!(messages[0]["read_at"].is_null());

    let (status, body) = app.call("GET", "/users/bob/to", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["from_user"]["username"], "alice");
    assert_eq!(messages[0]["from_user"]["phone"], "555-0100");

    let (status, body) = app.call("GET", "/users/alice/to", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"].as_array().unwrap().is_empty());
}
