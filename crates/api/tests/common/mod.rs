//! Common test utilities for integration tests.
//!
//! The router is wired to in-memory storage, a mock account service and a
//! fixed session table, so these tests need no external services.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::error::AccountError;
use domain::services::{GroupService, MemoryGroupStore, MockAccountClient, MockInviteNotifier};
use group_service_api::{
    app::{create_app, AppState},
    config::{
        Config, DatabaseConfig, InviteConfig, LoggingConfig, MailConfig, SecurityConfig,
        ServerConfig, ServicesConfig,
    },
    services::SessionValidator,
};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const CREATOR: i64 = 1;
pub const ADMIN: i64 = 2;
pub const DWELLER: i64 = 3;
pub const OUTSIDER: i64 = 4;

pub const CREATOR_TOKEN: &str = "token-creator";
pub const ADMIN_TOKEN: &str = "token-admin";
pub const DWELLER_TOKEN: &str = "token-dweller";
pub const OUTSIDER_TOKEN: &str = "token-outsider";
/// Token for which the auth service itself fails.
pub const BROKEN_TOKEN: &str = "token-auth-down";

pub const INTERNAL_SECRET: &str = "internal-test-secret";
pub const LINK_PREFIX: &str = "https://groups.example.com/welcome";

/// Session table keyed by token.
pub struct StaticSessions {
    sessions: HashMap<String, i64>,
}

impl StaticSessions {
    pub fn new() -> Self {
        let sessions = [
            (CREATOR_TOKEN, CREATOR),
            (ADMIN_TOKEN, ADMIN),
            (DWELLER_TOKEN, DWELLER),
            (OUTSIDER_TOKEN, OUTSIDER),
        ]
        .into_iter()
        .map(|(token, id)| (token.to_string(), id))
        .collect();
        Self { sessions }
    }
}

#[async_trait::async_trait]
impl SessionValidator for StaticSessions {
    async fn user_id_for_token(&self, token: &str) -> Result<Option<i64>, AccountError> {
        if token == BROKEN_TOKEN {
            return Err(AccountError::Upstream("auth service unavailable".to_string()));
        }
        Ok(self.sessions.get(token).copied())
    }
}

/// Test configuration. The database URL is never dialed.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://unused@localhost/unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            internal_secret: INTERNAL_SECRET.to_string(),
        },
        invite: InviteConfig {
            link_prefix: LINK_PREFIX.to_string(),
        },
        services: ServicesConfig {
            account_address: "http://localhost:8081".to_string(),
            auth_address: "http://localhost:8082".to_string(),
            timeout_secs: 1,
        },
        mail: MailConfig::default(),
    }
}

/// Router plus handles on its in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub notifier: MockInviteNotifier,
}

/// Account service fake knowing the four test users.
pub fn test_accounts() -> MockAccountClient {
    MockAccountClient::new()
        .with_account(CREATOR, "creator@example.com", "Carol", "Reed")
        .with_account(ADMIN, "admin@example.com", "Adam", "Stone")
        .with_account(DWELLER, "dweller@example.com", "Dora", "Wells")
        .with_account(OUTSIDER, "outsider@example.com", "Otto", "Hale")
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(test_accounts())
}

pub fn create_test_app_with(accounts: MockAccountClient) -> TestApp {
    let notifier = MockInviteNotifier::new();
    let groups = GroupService::new(Arc::new(MemoryGroupStore::new()), Arc::new(accounts))
        .with_notifier(Arc::new(notifier.clone()))
        .with_link_prefix(LINK_PREFIX);

    let state = AppState::new(test_config(), groups, Arc::new(StaticSessions::new()));
    TestApp {
        router: create_app(state),
        notifier,
    }
}

/// Build a JSON request with a session token.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a JSON request without credentials.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a bodiless request with a session token.
pub fn request_with_auth(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request with a session token.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    request_with_auth(Method::GET, uri, token)
}

/// Build a GET request carrying the internal secret.
pub fn internal_get(uri: &str, secret: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, secret)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Send a request and return status plus parsed body.
pub async fn send(app: &Router, request: Request<Body>) -> (axum::http::StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, parse_response_body(response).await)
}

/// Create a group as `token`'s user and return its id.
pub async fn create_test_group(app: &Router, token: &str, url: &str) -> i64 {
    let (status, body) = send(
        app,
        json_request_with_auth(
            Method::POST,
            "/group/group",
            serde_json::json!({
                "title": "Flatmates",
                "description": "Shared bills",
                "url": url
            }),
            token,
        ),
    )
    .await;
    assert!(status.is_success(), "group creation failed: {} {}", status, body);
    body["id"].as_i64().expect("group id")
}

/// Group created by [`CREATOR`] with [`ADMIN`] as admin and [`DWELLER`] as dweller.
pub async fn create_seeded_group(app: &Router, url: &str) -> i64 {
    let group_id = create_test_group(app, CREATOR_TOKEN, url).await;

    for (user_id, role) in [(ADMIN, 2), (DWELLER, 3)] {
        let (status, body) = send(
            app,
            json_request_with_auth(
                Method::PUT,
                &format!("/group/membership/{}", group_id),
                serde_json::json!({"user_ids": [user_id], "role": role}),
                CREATOR_TOKEN,
            ),
        )
        .await;
        assert!(status.is_success(), "seeding failed: {} {}", status, body);
    }

    group_id
}

/// Messages of the log events emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogMessages(Arc<Mutex<Vec<String>>>);

impl LogMessages {
    /// Collect events until the returned guard is dropped.
    pub fn capture() -> (Self, DefaultGuard) {
        let messages = LogMessages::default();
        let subscriber = tracing_subscriber::registry().with(messages.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (messages, guard)
    }

    pub fn count(&self, message: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|m| *m == message).count()
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for LogMessages {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.0.lock().unwrap().push(message);
        }
    }
}
