#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use users_api::auth::jwt::{encode_token, Claims};
use users_api::config::{Config, LogFormat, TenantSource};
use users_api::db::users::UNIQUE_KEYS;
use users_api::store::{MemoryContainer, SharedContainer};

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

/// A running test server instance backed by an in-memory container.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub container: Arc<MemoryContainer>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Bearer token acting for `tenant_id`.
    pub fn token(&self, tenant_id: &str) -> String {
        token_for(tenant_id)
    }

    /// Create a user, return (body, status).
    pub async fn create_user(&self, token: &str, body: &Value) -> (Value, StatusCode) {
        self.post_auth("/api/users", token, body).await
    }

    /// Create a user and assert it succeeded, return the user JSON.
    pub async fn create_user_ok(&self, token: &str, email: &str, nom: &str) -> Value {
        let (body, status) = self
            .create_user(token, &json!({ "email": email, "nom": nom, "prenom": "Test" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {body}");
        body
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn token_for(tenant_id: &str) -> String {
    let claims = Claims::new("test-user", tenant_id, chrono::Duration::minutes(5));
    encode_token(&claims, JWT_SECRET).expect("encode test token")
}

pub fn test_config(tenant_source: TenantSource) -> Config {
    Config {
        database_url: None,
        users_container: "users".to_string(),
        tenant_source,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        store_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(10),
        max_body_size: 65_536,
        cors_origins: vec![],
        log_level: "warn".to_string(),
        log_format: LogFormat::Text,
    }
}

/// Spawn a test app in JWT tenant mode.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(TenantSource::Jwt {
        secret: JWT_SECRET.to_string(),
    })
    .await
}

pub async fn spawn_app_with(tenant_source: TenantSource) -> TestApp {
    let container = Arc::new(MemoryContainer::new("users").with_unique_keys(UNIQUE_KEYS));
    let shared: SharedContainer = container.clone();

    let addr = serve(users_api::build_app(shared, test_config(tenant_source))).await;

    TestApp {
        addr,
        client: Client::new(),
        container,
    }
}

/// Serve `app` on a random local port in the background.
pub async fn serve(app: Router) -> SocketAddr {
    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    addr
}
