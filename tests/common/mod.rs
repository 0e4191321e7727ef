//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the full router (auth and cache middleware included)
//! against a fresh in-memory database with the seed categories from the
//! initial migration.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use spendwise::config::{AuthMode, Config};
use spendwise::db::create_in_memory_pool;
use spendwise::server::build_app_with_pool;
use spendwise::state::AppState;
use tower::ServiceExt;

pub const FOOD: i64 = 1;
pub const TRANSPORT: i64 = 2;
pub const HOUSING: i64 = 3;
pub const ENTERTAINMENT: i64 = 4;
pub const SALARY: i64 = 5;

pub struct TestClient {
    state: AppState,
    router: Router,
}

impl TestClient {
    /// Fresh in-memory database, authentication disabled.
    pub fn new() -> Self {
        Self::with_auth_mode(AuthMode::Unauthenticated)
    }

    pub fn with_auth_mode(auth_mode: AuthMode) -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7070,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            auth_mode,
        };

        let (state, router) = build_app_with_pool(pool, config).expect("Failed to build app");
        Self { state, router }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn read(response: Response<Body>) -> (StatusCode, String) {
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        Self::read(self.send(request).await).await
    }

    /// GET and parse the body as JSON; `None` when it does not parse.
    pub async fn get_json<T: DeserializeOwned>(&self, uri: &str) -> (StatusCode, Option<T>) {
        let (status, body) = self.get(uri).await;
        (status, serde_json::from_str(&body).ok())
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        Self::read(self.send(request).await).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, String) {
        let request = Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        Self::read(self.send(request).await).await
    }

    pub async fn post_form(&self, uri: &str, form_data: &[(&str, &str)]) -> (StatusCode, String) {
        let body = form_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        Self::read(self.send(request).await).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        Self::read(self.send(request).await).await
    }

    // =========================================================================
    // Helpers for creating records through the API
    // =========================================================================

    /// Add an expense and return its id.
    pub async fn add_expense(&self, category_id: i64, name: &str, amount: f64, date: &str) -> i64 {
        self.add("/expenses/add", category_id, name, amount, date).await
    }

    /// Add an income and return its id.
    pub async fn add_income(&self, category_id: i64, name: &str, amount: f64, date: &str) -> i64 {
        self.add("/incomes/add", category_id, name, amount, date).await
    }

    async fn add(&self, uri: &str, category_id: i64, name: &str, amount: f64, date: &str) -> i64 {
        let (status, body) = self
            .post_json(
                uri,
                serde_json::json!({
                    "categoryId": category_id,
                    "name": name,
                    "amount": amount,
                    "date": date,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {body}");
        let created: Value = serde_json::from_str(&body).unwrap();
        created["id"].as_i64().unwrap()
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare a JSON number against an expected decimal value.
pub fn approx(value: &Value, expected: f64) -> bool {
    value
        .as_f64()
        .map(|v| (v - expected).abs() < 1e-9)
        .unwrap_or(false)
}
