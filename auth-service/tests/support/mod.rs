#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use auth_service::{build_app, AppState};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common_auth::{JwtConfig, JwtSettings};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

pub const ISSUER: &str = "test-issuer";
pub const AUDIENCE: &str = "test-audience";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "one-jwt-token-please";

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

pub struct TestApp {
    router: Router,
    pub settings: Arc<JwtSettings>,
}

impl TestApp {
    pub fn hmac() -> Result<Self> {
        let config =
            JwtConfig::new(ISSUER, AUDIENCE).with_secret_base64(STANDARD.encode([7u8; 32]));
        Self::from_config(config)
    }

    pub fn rsa() -> Result<Self> {
        // No PEM configured, so a fresh RSA-2048 pair is generated.
        let config = JwtConfig::new(ISSUER, AUDIENCE).with_algorithm("RS256");
        Self::from_config(config)
    }

    pub fn from_config(config: JwtConfig) -> Result<Self> {
        let settings = Arc::new(JwtSettings::initialize(&config)?);
        let state = AppState::with_default_verifier(settings.clone())?;
        Ok(Self {
            router: build_app(state),
            settings,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router call failed")?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.into_body().collect().await?.to_bytes();

        Ok(TestResponse {
            status,
            content_type,
            body: String::from_utf8(bytes.to_vec())?,
        })
    }

    pub async fn login_json(&self, username: &str, password: &str) -> Result<TestResponse> {
        let body = serde_json::json!({ "username": username, "password": password });
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<TestResponse> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty())?).await
    }
}
