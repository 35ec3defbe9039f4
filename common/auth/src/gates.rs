use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use crate::pipeline::{Next, Request, RequestContext, Response, Stage};
use crate::validator::TokenValidator;

/// Attaches an [`Identity`](crate::claims::Identity) to the context when the
/// request carries a valid bearer token. Never rejects on its own.
pub struct AuthenticationGate {
    validator: Arc<TokenValidator>,
}

impl AuthenticationGate {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Stage for AuthenticationGate {
    async fn handle(
        &self,
        request: Request,
        mut context: RequestContext,
        next: Next<'_>,
    ) -> Response {
        if let Some(token) = bearer_token(request.headers()) {
            match self.validator.validate(token) {
                Ok(identity) => context.set_identity(identity),
                Err(err) => warn!(kind = err.kind(), error = %err, "rejected bearer token"),
            }
        }
        next.run(request, context).await
    }
}

/// Rejects with a bare `401` unless an earlier stage authenticated the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

#[async_trait]
impl Stage for AccessGate {
    async fn handle(&self, request: Request, context: RequestContext, next: Next<'_>) -> Response {
        if !context.is_authenticated() {
            debug!(path = %request.uri().path(), "denied anonymous request");
            return StatusCode::UNAUTHORIZED.into_response();
        }
        next.run(request, context).await
    }
}

/// The token of an `Authorization: Bearer <token>` header, if there is one.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
