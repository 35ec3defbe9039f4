use std::sync::Arc;

use axum::extract::{FromRef, Request, State};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use common_auth::{
    AccessGate, AuthenticationGate, ConfigError, JwtSettings, Pipeline, TokenIssuer,
    TokenValidator,
};
use tower_http::trace::TraceLayer;

use crate::credentials::{CredentialVerifier, StaticCredentialVerifier};
use crate::greeting::Greeting;
use crate::login::login;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<JwtSettings>,
    pub issuer: Arc<TokenIssuer>,
    pub pipeline: Arc<Pipeline>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Wires the issuer and the protected pipeline from initialized settings.
    pub fn new(
        settings: Arc<JwtSettings>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, ConfigError> {
        let issuer = Arc::new(TokenIssuer::new(settings.clone())?);
        let validator = Arc::new(TokenValidator::new(settings.clone()));
        let pipeline = Pipeline::new(Arc::new(Greeting))
            .stage(AuthenticationGate::new(validator))
            .stage(AccessGate);

        Ok(Self {
            settings,
            issuer,
            pipeline: Arc::new(pipeline),
            verifier,
        })
    }

    pub fn with_default_verifier(settings: Arc<JwtSettings>) -> Result<Self, ConfigError> {
        Self::new(settings, Arc::new(StaticCredentialVerifier::default()))
    }
}

impl FromRef<AppState> for Arc<JwtSettings> {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.issuer.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CredentialVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

async fn protected(State(state): State<AppState>, request: Request) -> Response {
    state.pipeline.run(request).await
}

/// `POST /login` is the only public route; everything else runs through the
/// authentication pipeline.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login).fallback(protected))
        .fallback(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
