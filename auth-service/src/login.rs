use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common_auth::{Identity, IssueError, TokenIssuer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::credentials::{Credential, CredentialVerifier};

const USERNAME_FIELD: &str = "username";
const PASSWORD_FIELD: &str = "password";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("unsupported content type")]
    UnsupportedContentType,
    #[error("request body could not be parsed")]
    InvalidBody,
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
}

impl CredentialError {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialError::UnsupportedContentType => "UNSUPPORTED_CONTENT_TYPE",
            CredentialError::InvalidBody => "INVALID_BODY",
            CredentialError::MissingField(_) => "MISSING_FIELD",
            CredentialError::InvalidCredentials => "INVALID_CREDENTIALS",
        }
    }
}

impl IntoResponse for CredentialError {
    fn into_response(self) -> Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        match self {
            LoginError::Credential(err) => err.into_response(),
            LoginError::Issue(err) => err.into_response(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let media_type = value.split(';').next()?.trim();

    if media_type.eq_ignore_ascii_case("application/json") {
        Some(BodyKind::Json)
    } else if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        Some(BodyKind::Form)
    } else {
        None
    }
}

#[async_trait]
impl<S> FromRequest<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = CredentialError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        read_credential(req, state).await.map_err(|err| {
            info!(kind = err.kind(), reason = %err, "login rejected");
            err
        })
    }
}

async fn read_credential<S>(req: Request, state: &S) -> Result<Credential, CredentialError>
where
    S: Send + Sync,
{
    let kind = body_kind(req.headers()).ok_or(CredentialError::UnsupportedContentType)?;
    let body = Bytes::from_request(req, state)
        .await
        .map_err(|_| CredentialError::InvalidBody)?;

    match kind {
        BodyKind::Json => credential_from_json(&body),
        BodyKind::Form => {
            let fields: Vec<(String, String)> =
                serde_urlencoded::from_bytes(&body).map_err(|_| CredentialError::InvalidBody)?;
            credential_from_fields(fields)
        }
    }
}

fn credential_from_json(body: &[u8]) -> Result<Credential, CredentialError> {
    let object: Map<String, Value> =
        serde_json::from_slice(body).map_err(|_| CredentialError::InvalidBody)?;

    let field = |name: &'static str| -> Result<String, CredentialError> {
        let value = object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
            .ok_or(CredentialError::MissingField(name))?;
        match value {
            Value::String(text) => Ok(text.clone()),
            Value::Null => Err(CredentialError::MissingField(name)),
            _ => Err(CredentialError::InvalidBody),
        }
    };

    Ok(Credential::new(field(USERNAME_FIELD)?, field(PASSWORD_FIELD)?))
}

fn credential_from_fields(fields: Vec<(String, String)>) -> Result<Credential, CredentialError> {
    let mut username = None;
    let mut password = None;
    for (name, value) in fields {
        if name.eq_ignore_ascii_case(USERNAME_FIELD) {
            username.get_or_insert(value);
        } else if name.eq_ignore_ascii_case(PASSWORD_FIELD) {
            password.get_or_insert(value);
        }
    }

    Ok(Credential::new(
        username.ok_or(CredentialError::MissingField(USERNAME_FIELD))?,
        password.ok_or(CredentialError::MissingField(PASSWORD_FIELD))?,
    ))
}

/// `POST /login`: exchanges a username and password for a signed token.
pub async fn login(
    State(issuer): State<Arc<TokenIssuer>>,
    State(verifier): State<Arc<dyn CredentialVerifier>>,
    credential: Credential,
) -> Result<Response, LoginError> {
    if !verifier.verify(&credential).await {
        let err = CredentialError::InvalidCredentials;
        info!(kind = err.kind(), username = %credential.username, "login rejected");
        return Err(err.into());
    }

    let token = issuer
        .issue(&Identity::new(credential.username.as_str()))
        .map_err(|err| {
            warn!(error = %err, "failed to sign token");
            err
        })?;

    info!(username = %credential.username, "issued token");
    Ok(([(CONTENT_TYPE, "text/plain")], token.into_string()).into_response())
}
