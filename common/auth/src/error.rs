use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Startup failures. Any of these prevents the service from serving traffic.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown JWT algorithm '{0}'")]
    UnknownAlgorithm(String),
    #[error("{0} is not supported")]
    UnsupportedAlgorithm(String),
    #[error("no key family is defined for algorithm {0}")]
    UnsupportedKeyFamily(String),
    #[error("secret is not valid base64: {0}")]
    InvalidSecret(#[from] base64::DecodeError),
    #[error("secret must not be empty")]
    EmptySecret,
    #[error("failed to parse RSA key material: {0}")]
    InvalidKeyPair(String),
    #[error("failed to generate signing key: {0}")]
    KeyGeneration(String),
    #[error("configured key for {0} can only verify tokens")]
    VerifyOnlyKey(String),
    #[error("missing required setting '{0}'")]
    MissingSetting(&'static str),
    #[error("invalid value '{1}' for setting '{0}'")]
    InvalidSetting(&'static str, String),
}

/// Reasons a bearer token was not accepted.
///
/// Callers only ever see a bare 401; the variant exists for logs and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token algorithm '{0}' is not permitted")]
    AlgorithmRejected(String),
    #[error("token issuer does not match")]
    IssuerMismatch,
    #[error("token audience does not match")]
    AudienceMismatch,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Malformed(_) => "MALFORMED",
            AuthError::BadSignature => "BAD_SIGNATURE",
            AuthError::AlgorithmRejected(_) => "ALGORITHM_REJECTED",
            AuthError::IssuerMismatch => "ISSUER_MISMATCH",
            AuthError::AudienceMismatch => "AUDIENCE_MISMATCH",
            AuthError::Expired => "EXPIRED",
            AuthError::NotYetValid => "NOT_YET_VALID",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}

impl From<jsonwebtoken::errors::Error> for IssueError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(value.to_string())
    }
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_never_carry_a_body() {
        for err in [
            AuthError::Malformed("bad".into()),
            AuthError::BadSignature,
            AuthError::Expired,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(response.headers().get("content-type").is_none());
        }
    }

    #[test]
    fn kinds_are_stable_labels() {
        assert_eq!(AuthError::AlgorithmRejected("none".into()).kind(), "ALGORITHM_REJECTED");
        assert_eq!(AuthError::NotYetValid.kind(), "NOT_YET_VALID");
    }
}
