use std::fmt;

use async_trait::async_trait;

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "one-jwt-token-please";

/// A username and password presented at login. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: &Credential) -> bool;
}

/// Accepts exactly one username/password pair.
#[derive(Clone)]
pub struct StaticCredentialVerifier {
    username: String,
    password: String,
}

impl StaticCredentialVerifier {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for StaticCredentialVerifier {
    fn default() -> Self {
        Self::new(DEMO_USERNAME, DEMO_PASSWORD)
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, credential: &Credential) -> bool {
        credential.username == self.username && credential.password == self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_verifier_accepts_only_the_demo_pair() {
        let verifier = StaticCredentialVerifier::default();
        assert!(verifier.verify(&Credential::new("admin", DEMO_PASSWORD)).await);
        assert!(!verifier.verify(&Credential::new("admin", "wrong")).await);
        assert!(!verifier.verify(&Credential::new("Admin", DEMO_PASSWORD)).await);
        assert!(!verifier.verify(&Credential::new("", "")).await);
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", Credential::new("admin", DEMO_PASSWORD));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains(DEMO_PASSWORD));
    }
}
