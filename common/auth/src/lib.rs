pub mod algorithm;
pub mod allowlist;
pub mod claims;
pub mod config;
pub mod error;
pub mod gates;
pub mod issuer;
pub mod keys;
pub mod pipeline;
pub mod settings;
pub mod validator;

pub use algorithm::{KeyFamily, DEFAULT_ALGORITHM, SUPPORTED_ALGORITHMS};
pub use allowlist::{AlgorithmAllowlist, CryptoProvider, JsonWebTokenProvider};
pub use claims::Identity;
pub use config::JwtConfig;
pub use error::{AuthError, AuthResult, ConfigError, IssueError};
pub use gates::{AccessGate, AuthenticationGate};
pub use issuer::{Token, TokenIssuer};
pub use keys::{KeyMaterial, SigningKey};
pub use pipeline::{Endpoint, Next, Pipeline, RequestContext, Stage};
pub use settings::JwtSettings;
pub use validator::TokenValidator;
