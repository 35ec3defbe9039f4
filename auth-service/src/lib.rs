pub mod app;
pub mod config;
pub mod credentials;
pub mod greeting;
pub mod login;

pub use app::{build_app, AppState};
