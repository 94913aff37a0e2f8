//! # NeuroDesk Client
//!
//! Concrete collaborators for the dashboard controller:
//! - [`ReviewApi`]: HTTP implementation of the forms and messaging directories
//! - [`FileSessionStore`]: JSON file standing in for the device key-value store
//!
//! Both classify their own failures into the core's typed errors, so the controller never
//! inspects error text.

#![warn(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod session_file;

pub use api::ReviewApi;
pub use config::ClientConfig;
pub use session_file::FileSessionStore;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
