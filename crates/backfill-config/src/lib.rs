pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, ImportConfig, TraktConfig};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
