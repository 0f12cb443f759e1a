//! Configuration module
//!
//! Settings for the backend connection, the editor and logging, stored as
//! TOML in the user's config directory.

pub mod config;

pub use config::{ApiConfig, Config, EditorConfig, LoggingConfig};
