//! vt-core: Core abstractions and configuration for vehicle-term
//!
//! This crate provides the shared types, connection traits, error types
//! and configuration structures used by the session manager and the CLI.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{ConfigError, ConnectionError, SessionError};
pub use types::{ConnectionType, Credentials, Endpoint, RemoteFileKind, Side};
