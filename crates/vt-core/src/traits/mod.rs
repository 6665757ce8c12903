//! Core trait definitions

mod connection;
mod session;

pub use connection::{Connector, RemoteShell};
pub use session::{CommandExecutor, PasswordPrompt};
