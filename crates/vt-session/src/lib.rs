//! vt-session: Vehicle SSH sessions and remote file transfer
//!
//! [`SessionManager`] owns the jump-host ("vehicle") connection and the
//! single live side connection. [`RemoteFiles`] reads and writes the JSON
//! parameter files on the selected side using nothing but shell commands.

pub mod banner;
pub mod login;
pub mod manager;
pub mod ssh;
pub mod transfer;

pub use login::{parse_login, LoginTarget};
pub use manager::{Diagnostics, SessionManager};
pub use ssh::{SshConnector, SshShell};
pub use transfer::{validate_json, FileLocation, FileStatus, RemoteFiles, SizeCheck, WriteReport};
