//! CLI command implementations

mod config;
mod exec;
mod files;
mod list;
mod session;

pub use config::{config_edit, config_init, config_path, config_show};
pub use exec::{diagnose_command, exec_command};
pub use files::{check_command, edit_command, mount_command, read_command, write_command};
pub use list::list_command;
pub use session::{load_settings, open_session, resolve_profile, ConfigPaths, TargetArgs};
