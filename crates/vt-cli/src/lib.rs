//! vehicle-term: command-line front end
//!
//! Opens a session from a vehicle profile, runs one file or shell operation
//! on the selected side and disconnects.

pub mod commands;
pub mod output;
pub mod prompt;
