//! Login string parsing
//!
//! Jump hosts are described by free-form strings copied from shell history,
//! so several shapes are accepted:
//!
//! - `user@relay@host` (two or more `@`): split at the last `@`, the
//!   username keeps every earlier `@`
//! - `user@host`
//! - `host`: the configured default username is used
//!
//! A leading `ssh ` is ignored.

use vt_core::SessionError;

/// Minimum accepted host length
const MIN_HOST_LEN: usize = 3;

/// Host and username extracted from a login string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTarget {
    pub host: String,
    pub username: String,
}

/// Parse a login string into host and username
pub fn parse_login(login: &str, default_username: &str) -> Result<LoginTarget, SessionError> {
    let trimmed = login.trim();
    let command = trimmed
        .strip_prefix("ssh ")
        .map(str::trim)
        .unwrap_or(trimmed);

    let (username, host) = match command.matches('@').count() {
        0 => (default_username, command),
        1 => command.split_once('@').unwrap_or((default_username, command)),
        _ => command.rsplit_once('@').unwrap_or((default_username, command)),
    };

    if host.chars().count() < MIN_HOST_LEN {
        return Err(SessionError::InvalidCommand(format!(
            "host '{}' in '{}' is too short",
            host, login
        )));
    }

    tracing::debug!("Parsed login string: username={}, host={}", username, host);

    Ok(LoginTarget {
        host: host.to_string(),
        username: username.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_host_syntax_splits_at_last_at() {
        let target = parse_login("ifly@ifly.bestunee54100155@172.30.32.222", "x").unwrap();
        assert_eq!(target.username, "ifly@ifly.bestunee54100155");
        assert_eq!(target.host, "172.30.32.222");

        let target = parse_login("a@b@c@host.example", "x").unwrap();
        assert_eq!(target.username, "a@b@c");
        assert_eq!(target.host, "host.example");
    }

    #[test]
    fn test_user_at_host() {
        let target = parse_login("root@192.168.1.6", "ifly").unwrap();
        assert_eq!(target.username, "root");
        assert_eq!(target.host, "192.168.1.6");
    }

    #[test]
    fn test_bare_host_uses_default_username() {
        let target = parse_login("jump.example.com", "ifly").unwrap();
        assert_eq!(target.username, "ifly");
        assert_eq!(target.host, "jump.example.com");
    }

    #[test]
    fn test_ssh_prefix_is_ignored() {
        let target = parse_login("ssh  root@10.0.0.1", "ifly").unwrap();
        assert_eq!(target.username, "root");
        assert_eq!(target.host, "10.0.0.1");
    }

    #[test]
    fn test_short_or_empty_host_is_rejected() {
        for login in ["", "ab", "root@", "root@ab", "a@b@xy", "ssh  ab"] {
            let err = parse_login(login, "ifly").unwrap_err();
            assert!(
                matches!(err, SessionError::InvalidCommand(_)),
                "expected InvalidCommand for {:?}",
                login
            );
        }
    }

    #[test]
    fn test_three_character_host_is_accepted() {
        let target = parse_login("abc", "ifly").unwrap();
        assert_eq!(target.host, "abc");
    }
}
