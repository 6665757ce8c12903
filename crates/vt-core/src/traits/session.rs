//! Session traits

use async_trait::async_trait;

use crate::error::SessionError;
use crate::types::PromptContext;

/// Interactive password source used when the default password is rejected
///
/// Implementations block until the user answers. Returning `None` means the
/// user dismissed the prompt.
pub trait PasswordPrompt: Send + Sync {
    fn prompt_password(&self, context: &PromptContext) -> Option<String>;
}

/// Something that can run shell commands on the selected side and apply
/// the stderr policy, returning stdout on success
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<String, SessionError>;
}

