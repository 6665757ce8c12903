//! Terminal password prompt

use vt_core::traits::PasswordPrompt;
use vt_core::types::PromptContext;

/// Reads a password from the controlling terminal without echo
///
/// An empty answer or a read error counts as cancellation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn prompt_password(&self, context: &PromptContext) -> Option<String> {
        let question = format!("Password for {}: ", context);
        match rpassword::prompt_password(question) {
            Ok(password) if !password.is_empty() => Some(password),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not read password: {}", e);
                None
            }
        }
    }
}
