//! Text-generation collaborator seam

pub mod backend_impl;
pub mod prompts;

use nutriscan_types::AiError;

/// Anything that turns a prompt into free text.
///
/// The returned text is untrusted: callers extract and validate any structure
/// they need from it.
pub trait AiBackend {
    fn send_prompt(&self, prompt: &str) -> Result<String, AiError>;

    fn name(&self) -> &str;
}
