mod gemini;

pub use gemini::GeminiOracle;

use crate::error::UpstreamError;
use crate::shape::ResponseShape;
use async_trait::async_trait;
use std::sync::Arc;

/// A prompt-driven text generator.
///
/// Implementors own transport, authentication and vendor wire formats. When a
/// shape is given they should ask the backend for JSON conforming to it, but
/// callers never trust that: the executor validates whatever comes back.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate a completion for `prompt`. Returns the raw response text.
    async fn generate(
        &self,
        prompt: &str,
        shape: Option<&ResponseShape>,
    ) -> Result<String, UpstreamError>;

    /// Short name for logs, e.g. "gemini:gemini-2.5-flash".
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn generate(
        &self,
        prompt: &str,
        shape: Option<&ResponseShape>,
    ) -> Result<String, UpstreamError> {
        (**self).generate(prompt, shape).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
