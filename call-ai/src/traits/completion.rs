//! Text-completion provider trait.

use crate::types::completion::CompletionRequest;
use crate::Error;
use async_trait::async_trait;

/// Abstraction for synchronous request/response text-completion models.
///
/// Implementations resolve the request's `ModelTier` to a concrete model id,
/// so callers express cost policy ("retry on something cheaper") without
/// naming vendor models. The trait is the mocking seam for the behavior
/// engine and feedback aggregator tests.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Execute one completion request and return the raw response text.
    ///
    /// Implementations must not retry internally; retry and fallback policy
    /// belong to the caller, which knows what degraded output is acceptable.
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error>;

    /// Unique lowercase identifier for this provider (e.g. "openai").
    fn provider_id(&self) -> &str;
}
