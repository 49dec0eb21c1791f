pub mod gemini;
pub mod local;
pub mod sse;

use crate::errors::ProviderError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

/// A lazy, finite, non-restartable sequence of text fragments from a model.
///
/// Fragments without a text payload are filtered out by the adapters, so every
/// `Ok` item carries a non-empty string.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// A trait for interacting with an AI provider.
///
/// Implementations wrap one hosted (or local) model API. The client is built
/// once at startup and shared across requests, so implementations hold no
/// per-request state.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a complete response for `prompt` in a single call.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<String, ProviderError>;

    /// Starts a streaming generation and returns its fragments as they arrive.
    ///
    /// Errors that happen before the first byte (transport failures, non-2xx
    /// statuses) are returned directly; later failures surface as an `Err`
    /// item after which the stream ends.
    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        use_search: bool,
    ) -> Result<TextStream, ProviderError>;
}

dyn_clone::clone_trait_object!(AiProvider);
