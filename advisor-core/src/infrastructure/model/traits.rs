//! Model traits

use super::types::{ModelError, ModelEvent, ModelRequest};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Incremental output of one model call. Ends after a
/// [`ModelEvent::Finish`] or the first error.
pub type ModelStream = BoxStream<'static, Result<ModelEvent, ModelError>>;

/// Trait for model provider implementations
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider id used in logs and error messages
    fn id(&self) -> &str;

    /// Start one streamed completion. Errors raised before the first event
    /// (bad credentials, HTTP status) are returned here rather than on the
    /// stream.
    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError>;
}
