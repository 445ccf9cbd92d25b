//! Model infrastructure module
//!
//! Streams completions from a language-model provider.
//!
//! # Structure
//! - `types` - request, message, event and error types
//! - `traits` - the `ModelProvider` trait
//! - `factory` - builds a provider from `[provider]` config
//! - `clients` - individual client implementations

pub mod clients;
pub mod factory;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::ProviderFactory;
pub use traits::{ModelProvider, ModelStream};
pub use types::{
    ContentBlock, ModelError, ModelEvent, ModelMessage, ModelRequest, ModelRole, StopReason,
    ToolSpec, Usage,
};
