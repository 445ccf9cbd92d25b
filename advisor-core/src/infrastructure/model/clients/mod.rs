//! Model clients

mod anthropic;
mod base;

pub use anthropic::{ANTHROPIC_VERSION, AnthropicClient, AnthropicStreamParser};
pub use base::HttpClientBase;
