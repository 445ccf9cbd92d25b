//! Conversation stream adapter: runs the model/tool loop of a ready session
//! and exposes it as a stream of UI message events.

mod adapter;
mod errors;
mod events;
mod runner;


pub use adapter::{AdaptedHistory, to_model_messages};
pub use errors::{StreamError, ToolError};
pub use events::{FinishReason, StreamEvent};
pub use runner::stream;
