//! HTTP surface: the streaming chat endpoint, the tool inventory, static
//! downloads and a health probe, with OpenAPI docs under `/swagger-ui`.

mod docs;
mod dto;
mod error;
mod router;
mod routes;
mod state;

pub use dto::{ChatRequestBody, ErrorResponse, HealthResponse, ToolInventoryResponse, ToolSummary};
pub use error::{ApiError, ServerError};
pub use router::{router, serve, serve_listener};
pub use state::ServerState;
