pub mod mock;
pub mod model;
pub mod server;
