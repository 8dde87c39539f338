pub mod connection;
pub mod context;
pub mod handler;
pub mod http_result;
pub mod server;
pub mod synthetic_response;

pub use context::ProxyContext;
pub use handler::handle_request;
pub use http_result::HttpError;
pub use server::{run, serve, ServerLimits};
pub use synthetic_response::RespBody;
