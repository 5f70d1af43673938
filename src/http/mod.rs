//! HTTP facade.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, body limit)
//!     → track_request (timeout, metrics)
//!     → handlers.rs (parse input, call Relay)
//!     → response.rs (JSON error bodies with status mapping)
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::ApiError;
pub use server::{AppState, HttpServer, X_REQUEST_ID};
