//! HTTP API Module
//!
//! Provides the `/img` upload/list endpoint and service-request validation.

mod envelope;
mod error;
mod http;
mod request;

pub use envelope::{Envelope, CORS_HEADERS};
pub use error::{ApiError, GENERIC_FAILURE};
pub use http::{create_router, AppState, HttpServer};
pub use request::{
    decode_image, guard_payload, parse_body, ActionKind, ImageAction, RequestEnvelope,
    MAX_PAYLOAD_BYTES,
};
