//! ImageGate - Image Gateway for the Service-Request Tracker
//!
//! A small HTTP service that accepts base64-encoded images, writes them to an
//! object store under a fixed `public/` prefix and lists their public
//! addresses. It also validates service-request records before they reach
//! the data store.
//!
//! # Architecture
//!
//! Every request is independent: the ingress parses and guards the payload,
//! validates it into a closed action, runs the upload or list path against
//! the content store and wraps the outcome in a uniform envelope carrying
//! fixed CORS headers. The store is the only persistent collaborator.
//!
//! # Features
//!
//! - `POST /img` uploads, `GET /img?action=LIST` listings
//! - 1 MiB payload guard ahead of JSON parsing and base64 decoding
//! - File-name allow-list for storage keys
//! - S3 and in-memory content stores
//! - Runs as a standalone server or under the AWS Lambda runtime
//! - Service-request validation with derived defaults

pub mod api;
pub mod config;
pub mod error;
pub mod images;
pub mod service_request;
pub mod store;

pub use config::ImageGateConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{create_router, AppState, Envelope, HttpServer, ImageAction};
    pub use crate::config::ImageGateConfig;
    pub use crate::error::{Error, Result, StoreError};
    pub use crate::images::{FileName, ImageService};
    pub use crate::store::{ContentStore, MemoryStore, S3Store, SharedStore};
}
