//! # fixdesk HTTP primitives
//!
//! Buffered [`Request`] and [`Response`] types, the [`Handler`] and
//! [`Middleware`] traits every view and middleware implements, and helpers
//! for multipart bodies and uploaded files.

pub mod handler;
pub mod middleware;
pub mod multipart;
pub mod request;
pub mod response;
pub mod upload;

pub use handler::{Handler, Middleware, MiddlewareChain};
pub use middleware::{CorsConfig, CorsMiddleware, RequestLogMiddleware};
pub use multipart::{FilePart, FormData};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use upload::{UploadError, UploadHandler, content_type_for, validate_safe_filename};

pub use fixdesk_core::{Error, Result};
