//! # fixdesk server
//!
//! A small hyper 1.x HTTP/1.1 server. Every connection runs on its own tokio
//! task; request bodies are buffered (up to a limit) before the handler runs,
//! and handler errors are rendered as `{"msg": ...}` JSON responses.
//!
//! ```rust,no_run
//! use fixdesk_server::{HttpServer, ShutdownCoordinator};
//! # use fixdesk_http::{Handler, Request, Response};
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # struct App;
//! # #[async_trait::async_trait]
//! # impl Handler for App {
//! #     async fn handle(&self, _r: Request) -> fixdesk_core::Result<Response> { Ok(Response::ok()) }
//! # }
//! # async fn run() -> Result<(), fixdesk_server::ServerError> {
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! coordinator.shutdown_on_signal();
//!
//! HttpServer::new(Arc::new(App))
//!     .listen_with_shutdown("127.0.0.1:5000".parse().unwrap(), coordinator)
//!     .await
//! # }
//! ```

pub mod http;
pub mod shutdown;

pub use http::{DEFAULT_MAX_BODY_BYTES, HttpServer, ServerError};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
