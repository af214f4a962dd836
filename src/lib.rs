//! # fixdesk
//!
//! A campus facility-complaint tracker served as a JSON API.
//!
//! Students and faculty file complaints (optionally with a photo), admins
//! assign technicians and read reports, technicians resolve their queue, and
//! submitters rate the outcome.
//!
//! ## Crates
//!
//! - [`core`]: error taxonomy and domain records
//! - [`conf`]: layered settings
//! - [`http`] / [`urls`] / [`server`]: request types, routing, hyper server
//! - [`db`]: the `Store` trait with in-memory and SQLite backends
//! - [`auth`]: password hashing, JWT sessions, role checks
//! - [`tracker`]: complaint lifecycle, feedback and reports
//! - [`views`]: the HTTP views and URL table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fixdesk::{AppContext, HttpServer, Settings, ShutdownCoordinator, build_app};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::load()?;
//! let addr = settings.bind_addr()?;
//! let ctx = Arc::new(AppContext::from_settings(settings).await?);
//!
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! coordinator.shutdown_on_signal();
//! HttpServer::new(build_app(ctx)?)
//!     .listen_with_shutdown(addr, coordinator)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;

pub use fixdesk_auth as auth;
pub use fixdesk_conf as conf;
pub use fixdesk_core as core;
pub use fixdesk_db as db;
pub use fixdesk_http as http;
pub use fixdesk_server as server;
pub use fixdesk_tracker as tracker;
pub use fixdesk_urls as urls;
pub use fixdesk_views as views;

// Re-export core types
pub use fixdesk_core::{
	Complaint, ComplaintStatus, Error, Feedback, PublicUser, Result, Role, User,
};

// Re-export settings
pub use fixdesk_conf::{Settings, SettingsError};

// Re-export HTTP plumbing
pub use fixdesk_http::{
	CorsMiddleware, Handler, Middleware, MiddlewareChain, Request, RequestLogMiddleware, Response,
};
pub use fixdesk_server::{HttpServer, ServerError, ShutdownCoordinator};

// Re-export services
pub use fixdesk_auth::{AuthService, Identity, SeedAccount};
pub use fixdesk_tracker::{ComplaintLifecycle, FeedbackRecorder, ReportAggregator};
pub use fixdesk_views::{AppContext, routes};

use std::sync::Arc;

/// The complete request handler: routes wrapped in request logging and CORS.
///
/// Request logging is outermost so it records the final status, including
/// errors that CORS has already turned into `{"msg"}` responses.
pub fn build_app(ctx: Arc<AppContext>) -> Result<Arc<dyn Handler>> {
	let router = routes(ctx)?;
	let chain = MiddlewareChain::new(Arc::new(router))
		.with_middleware(Arc::new(RequestLogMiddleware::new()))
		.with_middleware(Arc::new(CorsMiddleware::permissive()));
	Ok(Arc::new(chain))
}
