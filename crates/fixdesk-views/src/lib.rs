//! # fixdesk views
//!
//! HTTP views over the fixdesk services and the [`routes`] table that binds
//! them to paths. Views authenticate the caller from the bearer token and
//! leave role and ownership checks to the services.
//!
//! ```rust,no_run
//! # async fn example() -> fixdesk_core::Result<()> {
//! use fixdesk_views::{AppContext, routes};
//! use std::sync::Arc;
//!
//! let ctx = AppContext::from_settings(fixdesk_conf::Settings::for_testing()).await?;
//! let router = routes(Arc::new(ctx))?;
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod complaints;
pub mod context;
pub mod feedback;
pub mod files;
pub mod reports;
pub mod urls;

pub use context::AppContext;
pub use urls::routes;
