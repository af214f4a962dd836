//! Method and path routing.
//!
//! A [`Router`] is itself a [`fixdesk_http::Handler`], so it can be wrapped
//! in a middleware chain and handed to the server.

pub mod handlers;
pub mod pattern;
pub mod router;

pub use handlers::FunctionHandler;
pub use pattern::PathPattern;
pub use router::{Route, Router};
