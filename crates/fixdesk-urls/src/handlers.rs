//! Adapters that turn plain async functions into [`Handler`]s.

use async_trait::async_trait;
use fixdesk_core::Result;
use fixdesk_http::{Handler, Request, Response};
use std::future::Future;

/// Function handler adapter
///
/// # Examples
///
/// ```
/// use fixdesk_http::{Handler, Request, Response};
/// use fixdesk_urls::FunctionHandler;
/// use std::sync::Arc;
///
/// let handler: Arc<dyn Handler> =
///     Arc::new(FunctionHandler::new(|_request: Request| async {
///         Ok::<_, fixdesk_core::Error>(Response::no_content())
///     }));
/// # let _ = handler;
/// ```
pub struct FunctionHandler<F> {
	pub func: F,
}

impl<F> FunctionHandler<F> {
	pub fn new(func: F) -> Self {
		Self { func }
	}
}

#[async_trait]
impl<F, Fut> Handler for FunctionHandler<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: Future<Output = Result<Response>> + Send,
{
	async fn handle(&self, request: Request) -> Result<Response> {
		(self.func)(request).await
	}
}
