use async_trait::async_trait;
use fixdesk_core::{Error, Result};
use fixdesk_http::{Handler, Request, Response};
use hyper::Method;
use std::sync::Arc;

use crate::PathPattern;
use crate::handlers::FunctionHandler;

/// A single method + path binding.
#[derive(Clone)]
pub struct Route {
	pub method: Method,
	pub pattern: PathPattern,
	pub name: Option<String>,
	handler: Arc<dyn Handler>,
}

impl Route {
	pub fn new(method: Method, path: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		Ok(Self {
			method,
			pattern: PathPattern::new(path)?,
			name: None,
			handler,
		})
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn handler_arc(&self) -> Arc<dyn Handler> {
		Arc::clone(&self.handler)
	}
}

/// Dispatches requests to the first route whose pattern and method match.
///
/// A path that matches some route under a different method yields
/// `MethodNotAllowed`; a path that matches nothing yields `NotFound`.
#[derive(Default, Clone)]
pub struct Router {
	routes: Vec<Route>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_route(&mut self, route: Route) {
		tracing::debug!(method = %route.method, path = route.pattern.pattern(), "Registered route");
		self.routes.push(route);
	}

	/// Bind `handler` to `method` and `path`.
	///
	/// # Examples
	///
	/// ```
	/// use fixdesk_urls::Router;
	/// use fixdesk_http::{Handler, Request, Response};
	/// use hyper::Method;
	/// use std::sync::Arc;
	///
	/// struct Health;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for Health {
	///     async fn handle(&self, _request: Request) -> fixdesk_core::Result<Response> {
	///         Ok(Response::ok())
	///     }
	/// }
	///
	/// let router = Router::new()
	///     .route(Method::GET, "/health", Arc::new(Health))
	///     .unwrap();
	/// assert_eq!(router.routes().len(), 1);
	/// ```
	pub fn route(mut self, method: Method, path: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		self.add_route(Route::new(method, path, handler)?);
		Ok(self)
	}

	pub fn get(self, path: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		self.route(Method::GET, path, handler)
	}

	pub fn post(self, path: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		self.route(Method::POST, path, handler)
	}

	pub fn put(self, path: &str, handler: Arc<dyn Handler>) -> Result<Self> {
		self.route(Method::PUT, path, handler)
	}

	/// Bind an async function instead of a [`Handler`] value.
	pub fn function<F, Fut>(self, method: Method, path: &str, func: F) -> Result<Self>
	where
		F: Fn(Request) -> Fut + Send + Sync + 'static,
		Fut: std::future::Future<Output = Result<Response>> + Send + 'static,
	{
		self.route(method, path, Arc::new(FunctionHandler::new(func)))
	}

	pub fn routes(&self) -> &[Route] {
		&self.routes
	}

	fn normalize(path: &str) -> &str {
		if path.len() > 1 {
			path.trim_end_matches('/')
		} else {
			path
		}
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let path = Self::normalize(request.path()).to_string();
		let mut path_matched = false;

		for route in &self.routes {
			let Some(params) = route.pattern.matches(&path) else {
				continue;
			};
			if route.method != request.method {
				path_matched = true;
				continue;
			}

			for (key, value) in params {
				request.set_path_param(key, value);
			}
			return route.handler.handle(request).await;
		}

		if path_matched {
			Err(Error::MethodNotAllowed(request.method.to_string()))
		} else {
			Err(Error::NotFound("Route".to_string()))
		}
	}
}
