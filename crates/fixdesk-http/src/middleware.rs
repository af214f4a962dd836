//! Request logging and CORS middleware.

use async_trait::async_trait;
use chrono::Utc;
use fixdesk_core::Result;
use hyper::Method;
use hyper::header::{self, HeaderValue};
use std::sync::Arc;

use crate::{Handler, Middleware, Request, Response};

/// Logs one line per request with method, path, status and latency.
#[derive(Default)]
pub struct RequestLogMiddleware;

impl RequestLogMiddleware {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for RequestLogMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let start = Utc::now();
		let method = request.method.clone();
		let path = request.path().to_string();

		let result = next.handle(request).await;
		let elapsed_ms = Utc::now().signed_duration_since(start).num_milliseconds();

		match &result {
			Ok(response) => tracing::info!(
				%method,
				%path,
				status = response.status.as_u16(),
				elapsed_ms,
				"request completed"
			),
			Err(err) => tracing::info!(
				%method,
				%path,
				status = err.status_code(),
				elapsed_ms,
				error = %err,
				"request failed"
			),
		}

		result
	}
}

/// Allowed origins, methods and headers for cross-origin requests.
#[derive(Debug, Clone)]
pub struct CorsConfig {
	pub allow_origins: Vec<String>,
	pub allow_methods: Vec<String>,
	pub allow_headers: Vec<String>,
	pub max_age: Option<u64>,
}

impl Default for CorsConfig {
	fn default() -> Self {
		Self {
			allow_origins: vec!["*".to_string()],
			allow_methods: ["GET", "POST", "PUT", "OPTIONS"]
				.iter()
				.map(|m| m.to_string())
				.collect(),
			allow_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
			max_age: Some(3600),
		}
	}
}

/// Answers preflight requests and stamps CORS headers on every response,
/// including error responses so browsers can read the `msg` body.
pub struct CorsMiddleware {
	config: CorsConfig,
}

impl CorsMiddleware {
	pub fn new(config: CorsConfig) -> Self {
		Self { config }
	}

	pub fn permissive() -> Self {
		Self::new(CorsConfig::default())
	}

	fn header_value(values: &[String]) -> HeaderValue {
		HeaderValue::from_str(&values.join(", ")).unwrap_or_else(|_| HeaderValue::from_static("*"))
	}
}

#[async_trait]
impl Middleware for CorsMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		if request.method == Method::OPTIONS {
			let mut response = Response::no_content();
			response.headers.insert(
				header::ACCESS_CONTROL_ALLOW_ORIGIN,
				Self::header_value(&self.config.allow_origins),
			);
			response.headers.insert(
				header::ACCESS_CONTROL_ALLOW_METHODS,
				Self::header_value(&self.config.allow_methods),
			);
			response.headers.insert(
				header::ACCESS_CONTROL_ALLOW_HEADERS,
				Self::header_value(&self.config.allow_headers),
			);
			if let Some(max_age) = self.config.max_age {
				response
					.headers
					.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
			}
			return Ok(response);
		}

		let mut response = next.handle(request).await.unwrap_or_else(Response::from);
		response.headers.insert(
			header::ACCESS_CONTROL_ALLOW_ORIGIN,
			Self::header_value(&self.config.allow_origins),
		);
		Ok(response)
	}
}
