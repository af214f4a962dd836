use bytes::Bytes;
use fixdesk_core::{Error, Result};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP Response representation
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use fixdesk_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid header names or values are silently dropped.
	///
	/// # Examples
	///
	/// ```
	/// use fixdesk_http::Response;
	///
	/// let response = Response::ok().with_header("Cache-Control", "no-store");
	/// assert_eq!(
	///     response.headers.get("cache-control").unwrap().to_str().unwrap(),
	///     "no-store"
	/// );
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			hyper::header::HeaderName::from_bytes(name.as_bytes()),
			hyper::header::HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Set the response body to JSON and add the Content-Type header
	///
	/// # Examples
	///
	/// ```
	/// use fixdesk_http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({"msg": "ok"})).unwrap();
	///
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "application/json"
	/// );
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers.insert(
			hyper::header::CONTENT_TYPE,
			hyper::header::HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}

	/// Shorthand for a 200 JSON response.
	pub fn json<T: Serialize>(data: &T) -> Result<Self> {
		Self::ok().with_json(data)
	}

	/// Shorthand for a `{"msg": ...}` body with the given status.
	pub fn message(status: StatusCode, msg: impl Into<String>) -> Self {
		let body = serde_json::json!({ "msg": msg.into() });
		Self::new(status)
			.with_json(&body)
			.unwrap_or_else(|_| Response::internal_server_error())
	}

	/// Parse the body back into JSON (mostly useful in tests).
	pub fn json_body(&self) -> Result<serde_json::Value> {
		Ok(serde_json::from_slice(&self.body)?)
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		if error.is_server_error() {
			tracing::error!(error = %error, "Request failed with server error");
		} else {
			tracing::debug!(error = %error, status = status.as_u16(), "Request rejected");
		}

		Response::message(status, error.public_message())
	}
}
