use bytes::Bytes;
use fixdesk_core::{Error, Result};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{HeaderMap, Method, Uri, Version};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;

/// HTTP Request representation
///
/// The body is fully buffered by the server before the request reaches a
/// handler. Path parameters are filled in by the router.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub path_params: HashMap<String, String>,
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			path_params: HashMap::new(),
			remote_addr: None,
		}
	}

	/// # Examples
	///
	/// ```
	/// use fixdesk_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/api/complaints")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/api/complaints");
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Set a path parameter (used by the router for `{name}` segments)
	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	/// Get a URL-decoded path parameter, failing with a validation error if absent.
	pub fn path_param(&self, name: &str) -> Result<String> {
		self.path_params
			.get(name)
			.map(|raw| percent_decode_str(raw).decode_utf8_lossy().into_owned())
			.ok_or_else(|| Error::Validation(format!("Missing path parameter: {}", name)))
	}

	/// Media type of the body without parameters, lowercased.
	pub fn content_type(&self) -> Option<String> {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.map(|v| {
				v.split(';')
					.next()
					.unwrap_or_default()
					.trim()
					.to_ascii_lowercase()
			})
	}

	pub fn is_multipart(&self) -> bool {
		self.content_type().as_deref() == Some("multipart/form-data")
	}

	/// Token from an `Authorization: Bearer <token>` header.
	///
	/// # Examples
	///
	/// ```
	/// use fixdesk_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/")
	///     .header("authorization", "Bearer abc.def.ghi")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.bearer_token(), Some("abc.def.ghi"));
	/// ```
	pub fn bearer_token(&self) -> Option<&str> {
		self.headers
			.get(AUTHORIZATION)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.strip_prefix("Bearer "))
			.map(str::trim)
			.filter(|token| !token.is_empty())
	}

	/// Deserialize the body as JSON.
	///
	/// Malformed bodies are the client's fault, so they surface as validation errors.
	pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
		if self.body.is_empty() {
			return Err(Error::Validation("Request body is empty".to_string()));
		}
		serde_json::from_slice(&self.body)
			.map_err(|e| Error::Validation(format!("Malformed JSON body: {}", e)))
	}
}

/// Builder for [`Request`], mainly for tests and the server adapter.
#[derive(Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Add a single header; invalid names or values are ignored.
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			hyper::header::HeaderName::from_bytes(name.as_bytes()),
			hyper::header::HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Serialize `value` as the JSON body and set the content type.
	pub fn json<T: serde::Serialize>(self, value: &T) -> Self {
		let body = serde_json::to_vec(value).unwrap_or_default();
		self.header("content-type", "application/json").body(body)
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	pub fn build(self) -> Result<Request> {
		let uri: Uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse()
			.map_err(|e| Error::Validation(format!("Invalid URI: {}", e)))?;

		let mut request = Request::new(self.method, uri, self.version, self.headers, self.body);
		request.remote_addr = self.remote_addr;
		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;

	#[derive(Debug, Deserialize)]
	struct Payload {
		rating: u8,
	}

	#[rstest]
	#[case("Bearer token123", Some("token123"))]
	#[case("Bearer ", None)]
	#[case("Basic dXNlcjpwYXNz", None)]
	fn test_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
		let request = Request::builder()
			.uri("/")
			.header("authorization", header)
			.build()
			.unwrap();

		assert_eq!(request.bearer_token(), expected);
	}

	#[rstest]
	fn test_json_body() {
		let request = Request::builder()
			.method(Method::POST)
			.uri("/api/feedback")
			.body(r#"{"rating": 4}"#)
			.build()
			.unwrap();

		let payload: Payload = request.json().unwrap();
		assert_eq!(payload.rating, 4);
	}

	#[rstest]
	fn test_malformed_json_is_validation_error() {
		let request = Request::builder().body("{rating").build().unwrap();

		let result: Result<Payload> = request.json();
		assert!(matches!(result, Err(Error::Validation(_))));
	}

	#[rstest]
	fn test_path_param_is_decoded() {
		let mut request = Request::builder().uri("/uploads/a%20b.png").build().unwrap();
		request.set_path_param("file", "a%20b.png");

		assert_eq!(request.path_param("file").unwrap(), "a b.png");
		assert!(request.path_param("missing").is_err());
	}

	#[rstest]
	fn test_content_type_strips_parameters() {
		let request = Request::builder()
			.header("content-type", "multipart/form-data; boundary=X")
			.build()
			.unwrap();

		assert!(request.is_multipart());
	}
}
