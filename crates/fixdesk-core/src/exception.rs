//! Exception taxonomy shared by every fixdesk crate.
//!
//! Each variant maps onto exactly one HTTP status code through
//! [`Error::status_code`], so handlers can bubble errors up with `?` and
//! let the server turn them into a JSON body.

use thiserror::Error;

/// Result alias used throughout fixdesk.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by services, stores and views.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
	/// Missing or malformed input fields
	#[error("{0}")]
	Validation(String),

	/// Unknown account or wrong password on login
	#[error("Invalid credentials")]
	InvalidCredentials,

	/// Uniqueness violation, e.g. an email that is already registered
	#[error("{0}")]
	Conflict(String),

	/// Missing, malformed or expired bearer token
	#[error("{0}")]
	Authentication(String),

	/// Authenticated identity lacks the required role or ownership
	#[error("{0}")]
	Authorization(String),

	/// Referenced record does not exist
	#[error("{0} not found")]
	NotFound(String),

	/// Route exists but not for this HTTP method
	#[error("Method {0} not allowed")]
	MethodNotAllowed(String),

	/// Request body exceeded the configured limit
	#[error("Payload too large: {0} bytes (max: {1} bytes)")]
	PayloadTooLarge(usize, usize),

	/// Storage backend failure
	#[error("Database error: {0}")]
	Database(String),

	/// JSON encoding or decoding failure on the server side
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// Filesystem failure
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// Anything else that should surface as a 500
	#[error("Internal error: {0}")]
	Internal(String),
}

impl Error {
	/// HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			Error::Validation(_) | Error::InvalidCredentials | Error::Conflict(_) => 400,
			Error::Authentication(_) => 401,
			Error::Authorization(_) => 403,
			Error::NotFound(_) => 404,
			Error::MethodNotAllowed(_) => 405,
			Error::PayloadTooLarge(_, _) => 413,
			Error::Database(_) | Error::Serialization(_) | Error::Io(_) | Error::Internal(_) => 500,
		}
	}

	/// Whether the error is a server-side fault rather than a client mistake.
	pub fn is_server_error(&self) -> bool {
		self.status_code() >= 500
	}

	/// Message that is safe to show to the client.
	///
	/// Server faults are reported generically; their details belong in logs.
	pub fn public_message(&self) -> String {
		if self.is_server_error() {
			"Server error".to_string()
		} else {
			self.to_string()
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(error: serde_json::Error) -> Self {
		Error::Serialization(error.to_string())
	}
}
