//! Storage of uploaded complaint photos.
//!
//! Files are written under a single upload directory with a generated,
//! collision-free name. The stored name is what clients later request from
//! `/uploads/{file}`.

use fixdesk_core::Error;
use percent_encoding::percent_decode_str;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Errors that can occur during upload operations
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
	#[error("File too large: {0} bytes (max: {1} bytes)")]
	FileTooLarge(usize, usize),
	#[error("Invalid file type: {0}")]
	InvalidFileType(String),
	#[error("IO error: {0}")]
	Io(#[from] io::Error),
	#[error("Upload error: {0}")]
	Upload(String),
	#[error("Path traversal detected in filename")]
	PathTraversal,
}

impl From<UploadError> for Error {
	fn from(error: UploadError) -> Self {
		match error {
			UploadError::FileTooLarge(size, max) => Error::PayloadTooLarge(size, max),
			UploadError::InvalidFileType(ext) => {
				Error::Validation(format!("Unsupported image type: {}", ext))
			}
			UploadError::Io(e) if e.kind() == io::ErrorKind::NotFound => {
				Error::NotFound("File".to_string())
			}
			UploadError::Io(e) => Error::Io(e),
			UploadError::Upload(msg) => Error::Validation(msg),
			UploadError::PathTraversal => Error::Validation("Invalid filename".to_string()),
		}
	}
}

/// Image extensions accepted for complaint photos.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Reject filenames that could escape the upload directory.
///
/// Both the raw and the percent-decoded form are checked.
pub fn validate_safe_filename(filename: &str) -> Result<(), UploadError> {
	if filename.is_empty() {
		return Err(UploadError::Upload("Empty filename".to_string()));
	}

	let decoded = percent_decode_str(filename).decode_utf8_lossy();
	for candidate in [filename, decoded.as_ref()] {
		if candidate.contains('\0')
			|| candidate.contains("..")
			|| candidate.contains('/')
			|| candidate.contains('\\')
		{
			return Err(UploadError::PathTraversal);
		}
		if candidate.len() >= 2
			&& candidate.as_bytes()[0].is_ascii_alphabetic()
			&& candidate.as_bytes()[1] == b':'
		{
			return Err(UploadError::PathTraversal);
		}
	}
	Ok(())
}

/// Content type served for a stored file, derived from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
	match extension_of(filename).as_str() {
		"jpg" | "jpeg" => "image/jpeg",
		"png" => "image/png",
		"gif" => "image/gif",
		"webp" => "image/webp",
		_ => "application/octet-stream",
	}
}

fn extension_of(filename: &str) -> String {
	Path::new(filename)
		.extension()
		.and_then(|e| e.to_str())
		.unwrap_or("")
		.to_ascii_lowercase()
}

/// Writes and reads files in the upload directory.
#[derive(Debug, Clone)]
pub struct UploadHandler {
	upload_dir: PathBuf,
	max_size: usize,
	allowed_extensions: Option<Vec<String>>,
}

impl UploadHandler {
	/// # Examples
	///
	/// ```
	/// use fixdesk_http::UploadHandler;
	///
	/// let handler = UploadHandler::new("/tmp/uploads");
	/// assert_eq!(handler.max_size(), 10 * 1024 * 1024);
	/// ```
	pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
		Self {
			upload_dir: upload_dir.into(),
			max_size: 10 * 1024 * 1024,
			allowed_extensions: None,
		}
	}

	/// Handler restricted to [`IMAGE_EXTENSIONS`].
	pub fn images(upload_dir: impl Into<PathBuf>) -> Self {
		Self::new(upload_dir)
			.with_allowed_extensions(IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect())
	}

	pub fn with_max_size(mut self, max_size: usize) -> Self {
		self.max_size = max_size;
		self
	}

	pub fn with_allowed_extensions(mut self, extensions: Vec<String>) -> Self {
		self.allowed_extensions = Some(extensions);
		self
	}

	pub fn max_size(&self) -> usize {
		self.max_size
	}

	pub fn upload_dir(&self) -> &Path {
		&self.upload_dir
	}

	/// Store `content` and return the generated file name.
	pub fn handle_upload(&self, original_filename: &str, content: &[u8]) -> Result<String, UploadError> {
		if content.len() > self.max_size {
			return Err(UploadError::FileTooLarge(content.len(), self.max_size));
		}

		let extension = extension_of(original_filename);
		if let Some(allowed) = &self.allowed_extensions
			&& !allowed.iter().any(|ext| *ext == extension)
		{
			return Err(UploadError::InvalidFileType(extension));
		}

		fs::create_dir_all(&self.upload_dir)?;

		let stored = Self::generate_unique_filename(&extension);
		let mut file = fs::File::create(self.upload_dir.join(&stored))?;
		file.write_all(content)?;

		tracing::debug!(file = %stored, bytes = content.len(), "Stored upload");
		Ok(stored)
	}

	/// Read a previously stored file.
	pub fn read(&self, filename: &str) -> Result<Vec<u8>, UploadError> {
		validate_safe_filename(filename)?;
		Ok(fs::read(self.upload_dir.join(filename))?)
	}

	/// Remove a stored file; used to roll back when the complaint insert fails.
	pub fn delete_upload(&self, filename: &str) -> Result<(), UploadError> {
		validate_safe_filename(filename)?;
		fs::remove_file(self.upload_dir.join(filename))?;
		Ok(())
	}

	// Only the extension survives from the client's filename.
	fn generate_unique_filename(extension: &str) -> String {
		let millis = chrono::Utc::now().timestamp_millis();
		let unique_id = uuid::Uuid::new_v4().simple();
		if extension.is_empty() {
			format!("{}-{}", millis, unique_id)
		} else {
			format!("{}-{}.{}", millis, unique_id, extension)
		}
	}
}
