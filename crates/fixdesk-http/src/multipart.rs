//! `multipart/form-data` parsing on top of multer.

use bytes::Bytes;
use fixdesk_core::{Error, Result};
use futures_util::stream::once;
use std::collections::HashMap;
use std::future::ready;

use crate::Request;

/// A file part of a multipart body, held in memory.
#[derive(Debug, Clone)]
pub struct FilePart {
	pub field_name: String,
	pub filename: String,
	pub content_type: Option<String>,
	pub data: Bytes,
}

/// Text fields and files extracted from a multipart body.
#[derive(Debug, Default)]
pub struct FormData {
	fields: HashMap<String, String>,
	files: Vec<FilePart>,
}

impl FormData {
	/// Parse the body of a `multipart/form-data` request.
	///
	/// The whole body is checked against `max_bytes` before parsing. File parts
	/// with an empty filename (a file input left blank) are skipped.
	pub async fn parse(request: &Request, max_bytes: usize) -> Result<Self> {
		let content_type = request
			.headers
			.get(hyper::header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.ok_or_else(|| Error::Validation("Missing Content-Type header".to_string()))?;

		let boundary = multer::parse_boundary(content_type)
			.map_err(|e| Error::Validation(format!("Failed to parse boundary: {}", e)))?;

		if request.body.len() > max_bytes {
			return Err(Error::PayloadTooLarge(request.body.len(), max_bytes));
		}

		let stream = once(ready(Ok::<_, std::io::Error>(request.body.clone())));
		let mut multipart = multer::Multipart::new(stream, boundary);

		let mut form = FormData::default();
		while let Some(field) = multipart
			.next_field()
			.await
			.map_err(|e| Error::Validation(format!("Failed to read multipart field: {}", e)))?
		{
			let name = field
				.name()
				.ok_or_else(|| Error::Validation("Field name missing".to_string()))?
				.to_string();

			match field.file_name().map(str::to_string) {
				Some(filename) => {
					let content_type = field.content_type().map(|m| m.to_string());
					let data = field.bytes().await.map_err(|e| {
						Error::Validation(format!("Failed to read file field: {}", e))
					})?;
					if filename.is_empty() {
						continue;
					}
					form.files.push(FilePart {
						field_name: name,
						filename,
						content_type,
						data,
					});
				}
				None => {
					let text = field.text().await.map_err(|e| {
						Error::Validation(format!("Failed to read text field: {}", e))
					})?;
					form.fields.insert(name, text);
				}
			}
		}

		Ok(form)
	}

	pub fn field(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}

	pub fn file(&self, field_name: &str) -> Option<&FilePart> {
		self.files.iter().find(|f| f.field_name == field_name)
	}
}
