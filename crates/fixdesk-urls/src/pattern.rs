use fixdesk_core::{Error, Result};
use std::collections::HashMap;

const MAX_PATTERN_LENGTH: usize = 1024;

/// A path pattern such as `/api/complaints/{id}/status`.
///
/// Each `{name}` placeholder matches exactly one non-empty path segment.
#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	regex: regex::Regex,
	param_names: Vec<String>,
}

impl PathPattern {
	/// # Examples
	///
	/// ```
	/// use fixdesk_urls::PathPattern;
	///
	/// let pattern = PathPattern::new("/api/complaints/user/{userId}").unwrap();
	/// let params = pattern.matches("/api/complaints/user/42").unwrap();
	/// assert_eq!(params["userId"], "42");
	/// ```
	pub fn new(pattern: &str) -> Result<Self> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(Error::Internal(format!(
				"Route pattern exceeds {} bytes",
				MAX_PATTERN_LENGTH
			)));
		}

		let (regex_str, param_names) = Self::compile(pattern)?;
		let regex = regex::Regex::new(&regex_str)
			.map_err(|e| Error::Internal(format!("Invalid route pattern {}: {}", pattern, e)))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			param_names,
		})
	}

	fn compile(pattern: &str) -> Result<(String, Vec<String>)> {
		let mut regex_str = String::from("^");
		let mut param_names = Vec::new();
		let mut chars = pattern.chars();

		while let Some(c) = chars.next() {
			if c == '{' {
				let name: String = chars.by_ref().take_while(|&n| n != '}').collect();
				if name.is_empty() || !name.chars().all(|n| n.is_ascii_alphanumeric() || n == '_') {
					return Err(Error::Internal(format!(
						"Invalid parameter name in route pattern {}",
						pattern
					)));
				}
				regex_str.push_str(&format!("(?P<{}>[^/]+)", name));
				param_names.push(name);
			} else {
				regex_str.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
			}
		}

		regex_str.push('$');
		Ok((regex_str, param_names))
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Match a request path, returning the captured parameters.
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		self.regex.captures(path).map(|caps| {
			self.param_names
				.iter()
				.filter_map(|name| caps.name(name).map(|m| (name.clone(), m.as_str().to_string())))
				.collect()
		})
	}
}
