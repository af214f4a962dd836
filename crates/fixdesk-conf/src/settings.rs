//! Typed application settings and the builder that merges sources into them.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FIXDESK_";

/// Environment variable naming an alternative settings file.
pub const SETTINGS_PATH_VAR: &str = "FIXDESK_SETTINGS";

/// Longest session lifetime accepted from configuration.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "fixdesk.toml";

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to load {source_name}: {error}")]
	Source {
		source_name: String,
		#[source]
		error: SourceError,
	},

	#[error("Invalid settings: {0}")]
	Invalid(String),
}

/// Runtime configuration of the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
	pub host: String,
	#[serde(deserialize_with = "from_str_or_native")]
	pub port: u16,
	pub jwt_secret: String,
	#[serde(deserialize_with = "from_str_or_native")]
	pub token_ttl_days: i64,
	pub database_url: String,
	pub upload_dir: PathBuf,
	#[serde(deserialize_with = "from_str_or_native")]
	pub max_upload_bytes: usize,
	pub log_filter: String,
	#[serde(deserialize_with = "from_str_or_native")]
	pub shutdown_grace_secs: u64,
}

impl Settings {
	/// Load settings from `.env`, the settings file and `FIXDESK_*` variables.
	pub fn load() -> Result<Self, SettingsError> {
		if let Err(e) = dotenvy::dotenv()
			&& !e.not_found()
		{
			tracing::warn!("Ignoring unreadable .env file: {}", e);
		}

		let path = std::env::var(SETTINGS_PATH_VAR)
			.map(PathBuf::from)
			.unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE));

		SettingsBuilder::new()
			.add_source(defaults())
			.add_source(TomlFileSource::new(path))
			.add_source(EnvSource::new(ENV_PREFIX))
			.build()
	}

	/// Settings suitable for tests: in-memory store, fixed secret.
	pub fn for_testing() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 5000,
			jwt_secret: "test-secret-key-for-fixdesk".to_string(),
			token_ttl_days: 7,
			database_url: "memory".to_string(),
			upload_dir: PathBuf::from("uploads"),
			max_upload_bytes: 10 * 1024 * 1024,
			log_filter: "debug".to_string(),
			shutdown_grace_secs: 1,
		}
	}

	/// Socket address the server binds to.
	pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
		format!("{}:{}", self.host, self.port)
			.parse()
			.map_err(|e| SettingsError::Invalid(format!("bind address: {}", e)))
	}

	fn validate(&self) -> Result<(), SettingsError> {
		if self.jwt_secret.trim().is_empty() {
			return Err(SettingsError::Invalid(
				"jwt_secret must be set (FIXDESK_JWT_SECRET)".to_string(),
			));
		}
		if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.token_ttl_days) {
			return Err(SettingsError::Invalid(format!(
				"token_ttl_days must be between 1 and {}",
				MAX_TOKEN_TTL_DAYS
			)));
		}
		if self.max_upload_bytes == 0 {
			return Err(SettingsError::Invalid(
				"max_upload_bytes must be positive".to_string(),
			));
		}
		Ok(())
	}
}

/// Built-in defaults; `jwt_secret` is deliberately empty.
pub fn defaults() -> DefaultSource {
	DefaultSource::new()
		.with_value("host", Value::from("127.0.0.1"))
		.with_value("port", Value::from(5000))
		.with_value("jwt_secret", Value::from(""))
		.with_value("token_ttl_days", Value::from(7))
		.with_value("database_url", Value::from("memory"))
		.with_value("upload_dir", Value::from("uploads"))
		.with_value("max_upload_bytes", Value::from(10 * 1024 * 1024))
		.with_value("log_filter", Value::from("info"))
		.with_value("shutdown_grace_secs", Value::from(30))
}

/// Merges [`ConfigSource`]s by priority and deserializes the result.
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge all sources into a flat map; higher priority wins.
	pub fn merge(mut self) -> Result<IndexMap<String, Value>, SettingsError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = IndexMap::new();
		for source in &self.sources {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			tracing::debug!("Loaded {} keys from {}", values.len(), source.description());
			merged.extend(values);
		}
		Ok(merged)
	}

	pub fn build(self) -> Result<Settings, SettingsError> {
		let merged = self.merge()?;
		let object: serde_json::Map<String, Value> = merged.into_iter().collect();
		let settings: Settings = serde_json::from_value(Value::Object(object))
			.map_err(|e| SettingsError::Invalid(e.to_string()))?;
		settings.validate()?;
		Ok(settings)
	}
}

/// Accept either a native JSON value or a string to parse, since environment
/// variables always arrive as strings.
fn from_str_or_native<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr + serde::de::DeserializeOwned,
	T::Err: Display,
{
	match Value::deserialize(deserializer)? {
		Value::String(s) => s.trim().parse().map_err(D::Error::custom),
		other => serde_json::from_value(other).map_err(D::Error::custom),
	}
}
