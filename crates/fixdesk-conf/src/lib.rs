//! # fixdesk settings
//!
//! Layered configuration. Priority order (highest to lowest):
//!
//! 1. Environment variables with the `FIXDESK_` prefix (after loading `.env`)
//! 2. The TOML settings file (`fixdesk.toml`, or the path in `FIXDESK_SETTINGS`)
//! 3. Built-in defaults
//!
//! ```rust,no_run
//! use fixdesk_conf::Settings;
//!
//! let settings = Settings::load().expect("invalid settings");
//! println!("listening on {}:{}", settings.host, settings.port);
//! ```

pub mod settings;
pub mod sources;

pub use settings::{Settings, SettingsBuilder, SettingsError, defaults};
pub use sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};
