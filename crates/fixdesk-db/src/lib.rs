//! # fixdesk storage
//!
//! The [`Store`] trait and its two backends: [`MemoryStore`] for tests and
//! throwaway instances, and [`SqliteStore`] for persistent deployments.
//!
//! ```rust
//! # async fn example() -> fixdesk_core::Result<()> {
//! let store = fixdesk_db::open_store("memory").await?;
//! assert!(store.find_user_by_email("nobody@campus.edu").await?.is_none());
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{ComplaintFilter, StatusChange, Store};

use fixdesk_core::{Error, Result};
use std::sync::Arc;

/// Open the store named by a `database_url` setting.
///
/// `memory` selects [`MemoryStore`]; any `sqlite:` URL selects [`SqliteStore`].
pub async fn open_store(database_url: &str) -> Result<Arc<dyn Store>> {
	if database_url == "memory" {
		tracing::info!("Using in-memory store");
		return Ok(Arc::new(MemoryStore::new()));
	}
	if database_url.starts_with("sqlite:") {
		return Ok(Arc::new(SqliteStore::connect(database_url).await?));
	}
	Err(Error::Internal(format!(
		"Unsupported database_url: {}",
		database_url
	)))
}
