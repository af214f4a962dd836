//! # fixdesk auth
//!
//! Password hashing, JWT session tokens and role checks.
//!
//! ## Modules
//!
//! - [`hasher`]: the [`PasswordHasher`] seam and its Argon2id implementation
//! - [`jwt`]: signing and verifying session tokens
//! - [`identity`]: the per-request caller and [`authorize`]
//! - [`requests`]: register/login payloads
//! - [`service`]: [`AuthService`], tying the above to a store
//!
//! ## Example
//!
//! ```
//! use fixdesk_auth::{Argon2Hasher, AuthService, JwtAuth};
//! use fixdesk_db::MemoryStore;
//! use std::sync::Arc;
//!
//! let auth = AuthService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(Argon2Hasher::new()),
//!     JwtAuth::new(b"change-me", chrono::Duration::days(7)),
//! );
//! assert!(auth.authenticate_token(None).is_err());
//! ```

pub mod hasher;
pub mod identity;
pub mod jwt;
pub mod requests;
pub mod service;

pub use hasher::{Argon2Hasher, PasswordHasher};
pub use identity::{Identity, authorize};
pub use jwt::{Claims, JwtAuth};
pub use requests::{
	AuthResponse, LoginRequest, MemberFields, NewAccount, RegisterRequest, TechnicianFields,
	normalize_email,
};
pub use service::{AuthService, SeedAccount, SeedReport, TechnicianSummary};
