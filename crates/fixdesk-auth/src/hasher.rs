use argon2::{Algorithm, Argon2, Params, Version};
use fixdesk_core::{Error, Result};

/// Password hasher trait
///
/// Implementations must produce self-describing hashes (PHC strings) so that
/// `verify` needs nothing but the stored value.
pub trait PasswordHasher: Send + Sync {
	fn hash(&self, password: &str) -> Result<String>;

	fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id password hasher
///
/// # Examples
///
/// ```
/// use fixdesk_auth::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new();
/// let hash = hasher.hash("tech123").unwrap();
///
/// assert!(hasher.verify("tech123", &hash).unwrap());
/// assert!(!hasher.verify("wrong", &hash).unwrap());
/// ```
#[derive(Clone)]
pub struct Argon2Hasher {
	params: Params,
}

impl Argon2Hasher {
	pub fn new() -> Self {
		Self {
			params: Params::default(),
		}
	}

	/// Hasher with explicit cost parameters (memory in KiB, iterations, lanes).
	///
	/// Tests use tiny costs to stay fast; production should keep the defaults.
	pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
		let params = Params::new(m_cost, t_cost, p_cost, None)
			.map_err(|e| Error::Internal(format!("Invalid argon2 parameters: {}", e)))?;
		Ok(Self { params })
	}

	fn argon2(&self) -> Argon2<'static> {
		Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
	}
}

impl Default for Argon2Hasher {
	fn default() -> Self {
		Self::new()
	}
}

impl PasswordHasher for Argon2Hasher {
	fn hash(&self, password: &str) -> Result<String> {
		use argon2::password_hash::{PasswordHasher as _, SaltString};
		use rand::RngCore;

		let mut salt_bytes = [0u8; 16];
		rand::rng().fill_bytes(&mut salt_bytes);

		let salt = SaltString::encode_b64(&salt_bytes)
			.map_err(|e| Error::Internal(format!("Failed to encode salt: {}", e)))?;

		self.argon2()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))
	}

	fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		use argon2::password_hash::{PasswordHash, PasswordVerifier};

		let parsed_hash = PasswordHash::new(hash)
			.map_err(|e| Error::Internal(format!("Stored password hash is invalid: {}", e)))?;

		// Parameters are read from the PHC string, so hashes made with other costs still verify.
		Ok(self
			.argon2()
			.verify_password(password.as_bytes(), &parsed_hash)
			.is_ok())
	}
}
