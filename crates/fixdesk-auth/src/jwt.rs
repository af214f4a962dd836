use chrono::{Duration, Utc};
use fixdesk_core::{Error, Result, Role, UserId};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Session token claims: who the bearer is and what role they hold.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
	/// User id
	pub sub: String,
	pub role: Role,
	pub iat: i64,
	pub exp: i64,
}

impl Claims {
	/// # Examples
	///
	/// ```
	/// use fixdesk_auth::Claims;
	/// use fixdesk_core::Role;
	/// use chrono::Duration;
	/// use uuid::Uuid;
	///
	/// let claims = Claims::new(Uuid::new_v4(), Role::Student, Duration::days(7)).unwrap();
	/// assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
	/// ```
	pub fn new(user_id: UserId, role: Role, expires_in: Duration) -> Result<Self> {
		let now = Utc::now();
		let expires_at = now
			.checked_add_signed(expires_in)
			.ok_or_else(|| Error::Internal("Token lifetime out of range".to_string()))?;
		Ok(Self {
			sub: user_id.to_string(),
			role,
			iat: now.timestamp(),
			exp: expires_at.timestamp(),
		})
	}

	pub fn user_id(&self) -> Result<UserId> {
		self.sub
			.parse()
			.map_err(|_| Error::Authentication("Invalid token".to_string()))
	}
}

/// Issues and verifies HS256 session tokens.
pub struct JwtAuth {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
	ttl: Duration,
}

impl JwtAuth {
	pub fn new(secret: &[u8], ttl: Duration) -> Self {
		let mut validation = Validation::default();
		validation.leeway = 0;
		Self {
			encoding_key: EncodingKey::from_secret(secret),
			decoding_key: DecodingKey::from_secret(secret),
			validation,
			ttl,
		}
	}

	pub fn encode(&self, claims: &Claims) -> Result<String> {
		encode(&Header::default(), claims, &self.encoding_key)
			.map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
	}

	/// Verify signature and expiry.
	///
	/// Every failure is reported as `Invalid token`; the cause only goes to the log.
	pub fn decode(&self, token: &str) -> Result<Claims> {
		decode::<Claims>(token, &self.decoding_key, &self.validation)
			.map(|data| data.claims)
			.map_err(|e| {
				tracing::warn!("Rejected bearer token: {}", e);
				Error::Authentication("Invalid token".to_string())
			})
	}

	/// Sign a fresh token for `user_id` valid for the configured TTL.
	///
	/// # Examples
	///
	/// ```
	/// use fixdesk_auth::JwtAuth;
	/// use fixdesk_core::Role;
	/// use chrono::Duration;
	/// use uuid::Uuid;
	///
	/// let jwt = JwtAuth::new(b"secret", Duration::days(7));
	/// let user_id = Uuid::new_v4();
	/// let token = jwt.issue(user_id, Role::Technician).unwrap();
	///
	/// let claims = jwt.decode(&token).unwrap();
	/// assert_eq!(claims.user_id().unwrap(), user_id);
	/// assert_eq!(claims.role, Role::Technician);
	/// ```
	pub fn issue(&self, user_id: UserId, role: Role) -> Result<String> {
		self.encode(&Claims::new(user_id, role, self.ttl)?)
	}
}
