use fixdesk_core::{Error, Result, Role, UserId};

use crate::jwt::Claims;

/// The authenticated caller of a request, derived from its bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
	pub user_id: UserId,
	pub role: Role,
}

impl Identity {
	pub fn new(user_id: UserId, role: Role) -> Self {
		Self { user_id, role }
	}

	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}

	/// Whether this caller is `user_id` itself.
	pub fn is(&self, user_id: UserId) -> bool {
		self.user_id == user_id
	}
}

impl TryFrom<Claims> for Identity {
	type Error = Error;

	fn try_from(claims: Claims) -> Result<Self> {
		Ok(Self {
			user_id: claims.user_id()?,
			role: claims.role,
		})
	}
}

/// Fail with `Access denied` unless the caller holds one of `allowed`.
///
/// # Examples
///
/// ```
/// use fixdesk_auth::{Identity, authorize};
/// use fixdesk_core::Role;
/// use uuid::Uuid;
///
/// let tech = Identity::new(Uuid::new_v4(), Role::Technician);
/// assert!(authorize(&tech, &[Role::Admin, Role::Technician]).is_ok());
/// assert!(authorize(&tech, &[Role::Admin]).is_err());
/// ```
pub fn authorize(identity: &Identity, allowed: &[Role]) -> Result<()> {
	if allowed.contains(&identity.role) {
		Ok(())
	} else {
		Err(access_denied())
	}
}

pub(crate) fn access_denied() -> Error {
	Error::Authorization("Access denied".to_string())
}
