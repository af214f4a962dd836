//! Request payloads for the public authentication endpoints.

use fixdesk_core::{Error, PublicUser, Result, Role, User};
use serde::{Deserialize, Serialize};

/// Self-registration payload, discriminated by `role`.
///
/// Technicians register with a name and password only; whatever email or
/// department they send is ignored. Admin accounts are never accepted here.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RegisterRequest {
	Student(MemberFields),
	Faculty(MemberFields),
	Technician(TechnicianFields),
	Admin,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFields {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub password: Option<String>,
	#[serde(default)]
	pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechnicianFields {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub password: Option<String>,
}

/// A registration that passed validation, ready to be hashed and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
	pub name: String,
	pub email: Option<String>,
	pub password: String,
	pub role: Role,
	pub department: Option<String>,
}

impl NewAccount {
	pub fn into_user(self, password_hash: String) -> User {
		User::new(
			self.name,
			self.email,
			password_hash,
			self.role,
			self.department,
		)
	}
}

impl RegisterRequest {
	pub fn role(&self) -> Role {
		match self {
			RegisterRequest::Student(_) => Role::Student,
			RegisterRequest::Faculty(_) => Role::Faculty,
			RegisterRequest::Technician(_) => Role::Technician,
			RegisterRequest::Admin => Role::Admin,
		}
	}

	/// Check required fields for the variant and normalise them.
	///
	/// # Examples
	///
	/// ```
	/// use fixdesk_auth::RegisterRequest;
	///
	/// let request: RegisterRequest = serde_json::from_str(
	///     r#"{"role":"technician","name":"Mike Tech","password":"tech123","email":"ignored@x"}"#,
	/// ).unwrap();
	/// let account = request.validate().unwrap();
	///
	/// assert_eq!(account.name, "Mike Tech");
	/// assert_eq!(account.email, None);
	/// ```
	pub fn validate(self) -> Result<NewAccount> {
		let role = self.role();
		match self {
			RegisterRequest::Admin => Err(Error::Authorization(
				"Admin cannot be registered. Use `fixdesk seed`.".to_string(),
			)),
			RegisterRequest::Technician(fields) => {
				let missing = || {
					Error::Validation("Name and password required for technician".to_string())
				};
				let name = required(fields.name).ok_or_else(missing)?;
				let password = required_secret(fields.password).ok_or_else(missing)?;
				Ok(NewAccount {
					name,
					email: None,
					password,
					role,
					department: None,
				})
			}
			RegisterRequest::Student(fields) | RegisterRequest::Faculty(fields) => {
				let missing = || Error::Validation("All fields required".to_string());
				Ok(NewAccount {
					name: required(fields.name).ok_or_else(missing)?,
					email: Some(
						required(fields.email)
							.map(|email| normalize_email(&email))
							.ok_or_else(missing)?,
					),
					password: required_secret(fields.password).ok_or_else(missing)?,
					role,
					department: Some(required(fields.department).ok_or_else(missing)?),
				})
			}
		}
	}
}

/// Login payload. `name` identifies technicians, `email` everyone else.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
	pub role: Role,
	#[serde(default)]
	pub password: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
}

/// Body returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
	pub token: String,
	pub user: PublicUser,
}

/// Emails compare case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

fn required(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

// Passwords are kept verbatim; only emptiness is checked.
fn required_secret(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn parse(value: serde_json::Value) -> RegisterRequest {
		serde_json::from_value(value).unwrap()
	}

	#[rstest]
	fn test_student_registration_is_normalised() {
		let account = parse(json!({
			"role": "student",
			"name": "  Ada  ",
			"email": " Ada@Campus.EDU ",
			"password": "pw",
			"department": "CS"
		}))
		.validate()
		.unwrap();

		assert_eq!(account.name, "Ada");
		assert_eq!(account.email.as_deref(), Some("ada@campus.edu"));
		assert_eq!(account.role, Role::Student);
		assert_eq!(account.department.as_deref(), Some("CS"));
	}

	#[rstest]
	#[case(json!({"role": "faculty", "name": "Bo", "email": "bo@x", "password": "pw"}))]
	#[case(json!({"role": "student", "name": "Bo", "email": "", "password": "pw", "department": "EE"}))]
	#[case(json!({"role": "student", "email": "bo@x", "password": "pw", "department": "EE"}))]
	fn test_member_missing_fields(#[case] body: serde_json::Value) {
		let error = parse(body).validate().unwrap_err();
		assert_eq!(error.to_string(), "All fields required");
	}

	#[rstest]
	#[case(json!({"role": "technician", "password": "pw"}))]
	#[case(json!({"role": "technician", "name": "   ", "password": "pw"}))]
	#[case(json!({"role": "technician", "name": "Mike"}))]
	fn test_technician_missing_fields(#[case] body: serde_json::Value) {
		let error = parse(body).validate().unwrap_err();
		assert_eq!(error.to_string(), "Name and password required for technician");
	}

	#[rstest]
	fn test_admin_registration_is_forbidden() {
		let error = parse(json!({"role": "admin", "name": "Root", "email": "r@x", "password": "pw"}))
			.validate()
			.unwrap_err();

		assert_eq!(error.status_code(), 403);
	}

	#[rstest]
	#[case(json!({"name": "No role"}))]
	#[case(json!({"role": "janitor", "name": "Who"}))]
	fn test_unknown_or_missing_role_does_not_parse(#[case] body: serde_json::Value) {
		assert!(serde_json::from_value::<RegisterRequest>(body).is_err());
	}
}
