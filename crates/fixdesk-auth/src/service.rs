use fixdesk_core::{Error, PublicUser, Result, Role, User, UserId};
use fixdesk_db::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::hasher::PasswordHasher;
use crate::identity::Identity;
use crate::jwt::JwtAuth;
use crate::requests::{AuthResponse, LoginRequest, NewAccount, RegisterRequest, normalize_email};

/// Entry in the technician picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianSummary {
	pub id: UserId,
	pub name: String,
}

/// An account created through the privileged seeding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
	pub name: String,
	pub email: Option<String>,
	pub password: String,
	pub role: Role,
	pub department: Option<String>,
}

impl SeedAccount {
	pub fn admin(
		name: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			email: Some(normalize_email(&email.into())),
			password: password.into(),
			role: Role::Admin,
			department: Some("Facility".to_string()),
		}
	}

	pub fn technician(
		name: impl Into<String>,
		password: impl Into<String>,
		email: Option<String>,
	) -> Self {
		Self {
			name: name.into(),
			email: email.map(|e| normalize_email(&e)),
			password: password.into(),
			role: Role::Technician,
			department: None,
		}
	}

	/// The accounts a fresh installation starts with.
	pub fn defaults() -> Vec<SeedAccount> {
		vec![
			SeedAccount::admin("Facility Manager", "admin@campus.com", "admin123"),
			SeedAccount::technician("Mike Tech", "tech123", Some("mike@tech.com".to_string())),
			SeedAccount::technician("Sarah Fix", "tech123", Some("sarah@tech.com".to_string())),
		]
	}
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
	pub created: Vec<PublicUser>,
	pub skipped: Vec<String>,
}

/// Registration, login and token verification over a [`Store`].
pub struct AuthService {
	store: Arc<dyn Store>,
	hasher: Arc<dyn PasswordHasher>,
	jwt: JwtAuth,
}

impl AuthService {
	pub fn new(store: Arc<dyn Store>, hasher: Arc<dyn PasswordHasher>, jwt: JwtAuth) -> Self {
		Self { store, hasher, jwt }
	}

	pub fn jwt(&self) -> &JwtAuth {
		&self.jwt
	}

	/// Create a non-admin account and sign a session token for it.
	pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
		let account = request.validate()?;

		if let Some(email) = &account.email
			&& self.store.find_user_by_email(email).await?.is_some()
		{
			return Err(Error::Conflict("Email already exists".to_string()));
		}

		let user = self.create_account(account).await?;
		tracing::info!(user_id = %user.id, role = %user.role, "Registered user");
		self.respond(&user)
	}

	/// Check credentials and sign a session token.
	///
	/// Technicians are identified by name, falling back to email when no
	/// name is sent; everyone else by email. Unknown accounts and wrong
	/// passwords are indistinguishable to the caller.
	pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
		let LoginRequest {
			role,
			password,
			email,
			name,
		} = request;

		let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
		let email = email
			.map(|e| normalize_email(&e))
			.filter(|e| !e.is_empty());

		let candidates: Vec<User> = match (role, name, email) {
			(Role::Technician, Some(name), _) => {
				self.store.find_users_by_role_and_name(role, &name).await?
			}
			(_, _, Some(email)) => self
				.store
				.find_user_by_email(&email)
				.await?
				.into_iter()
				.filter(|user| user.role == role)
				.collect(),
			_ => Vec::new(),
		};

		for user in candidates {
			if self.verify_password(&password, &user.password_hash).await? {
				tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
				return self.respond(&user);
			}
		}

		tracing::warn!(role = %role, "Rejected login attempt");
		Err(Error::InvalidCredentials)
	}

	/// Resolve the caller from a bearer token.
	///
	/// `None` means the request carried no token at all.
	pub fn authenticate_token(&self, token: Option<&str>) -> Result<Identity> {
		let token = token
			.filter(|t| !t.is_empty())
			.ok_or_else(|| Error::Authentication("No token".to_string()))?;
		Identity::try_from(self.jwt.decode(token)?)
	}

	pub async fn list_technicians(&self) -> Result<Vec<TechnicianSummary>> {
		Ok(self
			.store
			.find_users_by_role(Role::Technician)
			.await?
			.into_iter()
			.map(|user| TechnicianSummary {
				id: user.id,
				name: user.name,
			})
			.collect())
	}

	/// Create the given accounts, skipping any that already exist.
	///
	/// An account exists when its email is taken or, for accounts without
	/// an email, when a user with the same role and name is present.
	pub async fn seed(&self, accounts: &[SeedAccount]) -> Result<SeedReport> {
		let mut report = SeedReport::default();

		for account in accounts {
			let exists = match &account.email {
				Some(email) => self.store.find_user_by_email(email).await?.is_some(),
				None => !self
					.store
					.find_users_by_role_and_name(account.role, &account.name)
					.await?
					.is_empty(),
			};

			if exists {
				tracing::info!(name = %account.name, role = %account.role, "Seed account already present");
				report.skipped.push(account.name.clone());
				continue;
			}

			let user = self
				.create_account(NewAccount {
					name: account.name.clone(),
					email: account.email.clone(),
					password: account.password.clone(),
					role: account.role,
					department: account.department.clone(),
				})
				.await?;
			tracing::info!(user_id = %user.id, name = %user.name, role = %user.role, "Seeded account");
			report.created.push(user.to_public());
		}

		Ok(report)
	}

	async fn create_account(&self, account: NewAccount) -> Result<User> {
		let hash = self.hash_password(account.password.clone()).await?;
		self.store.insert_user(account.into_user(hash)).await
	}

	fn respond(&self, user: &User) -> Result<AuthResponse> {
		Ok(AuthResponse {
			token: self.jwt.issue(user.id, user.role)?,
			user: user.to_public(),
		})
	}

	// Argon2 is CPU-bound; keep it off the async workers.
	async fn hash_password(&self, password: String) -> Result<String> {
		let hasher = Arc::clone(&self.hasher);
		tokio::task::spawn_blocking(move || hasher.hash(&password))
			.await
			.map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
	}

	async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
		let hasher = Arc::clone(&self.hasher);
		let password = password.to_string();
		let hash = hash.to_string();
		tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
			.await
			.map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))?
	}
}
