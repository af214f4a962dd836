//! Domain records: users, complaints and feedback.
//!
//! Wire names are camelCase and status values use the display strings
//! (`"In Progress"`), which is what existing clients send and expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::exception::Error;

pub type UserId = Uuid;
pub type ComplaintId = Uuid;
pub type FeedbackId = Uuid;

/// Current time truncated to millisecond precision.
///
/// Stores persist timestamps as epoch milliseconds, so every timestamp is
/// created at that precision to survive a round trip unchanged.
pub fn now_millis() -> DateTime<Utc> {
	let now = Utc::now();
	DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Account role. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Student,
	Faculty,
	Technician,
	Admin,
}

impl Role {
	pub const ALL: [Role; 4] = [Role::Student, Role::Faculty, Role::Technician, Role::Admin];

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Student => "student",
			Role::Faculty => "faculty",
			Role::Technician => "technician",
			Role::Admin => "admin",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Role::ALL
			.into_iter()
			.find(|role| role.as_str() == s)
			.ok_or_else(|| Error::Validation(format!("Unknown role: {}", s)))
	}
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: UserId,
	pub name: String,
	pub email: Option<String>,
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub role: Role,
	pub department: Option<String>,
}

impl User {
	pub fn new(
		name: impl Into<String>,
		email: Option<String>,
		password_hash: impl Into<String>,
		role: Role,
		department: Option<String>,
	) -> Self {
		Self {
			id: Uuid::new_v4(),
			name: name.into(),
			email,
			password_hash: password_hash.into(),
			role,
			department,
		}
	}

	pub fn to_public(&self) -> PublicUser {
		PublicUser {
			id: self.id,
			name: self.name.clone(),
			email: self.email.clone(),
			role: self.role,
		}
	}
}

/// The projection of a [`User`] that is returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
	pub id: UserId,
	pub name: String,
	pub email: Option<String>,
	pub role: Role,
}

/// Lifecycle state of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
	Pending,
	#[serde(rename = "In Progress")]
	InProgress,
	Resolved,
}

impl ComplaintStatus {
	pub const ALL: [ComplaintStatus; 3] = [
		ComplaintStatus::Pending,
		ComplaintStatus::InProgress,
		ComplaintStatus::Resolved,
	];

	/// Statuses a technician still has work to do on.
	pub const OPEN: [ComplaintStatus; 2] = [ComplaintStatus::Pending, ComplaintStatus::InProgress];

	pub fn as_str(&self) -> &'static str {
		match self {
			ComplaintStatus::Pending => "Pending",
			ComplaintStatus::InProgress => "In Progress",
			ComplaintStatus::Resolved => "Resolved",
		}
	}
}

impl fmt::Display for ComplaintStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ComplaintStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ComplaintStatus::ALL
			.into_iter()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| Error::Validation(format!("Unknown status: {}", s)))
	}
}

/// A filed facility issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
	pub id: ComplaintId,
	pub user_id: UserId,
	pub category: String,
	pub title: String,
	pub description: String,
	pub image_path: Option<String>,
	pub status: ComplaintStatus,
	pub assigned_to: Option<UserId>,
	pub repair_notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: Option<DateTime<Utc>>,
}

impl Complaint {
	/// A fresh complaint: `Pending`, unassigned, never updated.
	pub fn new(
		user_id: UserId,
		category: impl Into<String>,
		title: impl Into<String>,
		description: impl Into<String>,
		image_path: Option<String>,
	) -> Self {
		Self {
			id: Uuid::new_v4(),
			user_id,
			category: category.into(),
			title: title.into(),
			description: description.into(),
			image_path,
			status: ComplaintStatus::Pending,
			assigned_to: None,
			repair_notes: None,
			created_at: now_millis(),
			updated_at: None,
		}
	}

	/// Milliseconds between filing and the last update, for resolved complaints.
	pub fn resolution_millis(&self) -> Option<i64> {
		if self.status != ComplaintStatus::Resolved {
			return None;
		}
		self.updated_at
			.map(|updated| (updated - self.created_at).num_milliseconds())
	}
}

/// A rating left by the submitter of a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
	pub id: FeedbackId,
	pub complaint_id: ComplaintId,
	pub user_id: UserId,
	pub rating: u8,
	pub comments: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl Feedback {
	pub const MIN_RATING: u8 = 1;
	pub const MAX_RATING: u8 = 5;

	pub fn new(
		complaint_id: ComplaintId,
		user_id: UserId,
		rating: u8,
		comments: Option<String>,
	) -> Self {
		Self {
			id: Uuid::new_v4(),
			complaint_id,
			user_id,
			rating,
			comments,
			created_at: now_millis(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use rstest::rstest;

	#[rstest]
	#[case(ComplaintStatus::Pending, "\"Pending\"")]
	#[case(ComplaintStatus::InProgress, "\"In Progress\"")]
	#[case(ComplaintStatus::Resolved, "\"Resolved\"")]
	fn test_status_wire_names(#[case] status: ComplaintStatus, #[case] json: &str) {
		assert_eq!(serde_json::to_string(&status).unwrap(), json);
		assert_eq!(status.as_str().parse::<ComplaintStatus>().unwrap(), status);
	}

	#[rstest]
	fn test_role_parse_rejects_unknown() {
		assert_eq!("technician".parse::<Role>().unwrap(), Role::Technician);
		assert!("janitor".parse::<Role>().is_err());
	}

	#[rstest]
	fn test_new_complaint_is_pending_and_unassigned() {
		let complaint = Complaint::new(Uuid::new_v4(), "Plumbing", "Leak", "Sink drips", None);

		assert_eq!(complaint.status, ComplaintStatus::Pending);
		assert!(complaint.assigned_to.is_none());
		assert!(complaint.updated_at.is_none());
	}

	#[rstest]
	fn test_resolution_millis_only_for_resolved() {
		let mut complaint = Complaint::new(Uuid::new_v4(), "Electrical", "Flicker", "", None);
		complaint.updated_at = Some(complaint.created_at + Duration::milliseconds(1500));
		assert_eq!(complaint.resolution_millis(), None);

		complaint.status = ComplaintStatus::Resolved;
		assert_eq!(complaint.resolution_millis(), Some(1500));
	}

	#[rstest]
	fn test_user_serialization_omits_password_hash() {
		let user = User::new("Ada", Some("ada@campus.edu".into()), "$argon2id$...", Role::Student, None);
		let json = serde_json::to_value(&user).unwrap();

		assert!(json.get("passwordHash").is_none());
		assert_eq!(json["role"], "student");
	}
}
