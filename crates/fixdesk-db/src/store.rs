//! The storage trait shared by every backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fixdesk_core::{
	Complaint, ComplaintId, ComplaintStatus, Feedback, Result, Role, User, UserId,
};

/// Selects complaints by owner, assignee and status. Empty filter = all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
	pub owner: Option<UserId>,
	pub assignee: Option<UserId>,
	pub statuses: Option<Vec<ComplaintStatus>>,
}

impl ComplaintFilter {
	pub fn all() -> Self {
		Self::default()
	}

	pub fn owned_by(mut self, user_id: UserId) -> Self {
		self.owner = Some(user_id);
		self
	}

	pub fn assigned_to(mut self, technician_id: UserId) -> Self {
		self.assignee = Some(technician_id);
		self
	}

	pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = ComplaintStatus>) -> Self {
		self.statuses = Some(statuses.into_iter().collect());
		self
	}

	pub fn with_status(self, status: ComplaintStatus) -> Self {
		self.with_statuses([status])
	}

	/// In-process evaluation, used by the memory store.
	pub fn matches(&self, complaint: &Complaint) -> bool {
		self.owner.is_none_or(|owner| complaint.user_id == owner)
			&& self
				.assignee
				.is_none_or(|assignee| complaint.assigned_to == Some(assignee))
			&& self
				.statuses
				.as_ref()
				.is_none_or(|statuses| statuses.contains(&complaint.status))
	}
}

/// A status write that leaves every other complaint field alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
	pub status: ComplaintStatus,
	/// `None` keeps the stored notes.
	pub repair_notes: Option<String>,
	pub updated_at: DateTime<Utc>,
	/// Apply only while the complaint is assigned to this user.
	pub required_assignee: Option<UserId>,
}

impl StatusChange {
	pub fn new(status: ComplaintStatus, updated_at: DateTime<Utc>) -> Self {
		Self {
			status,
			repair_notes: None,
			updated_at,
			required_assignee: None,
		}
	}

	pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
		self.repair_notes = Some(notes.into());
		self
	}

	pub fn assigned_to(mut self, assignee: UserId) -> Self {
		self.required_assignee = Some(assignee);
		self
	}
}

/// Persistence for users, complaints and feedback.
///
/// Listing operations return complaints newest first. Writes are atomic per
/// call; there is no cross-call transaction and the last writer wins.
#[async_trait]
pub trait Store: Send + Sync {
	/// Insert a user. Fails with `Conflict` if the email is already taken;
	/// users without an email never conflict.
	async fn insert_user(&self, user: User) -> Result<User>;

	async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

	/// Users with the given role, in insertion order.
	async fn find_users_by_role(&self, role: Role) -> Result<Vec<User>>;

	/// Users with the given role and exact name, in insertion order.
	async fn find_users_by_role_and_name(&self, role: Role, name: &str) -> Result<Vec<User>>;

	async fn insert_complaint(&self, complaint: Complaint) -> Result<Complaint>;

	async fn find_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>>;

	/// Set assignee and status together and return the stored complaint.
	/// Other fields are untouched. Fails with `NotFound` if it does not exist.
	async fn set_complaint_assignment(
		&self,
		id: ComplaintId,
		assignee: Option<UserId>,
		status: ComplaintStatus,
		updated_at: DateTime<Utc>,
	) -> Result<Complaint>;

	/// Apply a [`StatusChange`] and return the stored complaint.
	///
	/// Fails with `NotFound` if the complaint does not exist, and with
	/// `Authorization` if `required_assignee` no longer matches at write time.
	async fn set_complaint_status(
		&self,
		id: ComplaintId,
		change: &StatusChange,
	) -> Result<Complaint>;

	async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>>;

	async fn count_complaints(&self, filter: &ComplaintFilter) -> Result<u64>;

	/// Complaint counts grouped by category, sorted by category name.
	async fn count_by_category(&self) -> Result<Vec<(String, u64)>>;

	/// Insert feedback. Fails with `Conflict` if the complaint already has feedback.
	async fn insert_feedback(&self, feedback: Feedback) -> Result<Feedback>;

	async fn find_feedback_for_complaint(&self, complaint_id: ComplaintId)
	-> Result<Option<Feedback>>;
}
