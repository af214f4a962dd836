//! Process-local store guarded by a single reader-writer lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fixdesk_core::{
	Complaint, ComplaintId, ComplaintStatus, Error, Feedback, Result, Role, User, UserId,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::store::{ComplaintFilter, StatusChange, Store};

#[derive(Default)]
struct Tables {
	users: IndexMap<UserId, User>,
	complaints: IndexMap<ComplaintId, Complaint>,
	feedback: IndexMap<ComplaintId, Feedback>,
}

/// In-memory [`Store`]. Data lives as long as the value does.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn insert_user(&self, user: User) -> Result<User> {
		let mut tables = self.tables.write();
		if let Some(email) = &user.email
			&& tables
				.users
				.values()
				.any(|existing| existing.email.as_ref() == Some(email))
		{
			return Err(Error::Conflict("Email already exists".to_string()));
		}
		tables.users.insert(user.id, user.clone());
		tracing::debug!(user_id = %user.id, role = %user.role, "Inserted user");
		Ok(user)
	}

	async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
		Ok(self.tables.read().users.get(&id).cloned())
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
		Ok(self
			.tables
			.read()
			.users
			.values()
			.find(|u| u.email.as_deref() == Some(email))
			.cloned())
	}

	async fn find_users_by_role(&self, role: Role) -> Result<Vec<User>> {
		Ok(self
			.tables
			.read()
			.users
			.values()
			.filter(|u| u.role == role)
			.cloned()
			.collect())
	}

	async fn find_users_by_role_and_name(&self, role: Role, name: &str) -> Result<Vec<User>> {
		Ok(self
			.tables
			.read()
			.users
			.values()
			.filter(|u| u.role == role && u.name == name)
			.cloned()
			.collect())
	}

	async fn insert_complaint(&self, complaint: Complaint) -> Result<Complaint> {
		self.tables
			.write()
			.complaints
			.insert(complaint.id, complaint.clone());
		tracing::debug!(complaint_id = %complaint.id, "Inserted complaint");
		Ok(complaint)
	}

	async fn find_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>> {
		Ok(self.tables.read().complaints.get(&id).cloned())
	}

	async fn set_complaint_assignment(
		&self,
		id: ComplaintId,
		assignee: Option<UserId>,
		status: ComplaintStatus,
		updated_at: DateTime<Utc>,
	) -> Result<Complaint> {
		let mut tables = self.tables.write();
		let complaint = tables
			.complaints
			.get_mut(&id)
			.ok_or_else(|| Error::NotFound("Complaint".to_string()))?;
		complaint.assigned_to = assignee;
		complaint.status = status;
		complaint.updated_at = Some(updated_at);
		tracing::debug!(complaint_id = %id, assignee = ?assignee, "Updated assignment");
		Ok(complaint.clone())
	}

	async fn set_complaint_status(
		&self,
		id: ComplaintId,
		change: &StatusChange,
	) -> Result<Complaint> {
		let mut tables = self.tables.write();
		let complaint = tables
			.complaints
			.get_mut(&id)
			.ok_or_else(|| Error::NotFound("Complaint".to_string()))?;
		if let Some(required) = change.required_assignee
			&& complaint.assigned_to != Some(required)
		{
			return Err(Error::Authorization("Access denied".to_string()));
		}
		complaint.status = change.status;
		if let Some(notes) = &change.repair_notes {
			complaint.repair_notes = Some(notes.clone());
		}
		complaint.updated_at = Some(change.updated_at);
		tracing::debug!(complaint_id = %id, status = %change.status, "Updated status");
		Ok(complaint.clone())
	}

	async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
		// Reverse insertion order first so equal timestamps keep newest-inserted first.
		let mut complaints: Vec<Complaint> = self
			.tables
			.read()
			.complaints
			.values()
			.rev()
			.filter(|c| filter.matches(c))
			.cloned()
			.collect();
		complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(complaints)
	}

	async fn count_complaints(&self, filter: &ComplaintFilter) -> Result<u64> {
		Ok(self
			.tables
			.read()
			.complaints
			.values()
			.filter(|c| filter.matches(c))
			.count() as u64)
	}

	async fn count_by_category(&self) -> Result<Vec<(String, u64)>> {
		let mut counts: BTreeMap<String, u64> = BTreeMap::new();
		for complaint in self.tables.read().complaints.values() {
			*counts.entry(complaint.category.clone()).or_default() += 1;
		}
		Ok(counts.into_iter().collect())
	}

	async fn insert_feedback(&self, feedback: Feedback) -> Result<Feedback> {
		let mut tables = self.tables.write();
		if tables.feedback.contains_key(&feedback.complaint_id) {
			return Err(Error::Conflict(
				"Feedback already submitted for this complaint".to_string(),
			));
		}
		tables
			.feedback
			.insert(feedback.complaint_id, feedback.clone());
		Ok(feedback)
	}

	async fn find_feedback_for_complaint(
		&self,
		complaint_id: ComplaintId,
	) -> Result<Option<Feedback>> {
		Ok(self.tables.read().feedback.get(&complaint_id).cloned())
	}
}
