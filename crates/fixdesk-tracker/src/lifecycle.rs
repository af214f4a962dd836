//! Complaint filing, assignment and status transitions.
//!
//! Status moves `Pending → In Progress → Resolved`, but any of the three
//! values may be set directly by an admin or the assigned technician.

use fixdesk_auth::{Identity, authorize};
use fixdesk_core::{
	Complaint, ComplaintId, ComplaintStatus, Error, Result, Role, User, UserId, now_millis,
};
use fixdesk_db::{ComplaintFilter, StatusChange, Store};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Fields supplied when filing a complaint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub description: String,
	/// Set by the upload path, never by clients.
	#[serde(skip)]
	pub image_path: Option<String>,
}

/// Body of `PUT /api/complaints/{id}/assign`. `null` unassigns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
	#[serde(default)]
	pub technician_id: Option<UserId>,
}

/// Body of `PUT /api/complaints/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
	pub status: ComplaintStatus,
	#[serde(default)]
	pub repair_notes: Option<String>,
}

/// A user reference resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
	pub id: UserId,
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub email: Option<String>,
}

impl UserSummary {
	fn name_only(user: &User) -> Self {
		Self {
			id: user.id,
			name: user.name.clone(),
			email: None,
		}
	}

	fn with_email(user: &User) -> Self {
		Self {
			email: user.email.clone(),
			..Self::name_only(user)
		}
	}
}

/// A complaint together with the people it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintView {
	#[serde(flatten)]
	pub complaint: Complaint,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub owner: Option<UserSummary>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub assignee: Option<UserSummary>,
}

// Which references a listing resolves.
#[derive(Debug, Clone, Copy)]
enum Resolve {
	Assignee,
	Owner,
	OwnerWithEmailAndAssignee,
}

/// Creates complaints and moves them through their lifecycle.
pub struct ComplaintLifecycle {
	store: Arc<dyn Store>,
}

impl ComplaintLifecycle {
	pub fn new(store: Arc<dyn Store>) -> Self {
		Self { store }
	}

	/// File a complaint as `identity`. Admins cannot file complaints.
	pub async fn create(&self, identity: &Identity, input: NewComplaint) -> Result<Complaint> {
		authorize(identity, &[Role::Student, Role::Faculty, Role::Technician])?;

		let category = input.category.trim();
		let title = input.title.trim();
		if category.is_empty() || title.is_empty() {
			return Err(Error::Validation("Title and category required".to_string()));
		}

		let complaint = Complaint::new(
			identity.user_id,
			category,
			title,
			input.description.trim(),
			input.image_path,
		);
		let complaint = self.store.insert_complaint(complaint).await?;
		tracing::info!(complaint_id = %complaint.id, user_id = %identity.user_id, "Complaint filed");
		Ok(complaint)
	}

	/// Point a complaint at a technician, or clear the assignment.
	///
	/// Assigning moves the complaint to `In Progress`; clearing returns it
	/// to `Pending`. Both stamp `updatedAt`.
	pub async fn assign(
		&self,
		identity: &Identity,
		complaint_id: ComplaintId,
		technician_id: Option<UserId>,
	) -> Result<ComplaintView> {
		authorize(identity, &[Role::Admin])?;
		self.fetch(complaint_id).await?;

		let status = match technician_id {
			Some(technician_id) => {
				let technician = self.store.find_user_by_id(technician_id).await?;
				if technician.is_none_or(|user| user.role != Role::Technician) {
					return Err(Error::Validation(
						"Assignee must be an existing technician".to_string(),
					));
				}
				ComplaintStatus::InProgress
			}
			None => ComplaintStatus::Pending,
		};

		let complaint = self
			.store
			.set_complaint_assignment(complaint_id, technician_id, status, now_millis())
			.await?;
		tracing::info!(
			complaint_id = %complaint.id,
			assignee = ?complaint.assigned_to,
			"Complaint assignment changed"
		);
		self.view(complaint, Resolve::Assignee).await
	}

	/// Set the status and optionally attach repair notes.
	///
	/// Technicians may only touch complaints assigned to them at the moment
	/// of the write. Blank notes leave existing notes in place.
	pub async fn update_status(
		&self,
		identity: &Identity,
		complaint_id: ComplaintId,
		update: StatusUpdate,
	) -> Result<ComplaintView> {
		authorize(identity, &[Role::Admin, Role::Technician])?;

		let mut change = StatusChange::new(update.status, now_millis());
		if let Some(notes) = update
			.repair_notes
			.map(|n| n.trim().to_string())
			.filter(|n| !n.is_empty())
		{
			change = change.with_notes(notes);
		}
		if identity.role == Role::Technician {
			change = change.assigned_to(identity.user_id);
		}

		let complaint = self.store.set_complaint_status(complaint_id, &change).await?;
		tracing::info!(complaint_id = %complaint.id, status = %complaint.status, "Complaint status updated");
		self.view(complaint, Resolve::Assignee).await
	}

	/// Complaints filed by `user_id`, newest first. Owner or admin only.
	pub async fn list_for_user(
		&self,
		identity: &Identity,
		user_id: UserId,
	) -> Result<Vec<ComplaintView>> {
		if !identity.is(user_id) && !identity.is_admin() {
			return Err(Error::Authorization("Access denied".to_string()));
		}
		let complaints = self
			.store
			.list_complaints(&ComplaintFilter::all().owned_by(user_id))
			.await?;
		self.views(complaints, Resolve::Assignee).await
	}

	/// Every complaint, newest first. Admin only.
	pub async fn list_all(&self, identity: &Identity) -> Result<Vec<ComplaintView>> {
		authorize(identity, &[Role::Admin])?;
		let complaints = self.store.list_complaints(&ComplaintFilter::all()).await?;
		self.views(complaints, Resolve::OwnerWithEmailAndAssignee)
			.await
	}

	/// Open work assigned to `technician_id`. Only that technician may ask.
	pub async fn list_assigned(
		&self,
		identity: &Identity,
		technician_id: UserId,
	) -> Result<Vec<ComplaintView>> {
		authorize(identity, &[Role::Technician])?;
		if !identity.is(technician_id) {
			return Err(Error::Authorization("Access denied".to_string()));
		}
		let filter = ComplaintFilter::all()
			.assigned_to(technician_id)
			.with_statuses(ComplaintStatus::OPEN);
		let complaints = self.store.list_complaints(&filter).await?;
		self.views(complaints, Resolve::Owner).await
	}

	async fn fetch(&self, complaint_id: ComplaintId) -> Result<Complaint> {
		self.store
			.find_complaint(complaint_id)
			.await?
			.ok_or_else(|| Error::NotFound("Complaint".to_string()))
	}

	async fn view(&self, complaint: Complaint, resolve: Resolve) -> Result<ComplaintView> {
		let mut views = self.views(vec![complaint], resolve).await?;
		views
			.pop()
			.ok_or_else(|| Error::Internal("Complaint view vanished".to_string()))
	}

	async fn views(
		&self,
		complaints: Vec<Complaint>,
		resolve: Resolve,
	) -> Result<Vec<ComplaintView>> {
		let mut users: HashMap<UserId, Option<User>> = HashMap::new();
		let mut views = Vec::with_capacity(complaints.len());

		for complaint in complaints {
			let owner = match resolve {
				Resolve::Assignee => None,
				Resolve::Owner => self
					.lookup(&mut users, complaint.user_id)
					.await?
					.map(UserSummary::name_only),
				Resolve::OwnerWithEmailAndAssignee => self
					.lookup(&mut users, complaint.user_id)
					.await?
					.map(UserSummary::with_email),
			};
			let assignee = match (resolve, complaint.assigned_to) {
				(Resolve::Owner, _) | (_, None) => None,
				(_, Some(id)) => self
					.lookup(&mut users, id)
					.await?
					.map(UserSummary::name_only),
			};
			views.push(ComplaintView {
				complaint,
				owner,
				assignee,
			});
		}
		Ok(views)
	}

	async fn lookup<'a>(
		&self,
		cache: &'a mut HashMap<UserId, Option<User>>,
		id: UserId,
	) -> Result<Option<&'a User>> {
		if !cache.contains_key(&id) {
			let user = self.store.find_user_by_id(id).await?;
			cache.insert(id, user);
		}
		Ok(cache.get(&id).and_then(Option::as_ref))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use fixdesk_db::MemoryStore;
	use rstest::{fixture, rstest};

	struct Setup {
		lifecycle: ComplaintLifecycle,
		student: Identity,
		admin: Identity,
		tech: Identity,
		other_tech: Identity,
	}

	#[fixture]
	async fn setup() -> Setup {
		let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
		let add = |user: User| {
			let store = Arc::clone(&store);
			async move { store.insert_user(user).await.unwrap() }
		};
		let student = add(User::new("Ada", Some("ada@campus.edu".into()), "h", Role::Student, Some("CS".into()))).await;
		let admin = add(User::new("Boss", Some("boss@campus.edu".into()), "h", Role::Admin, None)).await;
		let tech = add(User::new("Mike Tech", None, "h", Role::Technician, None)).await;
		let other = add(User::new("Sarah Fix", None, "h", Role::Technician, None)).await;

		Setup {
			lifecycle: ComplaintLifecycle::new(store),
			student: Identity::new(student.id, student.role),
			admin: Identity::new(admin.id, admin.role),
			tech: Identity::new(tech.id, tech.role),
			other_tech: Identity::new(other.id, other.role),
		}
	}

	fn leak() -> NewComplaint {
		NewComplaint {
			category: "Plumbing".into(),
			title: "Leak".into(),
			description: "Sink drips".into(),
			image_path: None,
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_starts_pending(#[future] setup: Setup) {
		let s = setup.await;

		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();

		assert_eq!(complaint.status, ComplaintStatus::Pending);
		assert_eq!(complaint.assigned_to, None);
		assert_eq!(complaint.user_id, s.student.user_id);
	}

	#[rstest]
	#[tokio::test]
	async fn test_admin_cannot_file(#[future] setup: Setup) {
		let s = setup.await;
		let result = s.lifecycle.create(&s.admin, leak()).await;
		assert!(matches!(result, Err(Error::Authorization(_))));
	}

	#[rstest]
	#[case("", "Leak")]
	#[case("Plumbing", "   ")]
	#[tokio::test]
	async fn test_create_requires_title_and_category(
		#[future] setup: Setup,
		#[case] category: &str,
		#[case] title: &str,
	) {
		let s = setup.await;
		let input = NewComplaint {
			category: category.into(),
			title: title.into(),
			..NewComplaint::default()
		};

		let result = s.lifecycle.create(&s.student, input).await;

		assert!(matches!(result, Err(Error::Validation(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_assign_is_idempotent(#[future] setup: Setup) {
		let s = setup.await;
		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();

		let first = s
			.lifecycle
			.assign(&s.admin, complaint.id, Some(s.tech.user_id))
			.await
			.unwrap();
		let second = s
			.lifecycle
			.assign(&s.admin, complaint.id, Some(s.tech.user_id))
			.await
			.unwrap();

		for view in [&first, &second] {
			assert_eq!(view.complaint.status, ComplaintStatus::InProgress);
			assert_eq!(view.complaint.assigned_to, Some(s.tech.user_id));
			assert!(view.complaint.updated_at.is_some());
			assert_eq!(view.assignee.as_ref().map(|a| a.name.as_str()), Some("Mike Tech"));
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_unassign_returns_to_pending(#[future] setup: Setup) {
		let s = setup.await;
		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();
		s.lifecycle
			.assign(&s.admin, complaint.id, Some(s.tech.user_id))
			.await
			.unwrap();

		let view = s.lifecycle.assign(&s.admin, complaint.id, None).await.unwrap();

		assert_eq!(view.complaint.status, ComplaintStatus::Pending);
		assert_eq!(view.complaint.assigned_to, None);
		assert_eq!(view.assignee, None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_assign_rejects_non_technicians(#[future] setup: Setup) {
		let s = setup.await;
		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();

		let to_student = s
			.lifecycle
			.assign(&s.admin, complaint.id, Some(s.student.user_id))
			.await;
		let to_nobody = s
			.lifecycle
			.assign(&s.admin, complaint.id, Some(uuid::Uuid::new_v4()))
			.await;
		let by_tech = s
			.lifecycle
			.assign(&s.tech, complaint.id, Some(s.tech.user_id))
			.await;

		assert!(matches!(to_student, Err(Error::Validation(_))));
		assert!(matches!(to_nobody, Err(Error::Validation(_))));
		assert!(matches!(by_tech, Err(Error::Authorization(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_unknown_complaint_is_not_found(#[future] setup: Setup) {
		let s = setup.await;
		let result = s
			.lifecycle
			.assign(&s.admin, uuid::Uuid::new_v4(), None)
			.await;
		assert!(matches!(result, Err(Error::NotFound(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_only_assigned_technician_updates_status(#[future] setup: Setup) {
		let s = setup.await;
		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();
		s.lifecycle
			.assign(&s.admin, complaint.id, Some(s.tech.user_id))
			.await
			.unwrap();
		let resolve = |notes: &str| StatusUpdate {
			status: ComplaintStatus::Resolved,
			repair_notes: Some(notes.to_string()),
		};

		let stranger = s
			.lifecycle
			.update_status(&s.other_tech, complaint.id, resolve("nope"))
			.await;
		let student = s
			.lifecycle
			.update_status(&s.student, complaint.id, resolve("nope"))
			.await;
		assert!(matches!(stranger, Err(Error::Authorization(_))));
		assert!(matches!(student, Err(Error::Authorization(_))));

		let view = s
			.lifecycle
			.update_status(&s.tech, complaint.id, resolve("Fixed valve"))
			.await
			.unwrap();
		assert_eq!(view.complaint.status, ComplaintStatus::Resolved);
		assert_eq!(view.complaint.repair_notes.as_deref(), Some("Fixed valve"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_blank_notes_keep_existing(#[future] setup: Setup) {
		let s = setup.await;
		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();
		s.lifecycle
			.update_status(
				&s.admin,
				complaint.id,
				StatusUpdate {
					status: ComplaintStatus::InProgress,
					repair_notes: Some("Parts ordered".into()),
				},
			)
			.await
			.unwrap();

		let view = s
			.lifecycle
			.update_status(
				&s.admin,
				complaint.id,
				StatusUpdate {
					status: ComplaintStatus::Pending,
					repair_notes: Some("  ".into()),
				},
			)
			.await
			.unwrap();

		assert_eq!(view.complaint.status, ComplaintStatus::Pending);
		assert_eq!(view.complaint.repair_notes.as_deref(), Some("Parts ordered"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_listing_gates(#[future] setup: Setup) {
		let s = setup.await;
		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();
		s.lifecycle
			.assign(&s.admin, complaint.id, Some(s.tech.user_id))
			.await
			.unwrap();

		let own = s.lifecycle.list_for_user(&s.student, s.student.user_id).await.unwrap();
		assert_eq!(own.len(), 1);
		assert_eq!(own[0].assignee.as_ref().map(|a| a.id), Some(s.tech.user_id));
		assert!(s.lifecycle.list_for_user(&s.admin, s.student.user_id).await.is_ok());
		assert!(s.lifecycle.list_for_user(&s.tech, s.student.user_id).await.is_err());

		let all = s.lifecycle.list_all(&s.admin).await.unwrap();
		let owner = all[0].owner.as_ref().unwrap();
		assert_eq!(owner.email.as_deref(), Some("ada@campus.edu"));
		assert!(s.lifecycle.list_all(&s.student).await.is_err());

		let assigned = s.lifecycle.list_assigned(&s.tech, s.tech.user_id).await.unwrap();
		assert_eq!(assigned.len(), 1);
		assert_eq!(assigned[0].owner.as_ref().map(|o| o.name.as_str()), Some("Ada"));
		assert_eq!(assigned[0].owner.as_ref().and_then(|o| o.email.clone()), None);
		assert!(s.lifecycle.list_assigned(&s.other_tech, s.tech.user_id).await.is_err());
		assert!(s.lifecycle.list_assigned(&s.admin, s.tech.user_id).await.is_err());
	}

	#[rstest]
	#[tokio::test]
	async fn test_resolved_work_leaves_assigned_list(#[future] setup: Setup) {
		let s = setup.await;
		let complaint = s.lifecycle.create(&s.student, leak()).await.unwrap();
		s.lifecycle
			.assign(&s.admin, complaint.id, Some(s.tech.user_id))
			.await
			.unwrap();
		s.lifecycle
			.update_status(
				&s.tech,
				complaint.id,
				StatusUpdate {
					status: ComplaintStatus::Resolved,
					repair_notes: None,
				},
			)
			.await
			.unwrap();

		let assigned = s.lifecycle.list_assigned(&s.tech, s.tech.user_id).await.unwrap();

		assert!(assigned.is_empty());
	}

	/// Delays complaint reads so a second request can land in between.
	struct SlowReads {
		inner: Arc<MemoryStore>,
		delay: std::time::Duration,
	}

	#[async_trait::async_trait]
	impl Store for SlowReads {
		async fn insert_user(&self, user: User) -> Result<User> {
			self.inner.insert_user(user).await
		}

		async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
			self.inner.find_user_by_id(id).await
		}

		async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
			self.inner.find_user_by_email(email).await
		}

		async fn find_users_by_role(&self, role: Role) -> Result<Vec<User>> {
			self.inner.find_users_by_role(role).await
		}

		async fn find_users_by_role_and_name(&self, role: Role, name: &str) -> Result<Vec<User>> {
			self.inner.find_users_by_role_and_name(role, name).await
		}

		async fn insert_complaint(&self, complaint: Complaint) -> Result<Complaint> {
			self.inner.insert_complaint(complaint).await
		}

		async fn find_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>> {
			let found = self.inner.find_complaint(id).await;
			tokio::time::sleep(self.delay).await;
			found
		}

		async fn set_complaint_assignment(
			&self,
			id: ComplaintId,
			assignee: Option<UserId>,
			status: ComplaintStatus,
			updated_at: chrono::DateTime<chrono::Utc>,
		) -> Result<Complaint> {
			self.inner
				.set_complaint_assignment(id, assignee, status, updated_at)
				.await
		}

		async fn set_complaint_status(
			&self,
			id: ComplaintId,
			change: &StatusChange,
		) -> Result<Complaint> {
			self.inner.set_complaint_status(id, change).await
		}

		async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
			self.inner.list_complaints(filter).await
		}

		async fn count_complaints(&self, filter: &ComplaintFilter) -> Result<u64> {
			self.inner.count_complaints(filter).await
		}

		async fn count_by_category(&self) -> Result<Vec<(String, u64)>> {
			self.inner.count_by_category().await
		}

		async fn insert_feedback(&self, feedback: fixdesk_core::Feedback) -> Result<fixdesk_core::Feedback> {
			self.inner.insert_feedback(feedback).await
		}

		async fn find_feedback_for_complaint(
			&self,
			complaint_id: ComplaintId,
		) -> Result<Option<fixdesk_core::Feedback>> {
			self.inner.find_feedback_for_complaint(complaint_id).await
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_assignment_does_not_revert_concurrent_notes() {
		let inner = Arc::new(MemoryStore::new());
		let student = inner
			.insert_user(User::new("Ada", Some("ada@campus.edu".into()), "h", Role::Student, None))
			.await
			.unwrap();
		let admin = inner
			.insert_user(User::new("Boss", Some("boss@campus.edu".into()), "h", Role::Admin, None))
			.await
			.unwrap();
		let tech = inner
			.insert_user(User::new("Mike Tech", None, "h", Role::Technician, None))
			.await
			.unwrap();
		let store = SlowReads {
			inner: Arc::clone(&inner),
			delay: std::time::Duration::from_millis(100),
		};
		let lifecycle = Arc::new(ComplaintLifecycle::new(Arc::new(store)));
		let student = Identity::new(student.id, student.role);
		let admin = Identity::new(admin.id, admin.role);
		let complaint = lifecycle.create(&student, leak()).await.unwrap();

		let assigning = {
			let lifecycle = Arc::clone(&lifecycle);
			let tech_id = tech.id;
			tokio::spawn(async move { lifecycle.assign(&admin, complaint.id, Some(tech_id)).await })
		};
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		lifecycle
			.update_status(
				&admin,
				complaint.id,
				StatusUpdate {
					status: ComplaintStatus::InProgress,
					repair_notes: Some("Parts ordered".into()),
				},
			)
			.await
			.unwrap();
		assigning.await.unwrap().unwrap();

		let stored = inner.find_complaint(complaint.id).await.unwrap().unwrap();
		assert_eq!(stored.assigned_to, Some(tech.id));
		assert_eq!(stored.repair_notes.as_deref(), Some("Parts ordered"));
	}

	#[rstest]
	fn test_view_serializes_flat() {
		let complaint = Complaint::new(uuid::Uuid::new_v4(), "HVAC", "Cold", "", None);
		let view = ComplaintView {
			complaint,
			owner: None,
			assignee: None,
		};

		let json = serde_json::to_value(&view).unwrap();

		assert_eq!(json["status"], "Pending");
		assert_eq!(json["title"], "Cold");
		assert!(json.get("owner").is_none());
		assert!(json["assignedTo"].is_null());
	}
}
