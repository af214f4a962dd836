//! Behaviour every `Store` backend must share.

use chrono::Duration;
use fixdesk_core::{Complaint, ComplaintStatus, Error, Feedback, Role, User};
use fixdesk_db::{ComplaintFilter, MemoryStore, SqliteStore, StatusChange, Store};
use rstest::rstest;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Backend {
	Memory,
	Sqlite,
}

async fn open(backend: Backend) -> Arc<dyn Store> {
	match backend {
		Backend::Memory => Arc::new(MemoryStore::new()),
		Backend::Sqlite => Arc::new(SqliteStore::connect("sqlite::memory:").await.unwrap()),
	}
}

fn student(email: &str) -> User {
	User::new(
		"Student",
		Some(email.to_string()),
		"hash",
		Role::Student,
		Some("CS".to_string()),
	)
}

fn technician(name: &str) -> User {
	User::new(name, None, "hash", Role::Technician, None)
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_email_uniqueness(#[case] backend: Backend) {
	let store = open(backend).await;

	store.insert_user(student("a@campus.edu")).await.unwrap();
	let duplicate = store.insert_user(student("a@campus.edu")).await;

	assert!(matches!(duplicate, Err(Error::Conflict(_))));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_users_without_email_never_conflict(#[case] backend: Backend) {
	let store = open(backend).await;

	store.insert_user(technician("Mike Tech")).await.unwrap();
	store.insert_user(technician("Mike Tech")).await.unwrap();

	let found = store
		.find_users_by_role_and_name(Role::Technician, "Mike Tech")
		.await
		.unwrap();
	assert_eq!(found.len(), 2);
	assert_eq!(store.find_users_by_role(Role::Technician).await.unwrap().len(), 2);
	assert!(store.find_users_by_role(Role::Admin).await.unwrap().is_empty());
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_user_lookup_roundtrip(#[case] backend: Backend) {
	let store = open(backend).await;
	let user = store.insert_user(student("b@campus.edu")).await.unwrap();

	assert_eq!(store.find_user_by_id(user.id).await.unwrap(), Some(user.clone()));
	assert_eq!(
		store.find_user_by_email("b@campus.edu").await.unwrap(),
		Some(user)
	);
	assert_eq!(store.find_user_by_email("c@campus.edu").await.unwrap(), None);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_complaint_update_and_filters(#[case] backend: Backend) {
	let store = open(backend).await;
	let owner = store.insert_user(student("c@campus.edu")).await.unwrap();
	let tech = store.insert_user(technician("Sarah Fix")).await.unwrap();

	let mut older = Complaint::new(owner.id, "Plumbing", "Leak", "Sink", None);
	older.created_at -= Duration::seconds(10);
	let older = store.insert_complaint(older).await.unwrap();
	let newer = store
		.insert_complaint(Complaint::new(owner.id, "Electrical", "Flicker", "Lamp", None))
		.await
		.unwrap();

	let assigned = store
		.set_complaint_assignment(
			older.id,
			Some(tech.id),
			ComplaintStatus::InProgress,
			fixdesk_core::now_millis(),
		)
		.await
		.unwrap();

	assert_eq!(assigned.assigned_to, Some(tech.id));
	assert_eq!(assigned.title, "Leak");
	assert_eq!(store.find_complaint(older.id).await.unwrap(), Some(assigned));

	let mine = store
		.list_complaints(&ComplaintFilter::all().owned_by(owner.id))
		.await
		.unwrap();
	let ids: Vec<_> = mine.iter().map(|c| c.id).collect();
	assert_eq!(ids, vec![newer.id, older.id]);

	let open_for_tech = ComplaintFilter::all()
		.assigned_to(tech.id)
		.with_statuses(ComplaintStatus::OPEN);
	assert_eq!(store.count_complaints(&open_for_tech).await.unwrap(), 1);
	assert_eq!(
		store
			.count_complaints(&ComplaintFilter::all().with_status(ComplaintStatus::Pending))
			.await
			.unwrap(),
		1
	);
	assert_eq!(
		store.count_by_category().await.unwrap(),
		vec![("Electrical".to_string(), 1), ("Plumbing".to_string(), 1)]
	);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_update_missing_complaint(#[case] backend: Backend) {
	let store = open(backend).await;
	let ghost = uuid::Uuid::new_v4();
	let now = fixdesk_core::now_millis();

	let assignment = store
		.set_complaint_assignment(ghost, None, ComplaintStatus::Pending, now)
		.await;
	let status = store
		.set_complaint_status(ghost, &StatusChange::new(ComplaintStatus::Resolved, now))
		.await;

	assert!(matches!(assignment, Err(Error::NotFound(_))));
	assert!(matches!(status, Err(Error::NotFound(_))));
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_status_and_assignment_writes_are_disjoint(#[case] backend: Backend) {
	let store = open(backend).await;
	let owner = store.insert_user(student("f@campus.edu")).await.unwrap();
	let tech = store.insert_user(technician("Mike Tech")).await.unwrap();
	let complaint = store
		.insert_complaint(Complaint::new(owner.id, "Plumbing", "Leak", "", None))
		.await
		.unwrap();
	let now = fixdesk_core::now_millis();

	store
		.set_complaint_status(
			complaint.id,
			&StatusChange::new(ComplaintStatus::InProgress, now).with_notes("Parts ordered"),
		)
		.await
		.unwrap();
	// An assignment computed from an older read must not wipe the notes.
	store
		.set_complaint_assignment(complaint.id, Some(tech.id), ComplaintStatus::InProgress, now)
		.await
		.unwrap();
	let kept = store
		.set_complaint_status(complaint.id, &StatusChange::new(ComplaintStatus::Resolved, now))
		.await
		.unwrap();

	assert_eq!(kept.assigned_to, Some(tech.id));
	assert_eq!(kept.repair_notes.as_deref(), Some("Parts ordered"));
	assert_eq!(kept.status, ComplaintStatus::Resolved);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_status_write_checks_assignee_atomically(#[case] backend: Backend) {
	let store = open(backend).await;
	let owner = store.insert_user(student("g@campus.edu")).await.unwrap();
	let mike = store.insert_user(technician("Mike Tech")).await.unwrap();
	let sarah = store.insert_user(technician("Sarah Fix")).await.unwrap();
	let complaint = store
		.insert_complaint(Complaint::new(owner.id, "HVAC", "Cold", "", None))
		.await
		.unwrap();
	let now = fixdesk_core::now_millis();
	store
		.set_complaint_assignment(complaint.id, Some(sarah.id), ComplaintStatus::InProgress, now)
		.await
		.unwrap();

	let stale = store
		.set_complaint_status(
			complaint.id,
			&StatusChange::new(ComplaintStatus::Resolved, now)
				.with_notes("Fixed")
				.assigned_to(mike.id),
		)
		.await;

	assert!(matches!(stale, Err(Error::Authorization(_))));
	let stored = store.find_complaint(complaint.id).await.unwrap().unwrap();
	assert_eq!(stored.status, ComplaintStatus::InProgress);
	assert_eq!(stored.repair_notes, None);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn test_single_feedback_per_complaint(#[case] backend: Backend) {
	let store = open(backend).await;
	let owner = store.insert_user(student("d@campus.edu")).await.unwrap();
	let complaint = store
		.insert_complaint(Complaint::new(owner.id, "HVAC", "Too hot", "", None))
		.await
		.unwrap();

	let feedback = store
		.insert_feedback(Feedback::new(complaint.id, owner.id, 5, Some("Great".into())))
		.await
		.unwrap();
	let second = store
		.insert_feedback(Feedback::new(complaint.id, owner.id, 1, None))
		.await;

	assert!(matches!(second, Err(Error::Conflict(_))));
	assert_eq!(
		store.find_feedback_for_complaint(complaint.id).await.unwrap(),
		Some(feedback)
	);
}

#[rstest]
#[tokio::test]
async fn test_sqlite_file_persists_across_connections() {
	let dir = tempfile::tempdir().unwrap();
	let url = format!("sqlite://{}", dir.path().join("fixdesk.db").display());

	let user = {
		let store = SqliteStore::connect(&url).await.unwrap();
		store.insert_user(student("e@campus.edu")).await.unwrap()
	};

	let reopened = SqliteStore::connect(&url).await.unwrap();
	assert_eq!(reopened.find_user_by_id(user.id).await.unwrap(), Some(user));
}
