//! SQLite-backed store using sqlx.
//!
//! Ids are stored as TEXT, timestamps as INTEGER milliseconds since the epoch
//! and enums as their wire strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fixdesk_core::{
	Complaint, ComplaintId, ComplaintStatus, Error, Feedback, Result, Role, User, UserId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

use crate::store::{ComplaintFilter, StatusChange, Store};

const SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS users (
		id TEXT PRIMARY KEY,
		name TEXT NOT NULL,
		email TEXT UNIQUE,
		password_hash TEXT NOT NULL,
		role TEXT NOT NULL,
		department TEXT
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS complaints (
		id TEXT PRIMARY KEY,
		user_id TEXT NOT NULL REFERENCES users(id),
		category TEXT NOT NULL,
		title TEXT NOT NULL,
		description TEXT NOT NULL,
		image_path TEXT,
		status TEXT NOT NULL,
		assigned_to TEXT REFERENCES users(id),
		repair_notes TEXT,
		created_at INTEGER NOT NULL,
		updated_at INTEGER
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_complaints_user_id ON complaints(user_id)",
	"CREATE INDEX IF NOT EXISTS idx_complaints_assigned_to ON complaints(assigned_to)",
	r#"
	CREATE TABLE IF NOT EXISTS feedback (
		id TEXT PRIMARY KEY,
		complaint_id TEXT NOT NULL UNIQUE REFERENCES complaints(id),
		user_id TEXT NOT NULL REFERENCES users(id),
		rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
		comments TEXT,
		created_at INTEGER NOT NULL
	)
	"#,
];

const COMPLAINT_COLUMNS: &str = "id, user_id, category, title, description, image_path, status, \
	assigned_to, repair_notes, created_at, updated_at";

/// [`Store`] backed by a SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
	pool: SqlitePool,
}

impl SqliteStore {
	/// Connect to `url` (e.g. `sqlite://fixdesk.db` or `sqlite::memory:`) and
	/// create the schema if needed.
	///
	/// An in-memory database exists per connection, so it is given a single
	/// connection that is never recycled.
	pub async fn connect(url: &str) -> Result<Self> {
		let options = SqliteConnectOptions::from_str(url)
			.map_err(db_error)?
			.create_if_missing(true)
			.foreign_keys(true);

		let pool_options = if url.contains(":memory:") {
			SqlitePoolOptions::new()
				.max_connections(1)
				.min_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
		} else {
			SqlitePoolOptions::new().max_connections(5)
		};

		let pool = pool_options.connect_with(options).await.map_err(db_error)?;
		let store = Self { pool };
		store.create_schema().await?;
		tracing::info!("Connected to SQLite database");
		Ok(store)
	}

	pub async fn create_schema(&self) -> Result<()> {
		for statement in SCHEMA {
			sqlx::query(statement)
				.execute(&self.pool)
				.await
				.map_err(db_error)?;
		}
		Ok(())
	}

	fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ComplaintFilter) {
		builder.push(" WHERE 1 = 1");
		if let Some(owner) = filter.owner {
			builder.push(" AND user_id = ").push_bind(owner.to_string());
		}
		if let Some(assignee) = filter.assignee {
			builder
				.push(" AND assigned_to = ")
				.push_bind(assignee.to_string());
		}
		if let Some(statuses) = &filter.statuses {
			if statuses.is_empty() {
				builder.push(" AND 1 = 0");
			} else {
				builder.push(" AND status IN (");
				let mut separated = builder.separated(", ");
				for status in statuses {
					separated.push_bind(status.as_str());
				}
				separated.push_unseparated(")");
			}
		}
	}
}

impl SqliteStore {
	async fn stored_complaint(&self, id: ComplaintId) -> Result<Complaint> {
		self.find_complaint(id)
			.await?
			.ok_or_else(|| Error::NotFound("Complaint".to_string()))
	}
}

fn db_error(e: sqlx::Error) -> Error {
	Error::Database(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
	matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn parse_id(value: &str) -> Result<Uuid> {
	Uuid::parse_str(value).map_err(|e| Error::Database(format!("Corrupt id {}: {}", value, e)))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
	DateTime::from_timestamp_millis(millis)
		.ok_or_else(|| Error::Database(format!("Corrupt timestamp {}", millis)))
}

#[derive(FromRow)]
struct UserRow {
	id: String,
	name: String,
	email: Option<String>,
	password_hash: String,
	role: String,
	department: Option<String>,
}

impl TryFrom<UserRow> for User {
	type Error = Error;

	fn try_from(row: UserRow) -> Result<Self> {
		Ok(User {
			id: parse_id(&row.id)?,
			name: row.name,
			email: row.email,
			password_hash: row.password_hash,
			role: row.role.parse()?,
			department: row.department,
		})
	}
}

#[derive(FromRow)]
struct ComplaintRow {
	id: String,
	user_id: String,
	category: String,
	title: String,
	description: String,
	image_path: Option<String>,
	status: String,
	assigned_to: Option<String>,
	repair_notes: Option<String>,
	created_at: i64,
	updated_at: Option<i64>,
}

impl TryFrom<ComplaintRow> for Complaint {
	type Error = Error;

	fn try_from(row: ComplaintRow) -> Result<Self> {
		Ok(Complaint {
			id: parse_id(&row.id)?,
			user_id: parse_id(&row.user_id)?,
			category: row.category,
			title: row.title,
			description: row.description,
			image_path: row.image_path,
			status: row.status.parse::<ComplaintStatus>()?,
			assigned_to: row.assigned_to.as_deref().map(parse_id).transpose()?,
			repair_notes: row.repair_notes,
			created_at: from_millis(row.created_at)?,
			updated_at: row.updated_at.map(from_millis).transpose()?,
		})
	}
}

#[derive(FromRow)]
struct FeedbackRow {
	id: String,
	complaint_id: String,
	user_id: String,
	rating: i64,
	comments: Option<String>,
	created_at: i64,
}

impl TryFrom<FeedbackRow> for Feedback {
	type Error = Error;

	fn try_from(row: FeedbackRow) -> Result<Self> {
		Ok(Feedback {
			id: parse_id(&row.id)?,
			complaint_id: parse_id(&row.complaint_id)?,
			user_id: parse_id(&row.user_id)?,
			rating: u8::try_from(row.rating)
				.map_err(|_| Error::Database(format!("Corrupt rating {}", row.rating)))?,
			comments: row.comments,
			created_at: from_millis(row.created_at)?,
		})
	}
}

#[async_trait]
impl Store for SqliteStore {
	async fn insert_user(&self, user: User) -> Result<User> {
		let result = sqlx::query(
			"INSERT INTO users (id, name, email, password_hash, role, department) \
			 VALUES (?, ?, ?, ?, ?, ?)",
		)
		.bind(user.id.to_string())
		.bind(&user.name)
		.bind(&user.email)
		.bind(&user.password_hash)
		.bind(user.role.as_str())
		.bind(&user.department)
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => {
				tracing::debug!(user_id = %user.id, role = %user.role, "Inserted user");
				Ok(user)
			}
			Err(e) if is_unique_violation(&e) => {
				Err(Error::Conflict("Email already exists".to_string()))
			}
			Err(e) => Err(db_error(e)),
		}
	}

	async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
		sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await
			.map_err(db_error)?
			.map(User::try_from)
			.transpose()
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
		sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
			.bind(email)
			.fetch_optional(&self.pool)
			.await
			.map_err(db_error)?
			.map(User::try_from)
			.transpose()
	}

	async fn find_users_by_role(&self, role: Role) -> Result<Vec<User>> {
		sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE role = ? ORDER BY rowid")
			.bind(role.as_str())
			.fetch_all(&self.pool)
			.await
			.map_err(db_error)?
			.into_iter()
			.map(User::try_from)
			.collect()
	}

	async fn find_users_by_role_and_name(&self, role: Role, name: &str) -> Result<Vec<User>> {
		sqlx::query_as::<_, UserRow>(
			"SELECT * FROM users WHERE role = ? AND name = ? ORDER BY rowid",
		)
		.bind(role.as_str())
		.bind(name)
		.fetch_all(&self.pool)
		.await
		.map_err(db_error)?
		.into_iter()
		.map(User::try_from)
		.collect()
	}

	async fn insert_complaint(&self, complaint: Complaint) -> Result<Complaint> {
		sqlx::query(&format!(
			"INSERT INTO complaints ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
			COMPLAINT_COLUMNS
		))
		.bind(complaint.id.to_string())
		.bind(complaint.user_id.to_string())
		.bind(&complaint.category)
		.bind(&complaint.title)
		.bind(&complaint.description)
		.bind(&complaint.image_path)
		.bind(complaint.status.as_str())
		.bind(complaint.assigned_to.map(|id| id.to_string()))
		.bind(&complaint.repair_notes)
		.bind(complaint.created_at.timestamp_millis())
		.bind(complaint.updated_at.map(|t| t.timestamp_millis()))
		.execute(&self.pool)
		.await
		.map_err(db_error)?;

		tracing::debug!(complaint_id = %complaint.id, "Inserted complaint");
		Ok(complaint)
	}

	async fn find_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>> {
		sqlx::query_as::<_, ComplaintRow>(&format!(
			"SELECT {} FROM complaints WHERE id = ?",
			COMPLAINT_COLUMNS
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await
		.map_err(db_error)?
		.map(Complaint::try_from)
		.transpose()
	}

	async fn set_complaint_assignment(
		&self,
		id: ComplaintId,
		assignee: Option<UserId>,
		status: ComplaintStatus,
		updated_at: DateTime<Utc>,
	) -> Result<Complaint> {
		let result = sqlx::query(
			"UPDATE complaints SET assigned_to = ?, status = ?, updated_at = ? WHERE id = ?",
		)
		.bind(assignee.map(|id| id.to_string()))
		.bind(status.as_str())
		.bind(updated_at.timestamp_millis())
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(db_error)?;

		if result.rows_affected() == 0 {
			return Err(Error::NotFound("Complaint".to_string()));
		}
		tracing::debug!(complaint_id = %id, assignee = ?assignee, "Updated assignment");
		self.stored_complaint(id).await
	}

	async fn set_complaint_status(
		&self,
		id: ComplaintId,
		change: &StatusChange,
	) -> Result<Complaint> {
		let required = change.required_assignee.map(|id| id.to_string());
		let result = sqlx::query(
			"UPDATE complaints SET status = ?, repair_notes = COALESCE(?, repair_notes), \
			 updated_at = ? WHERE id = ? AND (? IS NULL OR assigned_to = ?)",
		)
		.bind(change.status.as_str())
		.bind(&change.repair_notes)
		.bind(change.updated_at.timestamp_millis())
		.bind(id.to_string())
		.bind(&required)
		.bind(&required)
		.execute(&self.pool)
		.await
		.map_err(db_error)?;

		if result.rows_affected() == 0 {
			return match self.find_complaint(id).await? {
				Some(_) => Err(Error::Authorization("Access denied".to_string())),
				None => Err(Error::NotFound("Complaint".to_string())),
			};
		}
		tracing::debug!(complaint_id = %id, status = %change.status, "Updated status");
		self.stored_complaint(id).await
	}

	async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
		let mut builder = QueryBuilder::<Sqlite>::new(format!(
			"SELECT {} FROM complaints",
			COMPLAINT_COLUMNS
		));
		Self::push_filter(&mut builder, filter);
		builder.push(" ORDER BY created_at DESC, rowid DESC");

		builder
			.build_query_as::<ComplaintRow>()
			.fetch_all(&self.pool)
			.await
			.map_err(db_error)?
			.into_iter()
			.map(Complaint::try_from)
			.collect()
	}

	async fn count_complaints(&self, filter: &ComplaintFilter) -> Result<u64> {
		let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM complaints");
		Self::push_filter(&mut builder, filter);

		let count: i64 = builder
			.build_query_scalar()
			.fetch_one(&self.pool)
			.await
			.map_err(db_error)?;
		Ok(count as u64)
	}

	async fn count_by_category(&self) -> Result<Vec<(String, u64)>> {
		let rows: Vec<(String, i64)> = sqlx::query_as(
			"SELECT category, COUNT(*) FROM complaints GROUP BY category ORDER BY category",
		)
		.fetch_all(&self.pool)
		.await
		.map_err(db_error)?;

		Ok(rows
			.into_iter()
			.map(|(category, count)| (category, count as u64))
			.collect())
	}

	async fn insert_feedback(&self, feedback: Feedback) -> Result<Feedback> {
		let result = sqlx::query(
			"INSERT INTO feedback (id, complaint_id, user_id, rating, comments, created_at) \
			 VALUES (?, ?, ?, ?, ?, ?)",
		)
		.bind(feedback.id.to_string())
		.bind(feedback.complaint_id.to_string())
		.bind(feedback.user_id.to_string())
		.bind(i64::from(feedback.rating))
		.bind(&feedback.comments)
		.bind(feedback.created_at.timestamp_millis())
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => Ok(feedback),
			Err(e) if is_unique_violation(&e) => Err(Error::Conflict(
				"Feedback already submitted for this complaint".to_string(),
			)),
			Err(e) => Err(db_error(e)),
		}
	}

	async fn find_feedback_for_complaint(
		&self,
		complaint_id: ComplaintId,
	) -> Result<Option<Feedback>> {
		sqlx::query_as::<_, FeedbackRow>("SELECT * FROM feedback WHERE complaint_id = ?")
			.bind(complaint_id.to_string())
			.fetch_optional(&self.pool)
			.await
			.map_err(db_error)?
			.map(Feedback::try_from)
			.transpose()
	}
}
