//! # fixdesk core
//!
//! Types shared by every fixdesk crate:
//!
//! - [`exception`]: the [`Error`] taxonomy and its HTTP status mapping
//! - [`models`]: users, complaints, feedback and their enumerations

pub mod exception;
pub mod models;

pub use exception::{Error, Result};
pub use models::{
	Complaint, ComplaintId, ComplaintStatus, Feedback, FeedbackId, PublicUser, Role, User, UserId,
	now_millis,
};
