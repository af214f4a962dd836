//! # fixdesk tracker
//!
//! The complaint workflow on top of a [`fixdesk_db::Store`]:
//!
//! - [`lifecycle`]: filing, assignment, status changes and role-scoped listings
//! - [`feedback`]: one rating per complaint from its submitter
//! - [`reports`]: status counts, per-category counts and mean resolution time
//!
//! Every operation takes the caller's [`fixdesk_auth::Identity`] and applies
//! its own role and ownership checks.

pub mod feedback;
pub mod lifecycle;
pub mod reports;

pub use feedback::{FeedbackRecorder, FeedbackRequest};
pub use lifecycle::{
	AssignRequest, ComplaintLifecycle, ComplaintView, NewComplaint, StatusUpdate, UserSummary,
};
pub use reports::{CategoryCount, Report, ReportAggregator};
