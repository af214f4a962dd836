use fixdesk_auth::Identity;
use fixdesk_core::{ComplaintId, Error, Feedback, Result};
use fixdesk_db::Store;
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /api/feedback`.
///
/// `rating` is read as a plain integer so out-of-range values surface as a
/// validation message instead of a decoding failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
	pub complaint_id: ComplaintId,
	pub rating: i64,
	#[serde(default)]
	pub comments: Option<String>,
}

/// Records the submitter's rating of how a complaint was handled.
pub struct FeedbackRecorder {
	store: Arc<dyn Store>,
}

impl FeedbackRecorder {
	pub fn new(store: Arc<dyn Store>) -> Self {
		Self { store }
	}

	/// Attach feedback to a complaint the caller filed.
	///
	/// Checked in order: the complaint exists, the rating is in range, the
	/// caller owns the complaint, and no feedback was left before.
	pub async fn submit(&self, identity: &Identity, request: FeedbackRequest) -> Result<Feedback> {
		let complaint = self
			.store
			.find_complaint(request.complaint_id)
			.await?
			.ok_or_else(|| Error::NotFound("Complaint".to_string()))?;

		let rating = u8::try_from(request.rating)
			.ok()
			.filter(|r| (Feedback::MIN_RATING..=Feedback::MAX_RATING).contains(r))
			.ok_or_else(|| {
				Error::Validation(format!(
					"Rating must be between {} and {}",
					Feedback::MIN_RATING,
					Feedback::MAX_RATING
				))
			})?;

		if !identity.is(complaint.user_id) {
			return Err(Error::Authorization("Access denied".to_string()));
		}

		let comments = request
			.comments
			.map(|c| c.trim().to_string())
			.filter(|c| !c.is_empty());
		let feedback = self
			.store
			.insert_feedback(Feedback::new(complaint.id, identity.user_id, rating, comments))
			.await?;
		tracing::info!(complaint_id = %complaint.id, rating, "Feedback recorded");
		Ok(feedback)
	}
}
