use fixdesk_core::Result;
use fixdesk_http::{Request, Response};
use fixdesk_tracker::FeedbackRequest;
use std::sync::Arc;

use crate::context::AppContext;

/// `POST /api/feedback`
pub async fn submit(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;
	let body: FeedbackRequest = request.json()?;
	Response::created().with_json(&ctx.feedback.submit(&identity, body).await?)
}
