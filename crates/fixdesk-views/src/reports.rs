use fixdesk_core::Result;
use fixdesk_http::{Request, Response};
use std::sync::Arc;

use crate::context::AppContext;

/// `GET /api/reports`
pub async fn summary(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;
	Response::json(&ctx.reports.build_report(&identity).await?)
}
