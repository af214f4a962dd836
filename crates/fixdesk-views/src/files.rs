//! Public, unauthenticated endpoints: stored photos and the health check.

use fixdesk_core::Result;
use fixdesk_http::{Request, Response, content_type_for};
use serde_json::json;
use std::sync::Arc;

use crate::context::AppContext;

/// `GET /uploads/{file}`
pub async fn serve_upload(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let filename = request.path_param("file")?;
	let data = ctx.uploads.read(&filename)?;

	Ok(Response::ok()
		.with_header("Content-Type", content_type_for(&filename))
		.with_header("Cache-Control", "public, max-age=86400")
		.with_body(data))
}

/// `GET /health`
pub async fn health(_ctx: Arc<AppContext>, _request: Request) -> Result<Response> {
	Response::json(&json!({ "status": "ok" }))
}
