use fixdesk_auth::{LoginRequest, RegisterRequest};
use fixdesk_core::Result;
use fixdesk_http::{Request, Response};
use std::sync::Arc;

use crate::context::AppContext;

/// `POST /api/auth/register`
pub async fn register(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let payload: RegisterRequest = request.json()?;
	Response::json(&ctx.auth.register(payload).await?)
}

/// `POST /api/auth/login`
pub async fn login(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let payload: LoginRequest = request.json()?;
	Response::json(&ctx.auth.login(payload).await?)
}

/// `GET /api/technicians`
pub async fn technicians(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	ctx.identity(&request)?;
	Response::json(&ctx.auth.list_technicians().await?)
}
