//! The URL table of the API.

use fixdesk_core::Result;
use fixdesk_http::{Request, Response};
use fixdesk_urls::Router;
use hyper::Method;
use std::future::Future;
use std::sync::Arc;

use crate::context::AppContext;
use crate::{accounts, complaints, feedback, files, reports};

/// Close a view over the shared context.
fn bind<F, Fut>(ctx: &Arc<AppContext>, view: F) -> impl Fn(Request) -> Fut + Send + Sync + 'static
where
	F: Fn(Arc<AppContext>, Request) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Response>> + Send + 'static,
{
	let ctx = Arc::clone(ctx);
	move |request| view(Arc::clone(&ctx), request)
}

/// Every route the service answers.
///
/// | Method | Path |
/// |---|---|
/// | POST | `/api/auth/register` |
/// | POST | `/api/auth/login` |
/// | POST, GET | `/api/complaints` |
/// | GET | `/api/complaints/user/{userId}` |
/// | GET | `/api/complaints/assigned/{techId}` |
/// | PUT | `/api/complaints/{id}/assign` |
/// | PUT | `/api/complaints/{id}/status` |
/// | POST | `/api/feedback` |
/// | GET | `/api/reports` |
/// | GET | `/api/technicians` |
/// | GET | `/uploads/{file}` |
/// | GET | `/health` |
pub fn routes(ctx: Arc<AppContext>) -> Result<Router> {
	let router = Router::new()
		.function(Method::POST, "/api/auth/register", bind(&ctx, accounts::register))?
		.function(Method::POST, "/api/auth/login", bind(&ctx, accounts::login))?
		.function(Method::POST, "/api/complaints", bind(&ctx, complaints::create))?
		.function(Method::GET, "/api/complaints", bind(&ctx, complaints::list_all))?
		.function(
			Method::GET,
			"/api/complaints/user/{userId}",
			bind(&ctx, complaints::list_for_user),
		)?
		.function(
			Method::GET,
			"/api/complaints/assigned/{techId}",
			bind(&ctx, complaints::list_assigned),
		)?
		.function(
			Method::PUT,
			"/api/complaints/{id}/assign",
			bind(&ctx, complaints::assign),
		)?
		.function(
			Method::PUT,
			"/api/complaints/{id}/status",
			bind(&ctx, complaints::update_status),
		)?
		.function(Method::POST, "/api/feedback", bind(&ctx, feedback::submit))?
		.function(Method::GET, "/api/reports", bind(&ctx, reports::summary))?
		.function(Method::GET, "/api/technicians", bind(&ctx, accounts::technicians))?
		.function(Method::GET, "/uploads/{file}", bind(&ctx, files::serve_upload))?
		.function(Method::GET, "/health", bind(&ctx, files::health))?;

	tracing::debug!(routes = router.routes().len(), "Built API routes");
	Ok(router)
}
