//! Complaint endpoints.
//!
//! Filing accepts either a JSON body or `multipart/form-data` with an
//! optional `image` file part; the other endpoints are JSON only.

use fixdesk_core::Result;
use fixdesk_http::{FormData, Request, Response};
use fixdesk_tracker::{AssignRequest, NewComplaint, StatusUpdate};
use std::sync::Arc;

use crate::context::{AppContext, id_param};

/// Room for the text fields and part headers around the image itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// `POST /api/complaints`
pub async fn create(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;

	let (input, stored_image) = if request.is_multipart() {
		read_form(&ctx, &request).await?
	} else {
		(request.json::<NewComplaint>()?, None)
	};

	match ctx.complaints.create(&identity, input).await {
		Ok(complaint) => Response::created().with_json(&complaint),
		Err(error) => {
			if let Some(stored) = stored_image
				&& let Err(cleanup) = ctx.uploads.delete_upload(&stored)
			{
				tracing::warn!(file = %stored, "Failed to remove orphaned upload: {}", cleanup);
			}
			Err(error)
		}
	}
}

async fn read_form(ctx: &AppContext, request: &Request) -> Result<(NewComplaint, Option<String>)> {
	let form = FormData::parse(request, ctx.uploads.max_size() + FORM_OVERHEAD_BYTES).await?;
	let text = |name: &str| form.field(name).unwrap_or_default().to_string();

	let mut input = NewComplaint {
		category: text("category"),
		title: text("title"),
		description: text("description"),
		image_path: None,
	};

	let stored = match form.file("image") {
		Some(image) => {
			let stored = ctx.uploads.handle_upload(&image.filename, &image.data)?;
			input.image_path = Some(format!("/uploads/{}", stored));
			Some(stored)
		}
		None => None,
	};

	Ok((input, stored))
}

/// `GET /api/complaints`
pub async fn list_all(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;
	Response::json(&ctx.complaints.list_all(&identity).await?)
}

/// `GET /api/complaints/user/{userId}`
pub async fn list_for_user(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;
	let user_id = id_param(&request, "userId", "User")?;
	Response::json(&ctx.complaints.list_for_user(&identity, user_id).await?)
}

/// `GET /api/complaints/assigned/{techId}`
pub async fn list_assigned(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;
	let technician_id = id_param(&request, "techId", "Technician")?;
	Response::json(&ctx.complaints.list_assigned(&identity, technician_id).await?)
}

/// `PUT /api/complaints/{id}/assign`
pub async fn assign(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;
	let complaint_id = id_param(&request, "id", "Complaint")?;
	let body: AssignRequest = request.json()?;
	Response::json(
		&ctx.complaints
			.assign(&identity, complaint_id, body.technician_id)
			.await?,
	)
}

/// `PUT /api/complaints/{id}/status`
pub async fn update_status(ctx: Arc<AppContext>, request: Request) -> Result<Response> {
	let identity = ctx.identity(&request)?;
	let complaint_id = id_param(&request, "id", "Complaint")?;
	let update: StatusUpdate = request.json()?;
	Response::json(
		&ctx.complaints
			.update_status(&identity, complaint_id, update)
			.await?,
	)
}
