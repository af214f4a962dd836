//! Shared application state handed to every view.

use chrono::Duration;
use fixdesk_auth::{Argon2Hasher, AuthService, Identity, JwtAuth, PasswordHasher};
use fixdesk_conf::Settings;
use fixdesk_core::{Error, Result};
use fixdesk_db::Store;
use fixdesk_http::{Request, UploadHandler};
use fixdesk_tracker::{ComplaintLifecycle, FeedbackRecorder, ReportAggregator};
use std::sync::Arc;
use uuid::Uuid;

/// Everything a request needs, built once at startup.
pub struct AppContext {
	pub settings: Settings,
	pub store: Arc<dyn Store>,
	pub auth: AuthService,
	pub complaints: ComplaintLifecycle,
	pub feedback: FeedbackRecorder,
	pub reports: ReportAggregator,
	pub uploads: UploadHandler,
}

impl AppContext {
	pub fn new(settings: Settings, store: Arc<dyn Store>, hasher: Arc<dyn PasswordHasher>) -> Self {
		// Out-of-range lifetimes surface as signing errors instead of panics.
		let ttl = Duration::try_days(settings.token_ttl_days).unwrap_or(Duration::MAX);
		let jwt = JwtAuth::new(settings.jwt_secret.as_bytes(), ttl);
		let uploads =
			UploadHandler::images(settings.upload_dir.clone()).with_max_size(settings.max_upload_bytes);

		Self {
			auth: AuthService::new(Arc::clone(&store), hasher, jwt),
			complaints: ComplaintLifecycle::new(Arc::clone(&store)),
			feedback: FeedbackRecorder::new(Arc::clone(&store)),
			reports: ReportAggregator::new(Arc::clone(&store)),
			uploads,
			store,
			settings,
		}
	}

	/// Open the configured store and build the context with production hashing.
	pub async fn from_settings(settings: Settings) -> Result<Self> {
		let store = fixdesk_db::open_store(&settings.database_url).await?;
		Ok(Self::new(settings, store, Arc::new(Argon2Hasher::new())))
	}

	/// The caller behind the request's bearer token.
	pub fn identity(&self, request: &Request) -> Result<Identity> {
		self.auth.authenticate_token(request.bearer_token())
	}
}

/// Parse a UUID path parameter. Malformed ids name nothing, so they are 404s.
pub(crate) fn id_param(request: &Request, name: &str, resource: &str) -> Result<Uuid> {
	request
		.path_param(name)?
		.parse()
		.map_err(|_| Error::NotFound(resource.to_string()))
}
