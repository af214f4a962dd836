//! Shutdown signalling shared by the accept loop and connection tasks.

use std::time::Duration;
use tokio::sync::broadcast;

/// Broadcasts a single shutdown notification to every subscriber.
///
/// The accept loop stops taking new connections when notified; each open
/// connection is asked to finish its current request and is dropped once the
/// grace period runs out.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
	sender: broadcast::Sender<()>,
	grace_period: Duration,
}

impl ShutdownCoordinator {
	/// # Examples
	///
	/// ```
	/// use fixdesk_server::ShutdownCoordinator;
	/// use std::time::Duration;
	///
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
	/// assert_eq!(coordinator.grace_period(), Duration::from_secs(30));
	/// ```
	pub fn new(grace_period: Duration) -> Self {
		let (sender, _) = broadcast::channel(1);
		Self {
			sender,
			grace_period,
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<()> {
		self.sender.subscribe()
	}

	/// Notify all subscribers. Calling this more than once is harmless.
	pub fn shutdown(&self) {
		// No receivers just means nothing is listening yet.
		let _ = self.sender.send(());
	}

	pub fn grace_period(&self) -> Duration {
		self.grace_period
	}

	/// Trigger [`shutdown`](Self::shutdown) when the process receives Ctrl+C or SIGTERM.
	pub fn shutdown_on_signal(&self) {
		let coordinator = self.clone();
		tokio::spawn(async move {
			shutdown_signal().await;
			coordinator.shutdown();
		});
	}
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
	let ctrl_c = async {
		match tokio::signal::ctrl_c().await {
			Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
			Err(e) => {
				tracing::error!("Failed to install Ctrl+C handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(unix)]
	let terminate = async {
		use tokio::signal::unix::{SignalKind, signal};
		match signal(SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
				tracing::info!("Received terminate signal, shutting down");
			}
			Err(e) => {
				tracing::error!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
