use bytes::Bytes;
use fixdesk_core::Error;
use fixdesk_http::{Handler, Middleware, MiddlewareChain, Request, Response};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::shutdown::ShutdownCoordinator;

/// Default cap on buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Failed to bind {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// HTTP/1.1 server driving a [`Handler`].
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	middlewares: Vec<Arc<dyn Middleware>>,
	max_body_bytes: usize,
}

impl HttpServer {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			middlewares: Vec::new(),
			max_body_bytes: DEFAULT_MAX_BODY_BYTES,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// Requests with larger bodies are answered with 413 before reaching the handler.
	pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
		self.max_body_bytes = max_body_bytes;
		self
	}

	fn build_handler(&self) -> Arc<dyn Handler> {
		if self.middlewares.is_empty() {
			return self.handler.clone();
		}

		let mut chain = MiddlewareChain::new(self.handler.clone());
		for middleware in &self.middlewares {
			chain.add_middleware(middleware.clone());
		}
		Arc::new(chain)
	}

	/// Bind `addr` and serve until `coordinator` signals shutdown.
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		coordinator: ShutdownCoordinator,
	) -> Result<(), ServerError> {
		let listener = TcpListener::bind(addr)
			.await
			.map_err(|source| ServerError::Bind { addr, source })?;
		self.serve(listener, coordinator).await
	}

	/// Serve connections from an already bound listener.
	///
	/// After shutdown is signalled no new connections are accepted; open
	/// connections get the coordinator's grace period to finish.
	pub async fn serve(
		self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> Result<(), ServerError> {
		tracing::info!("Server listening on http://{}", listener.local_addr()?);

		let handler = self.build_handler();
		let mut shutdown_rx = coordinator.subscribe();
		let mut connections = JoinSet::new();

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = match result {
						Ok(accepted) => accepted,
						Err(e) => {
							tracing::warn!("Failed to accept connection: {}", e);
							continue;
						}
					};
					let service = RequestService {
						handler: handler.clone(),
						remote_addr,
						max_body_bytes: self.max_body_bytes,
					};
					connections.spawn(serve_connection(
						stream,
						service,
						coordinator.subscribe(),
						coordinator.grace_period(),
					));
				}
				Some(_) = connections.join_next(), if !connections.is_empty() => {}
				_ = shutdown_rx.recv() => {
					tracing::info!("Shutdown signal received, stopping server");
					break;
				}
			}
		}

		drop(listener);

		let drain = async { while connections.join_next().await.is_some() {} };
		if tokio::time::timeout(coordinator.grace_period(), drain)
			.await
			.is_err()
		{
			tracing::warn!(
				open = connections.len(),
				"Grace period elapsed, aborting open connections"
			);
			connections.abort_all();
		}

		tracing::info!("Server stopped");
		Ok(())
	}
}

async fn serve_connection(
	stream: TcpStream,
	service: RequestService,
	mut shutdown: broadcast::Receiver<()>,
	grace_period: Duration,
) {
	let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
	tokio::pin!(conn);

	tokio::select! {
		result = conn.as_mut() => {
			if let Err(err) = result {
				tracing::debug!("Error handling connection: {}", err);
			}
		}
		_ = shutdown.recv() => {
			conn.as_mut().graceful_shutdown();
			if tokio::time::timeout(grace_period, conn.as_mut()).await.is_err() {
				tracing::debug!("Connection did not close within the grace period");
			}
		}
	}
}

struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
	max_body_bytes: usize,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;
		let max_body_bytes = self.max_body_bytes;

		Box::pin(async move {
			let (parts, body) = req.into_parts();

			let body = match Limited::new(body, max_body_bytes).collect().await {
				Ok(collected) => collected.to_bytes(),
				Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
					let declared = parts
						.headers
						.get(hyper::header::CONTENT_LENGTH)
						.and_then(|v| v.to_str().ok())
						.and_then(|v| v.parse().ok())
						.unwrap_or(max_body_bytes + 1);
					return into_hyper(Response::from(Error::PayloadTooLarge(
						declared,
						max_body_bytes,
					)));
				}
				Err(e) => return Err(e),
			};

			let mut request = Request::new(
				parts.method,
				parts.uri,
				parts.version,
				parts.headers,
				body,
			);
			request.remote_addr = Some(remote_addr);

			let response = handler
				.handle(request)
				.await
				.unwrap_or_else(Response::from);

			into_hyper(response)
		})
	}
}

fn into_hyper(
	response: Response,
) -> Result<hyper::Response<Full<Bytes>>, Box<dyn std::error::Error + Send + Sync>> {
	let mut builder = hyper::Response::builder().status(response.status);
	for (key, value) in response.headers.iter() {
		builder = builder.header(key, value);
	}
	Ok(builder.body(Full::new(response.body))?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};

	struct Echo;

	#[async_trait::async_trait]
	impl Handler for Echo {
		async fn handle(&self, request: Request) -> fixdesk_core::Result<Response> {
			if request.path() == "/missing" {
				return Err(Error::NotFound("Complaint".into()));
			}
			Ok(Response::ok().with_body(request.body))
		}
	}

	async fn start(server: HttpServer) -> (SocketAddr, ShutdownCoordinator, tokio::task::JoinHandle<()>) {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let coordinator = ShutdownCoordinator::new(Duration::from_millis(200));
		let handle = {
			let coordinator = coordinator.clone();
			tokio::spawn(async move {
				server.serve(listener, coordinator).await.unwrap();
			})
		};
		(addr, coordinator, handle)
	}

	async fn send(addr: SocketAddr, raw: &str) -> String {
		let mut stream = TcpStream::connect(addr).await.unwrap();
		stream.write_all(raw.as_bytes()).await.unwrap();
		let mut buf = Vec::new();
		stream.read_to_end(&mut buf).await.unwrap();
		String::from_utf8_lossy(&buf).into_owned()
	}

	#[rstest]
	#[tokio::test]
	async fn test_round_trip_and_shutdown() {
		let (addr, coordinator, handle) = start(HttpServer::new(Arc::new(Echo))).await;

		let reply = send(
			addr,
			"POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
		)
		.await;

		assert!(reply.starts_with("HTTP/1.1 200"));
		assert!(reply.ends_with("hello"));

		coordinator.shutdown();
		handle.await.unwrap();
	}

	#[rstest]
	#[tokio::test]
	async fn test_handler_errors_become_json() {
		let (addr, coordinator, handle) = start(HttpServer::new(Arc::new(Echo))).await;

		let reply = send(addr, "GET /missing HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await;

		assert!(reply.starts_with("HTTP/1.1 404"));
		assert!(reply.contains(r#"{"msg":"Complaint not found"}"#));

		coordinator.shutdown();
		handle.await.unwrap();
	}

	#[rstest]
	#[tokio::test]
	async fn test_body_limit() {
		let server = HttpServer::new(Arc::new(Echo)).with_max_body_bytes(4);
		let (addr, coordinator, handle) = start(server).await;

		let reply = send(
			addr,
			"POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
		)
		.await;

		assert!(reply.starts_with("HTTP/1.1 413"));

		coordinator.shutdown();
		handle.await.unwrap();
	}
}
