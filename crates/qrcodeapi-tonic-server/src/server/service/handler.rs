//! gRPC service implementation for QR code generation.
//!
//! [`QrService`] implements the `QRCode` service from `v1alpha1.proto`.
//! Requests are validated on the calling task, then handed to a pool of
//! workers that encode and render on the blocking thread pool.
//!
//! ## Responsibilities
//!
//! - Spawn and own the worker pool.
//! - Validate `Generate` requests before any work is queued.
//! - Bound concurrent generations with a semaphore.
//! - Cancel work whose caller has gone away (disconnect or deadline).
//! - Map failures to gRPC status codes and log internal ones.

use crate::server::{
    config::ServerConfig,
    pool::{manager::WorkerPool, request::WorkRequest, worker::worker_loop},
    telemetry::{
        decrement_requests_inflight, increment_request_errors, increment_requests,
        increment_requests_inflight, record_image_bytes, record_request_duration,
    },
};
use qrcodeapi::{GenerationRequest, GenerationResponse, validate};
use qrcodeapi_tonic_core::{
    Error,
    proto::{self, qr_code_server::QrCode},
};
use std::{
    sync::{Arc, atomic::AtomicUsize},
    time::Instant,
};
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

/// gRPC service that turns text into QR code images.
#[derive(Clone)]
pub struct QrService {
    config: ServerConfig,
    worker_pool: Arc<WorkerPool>,
    permits: Arc<Semaphore>,
}

impl QrService {
    /// Creates the service and spawns `num_workers` worker tasks.
    ///
    /// Each worker gets a channel with room for a single job. Every job
    /// carries one of `max_inflight` permits until its blocking work returns,
    /// so queued, running and abandoned jobs together never exceed the cap.
    pub fn new(config: ServerConfig) -> Self {
        let mut workers = Vec::with_capacity(config.num_workers);
        let shutdown_token = CancellationToken::new();
        let running = Arc::new(AtomicUsize::new(0));

        for worker_id in 0..config.num_workers {
            let (tx, rx) = mpsc::channel(1);
            workers.push(tx);
            tokio::spawn(worker_loop(worker_id, rx, Arc::clone(&running)));
        }

        let worker_pool = WorkerPool::new(
            workers,
            shutdown_token,
            config.shutdown_timeout,
            running,
        );

        Self {
            permits: Arc::new(Semaphore::new(config.max_inflight)),
            config,
            worker_pool: Arc::new(worker_pool),
        }
    }

    /// Initiates a graceful shutdown of the worker pool.
    ///
    /// New requests are refused, in-flight requests get up to the configured
    /// timeout to finish, and everything left is cancelled.
    pub async fn shutdown(&self) -> Result<(), Error> {
        let result = self.worker_pool.shutdown().await;
        self.permits.close();
        result
    }

    async fn process(&self, request: GenerationRequest) -> Result<GenerationResponse, Error> {
        let normalized = validate(&request, &self.config.limits)?;

        let _inflight = self.worker_pool.begin()?;
        let slot = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::ServiceShutdown)?;

        // Dropping this future (client disconnect, deadline) cancels the job.
        let cancelled = self.worker_pool.request_token();
        let _cancel_on_drop = cancelled.clone().drop_guard();

        let (tx, rx) = oneshot::channel();
        self.worker_pool
            .send_to_next_worker(WorkRequest::Generate {
                request: normalized,
                cancelled,
                slot,
                response: tx,
            })
            .await?;

        rx.await.map_err(|_| Error::ChannelError {
            context: "worker dropped the reply channel".into(),
        })?
    }
}

/// Decrements the in-flight gauge however the request ends.
struct InflightMetric;

impl InflightMetric {
    fn start() -> Self {
        increment_requests_inflight();
        Self
    }
}

impl Drop for InflightMetric {
    fn drop(&mut self) {
        decrement_requests_inflight();
    }
}

#[tonic::async_trait]
impl QrCode for QrService {
    /// Renders a QR code for `content` (or `url`).
    ///
    /// Validation and capacity failures are client errors and logged at
    /// debug level. Internal failures are logged with their details and the
    /// client only sees a generic `INTERNAL` status.
    #[tracing::instrument(
        skip_all,
        fields(
            content_len = req.get_ref().content.len(),
            url_len = req.get_ref().url.len(),
            width = req.get_ref().width,
            height = req.get_ref().height,
            accept = %req.get_ref().accept,
        )
    )]
    async fn generate(
        &self,
        req: Request<proto::Request>,
    ) -> Result<Response<proto::Response>, Status> {
        let start = Instant::now();
        increment_requests();
        let _inflight = InflightMetric::start();

        let result = self
            .process(req.into_inner().into())
            .await
            .and_then(proto::Response::try_from);
        record_request_duration(start.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(response) => {
                record_image_bytes(response.image.len(), &response.content_type);
                tracing::debug!(
                    content_type = %response.content_type,
                    width = response.width,
                    height = response.height,
                    bytes = response.image.len(),
                    "Rendered image"
                );
                Ok(Response::new(response))
            }
            Err(err) => {
                if err.is_internal() {
                    tracing::error!("Generation failed: {err}");
                } else {
                    tracing::debug!("Request rejected: {err}");
                }
                let status = Status::from(err);
                increment_request_errors(status.code());
                Err(status)
            }
        }
    }

    /// Returns the version of the running server.
    #[tracing::instrument(skip_all)]
    async fn version(&self, _req: Request<()>) -> Result<Response<String>, Status> {
        Ok(Response::new(env!("CARGO_PKG_VERSION").to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use qrcodeapi::Limits;
    use std::sync::atomic::Ordering;
    use tonic::Code;

    fn config() -> ServerConfig {
        ServerConfig {
            server_addr: "127.0.0.1:0".into(),
            uds: false,
            num_workers: 2,
            max_inflight: 4,
            limits: Limits::default(),
            request_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(1),
            keepalive_interval: Duration::from_secs(5),
            keepalive_timeout: Duration::from_secs(1),
        }
    }

    fn request(content: &str, width: i32, height: i32, accept: &str) -> Request<proto::Request> {
        Request::new(proto::Request {
            content: content.into(),
            url: String::new(),
            width,
            height,
            accept: accept.into(),
        })
    }

    #[tokio::test]
    async fn generate_returns_png() {
        let service = QrService::new(config());
        let response = service
            .generate(request("https://example.com", 200, 200, "image/png"))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.content_type, "image/png");
        assert_eq!((response.width, response.height), (200, 200));
        assert!(response.image.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn generate_defaults_dimensions_and_format() {
        let service = QrService::new(config());
        let response = service
            .generate(request("defaults", 0, 0, ""))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.content_type, "image/png");
        assert_eq!((response.width, response.height), (200, 200));
    }

    #[tokio::test]
    async fn generate_negotiates_accept_list() {
        let service = QrService::new(config());
        let response = service
            .generate(request("svg", 120, 120, "image/avif, image/svg+xml;q=0.9"))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.content_type, "image/svg+xml");
    }

    #[tokio::test]
    async fn empty_content_is_invalid_argument() {
        let service = QrService::new(config());
        let status = service
            .generate(request("", 100, 100, "image/png"))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn negative_width_is_invalid_argument() {
        let service = QrService::new(config());
        let status = service
            .generate(request("x", -1, 100, "image/png"))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn oversized_content_is_resource_exhausted() {
        let service = QrService::new(config());
        let status = service
            .generate(request(&"x".repeat(2954), 100, 100, "image/png"))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::ResourceExhausted);
    }

    #[tokio::test]
    async fn concurrent_requests_beyond_permits_all_complete() {
        let service = QrService::new(config());
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .generate(request(&format!("request {i}"), 150, 150, "image/gif"))
                        .await
                })
            })
            .collect();

        for task in tasks {
            let response = task.await.unwrap().unwrap().into_inner();
            assert_eq!(response.content_type, "image/gif");
        }
        assert_eq!(service.worker_pool.inflight(), 0);
    }

    #[tokio::test]
    async fn abandoned_requests_stay_within_the_inflight_cap() {
        let service = QrService::new(ServerConfig {
            num_workers: 1,
            max_inflight: 1,
            ..config()
        });

        let peak = Arc::new(AtomicUsize::new(0));
        let sampler = tokio::spawn({
            let pool = Arc::clone(&service.worker_pool);
            let peak = Arc::clone(&peak);
            async move {
                loop {
                    peak.fetch_max(pool.running_jobs(), Ordering::AcqRel);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        });

        for i in 0..8 {
            let content = format!("{i}{}", "q".repeat(2000));
            let call = service.generate(request(&content, 4096, 4096, "image/png"));
            assert!(
                tokio::time::timeout(Duration::from_millis(30), call)
                    .await
                    .is_err()
            );
        }

        tokio::time::timeout(Duration::from_secs(60), async {
            while service.worker_pool.running_jobs() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        sampler.abort();

        assert!(peak.load(Ordering::Acquire) <= 1);
        assert_eq!(service.permits.available_permits(), 1);
        assert_eq!(service.worker_pool.inflight(), 0);

        // The slot is usable again.
        let response = service
            .generate(request("after", 100, 100, "image/png"))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.content_type, "image/png");
    }

    #[tokio::test]
    async fn requests_after_shutdown_are_unavailable() {
        let service = QrService::new(config());
        service.shutdown().await.unwrap();

        let status = service
            .generate(request("late", 100, 100, "image/png"))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
    }

    #[tokio::test]
    async fn version_is_non_empty() {
        let service = QrService::new(config());
        let version = service
            .version(Request::new(()))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
        assert!(!version.is_empty());
    }
}
