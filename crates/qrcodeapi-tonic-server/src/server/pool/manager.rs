//! Asynchronous worker pool for QR generation.
//!
//! [`WorkerPool`] owns the senders of a fixed set of workers, distributes
//! jobs round-robin, counts requests in flight and jobs still running on the
//! blocking pool, and coordinates shutdown via a shared [`CancellationToken`]. Each worker has its own bounded
//! [`mpsc::Receiver`], so there is no shared queue to lock.

use crate::server::pool::request::WorkRequest;
use core::time::Duration;
use qrcodeapi_tonic_core::Error;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// A cooperative pool of asynchronous workers that process [`WorkRequest`]s.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
    accepting: AtomicBool,
    inflight: AtomicUsize,
    running: Arc<AtomicUsize>,
}

/// Marks one request as in flight until dropped.
pub struct InflightGuard<'a> {
    pool: &'a WorkerPool,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.pool.inflight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl WorkerPool {
    /// `running` must be the counter handed to every worker's
    /// [`worker_loop`](crate::server::pool::worker::worker_loop).
    pub const fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        shutdown_timeout: Duration,
        running: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
            shutdown_timeout,
            accepting: AtomicBool::new(true),
            inflight: AtomicUsize::new(0),
            running,
        }
    }

    /// Returns the index of the next worker to receive work (round-robin).
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// Jobs executing on the blocking pool, whether or not anyone still waits
    /// for them.
    pub fn running_jobs(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    async fn wait_until_idle(&self, budget: Duration) -> bool {
        timeout(budget, async {
            while self.inflight() > 0 || self.running_jobs() > 0 {
                sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Registers a new request.
    ///
    /// # Errors
    ///
    /// [`Error::ServiceShutdown`] once shutdown has started.
    pub fn begin(&self) -> Result<InflightGuard<'_>, Error> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(Error::ServiceShutdown);
        }
        self.inflight.fetch_add(1, Ordering::AcqRel);
        Ok(InflightGuard { pool: self })
    }

    /// A token cancelled when either the caller or the whole pool cancels.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown_token.child_token()
    }

    /// Sends a [`WorkRequest`] to the next worker in the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The service is shutting down (`shutdown_token` was cancelled).
    /// - The worker's channel is closed.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<(), Error> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        match worker.send(request).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Refuses new requests.
    /// - Waits up to `shutdown_timeout` for in-flight requests and running
    ///   jobs to finish.
    /// - Cancels whatever is still running and waits up to `shutdown_timeout`
    ///   again for cancelled jobs to stop.
    /// - Sends [`WorkRequest::Shutdown`] to each worker and waits (up to 3
    ///   seconds per worker) for acknowledgements.
    pub async fn shutdown(&self) -> Result<(), Error> {
        // === Phase 0: Stop accepting new requests ===
        tracing::info!("Refusing new requests");
        self.accepting.store(false, Ordering::Release);

        // === Phase 1: Wait for in-flight requests to drain ===
        tracing::info!(
            "Draining in-flight requests ({} active, {} jobs running)",
            self.inflight(),
            self.running_jobs()
        );
        if self.wait_until_idle(self.shutdown_timeout).await {
            tracing::debug!("All in-flight requests drained");
        } else {
            tracing::warn!(
                "Graceful drain timed out ({} requests still active)",
                self.inflight()
            );
        }

        // === Phase 2: Cancel any remaining work ===
        tracing::debug!("Cancelling remaining work via shutdown token");
        self.shutdown_token.cancel();
        if !self.wait_until_idle(self.shutdown_timeout).await {
            tracing::warn!(
                "{} cancelled jobs still running on the blocking pool",
                self.running_jobs()
            );
        }

        // === Phase 3: Notify workers to shut down ===
        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::error!("Failed to send shutdown to worker {i}: {e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        let timeout_futures = shutdown_handles.into_iter().map(|(i, rx)| async move {
            match timeout(Duration::from_secs(3), rx).await {
                Ok(Ok(())) => tracing::trace!("Worker {i} shutdown acknowledged"),
                Ok(Err(e)) => tracing::error!("Worker {i} returned error: {e}"),
                Err(_) => tracing::warn!("Worker {i} shutdown timed out"),
            }
        });

        futures::future::join_all(timeout_futures).await;

        tracing::info!("Worker pool shutdown complete");

        Ok(())
    }
}
