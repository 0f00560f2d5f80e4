use crate::server::pool::request::WorkRequest;
use qrcodeapi::{GenerationResponse, NormalizedRequest, generate_until};
use qrcodeapi_tonic_core::Error;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::{OwnedSemaphorePermit, mpsc};
use tokio_util::sync::CancellationToken;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// Encoding and rendering are CPU-bound, so each job runs on the blocking
/// thread pool while the worker waits for either the result or cancellation.
/// A worker handles one job at a time and runs until it receives
/// [`WorkRequest::Shutdown`] or its channel closes.
///
/// `running` counts jobs currently executing on the blocking pool, including
/// cancelled ones that have not reached a checkpoint yet.
pub async fn worker_loop(
    worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    running: Arc<AtomicUsize>,
) {
    tracing::trace!("Worker {worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Generate {
                request,
                cancelled,
                slot,
                response,
            } => {
                if cancelled.is_cancelled() || response.is_closed() {
                    tracing::debug!("Worker {worker_id} skipping abandoned request");
                    let _ = response.send(Err(Error::RequestCancelled));
                    continue;
                }

                let job = RunningJob::start(&running, slot);
                let result = run_cancellable(request, &cancelled, job).await;
                if response.send(result).is_err() {
                    tracing::debug!("Worker {worker_id} finished a request nobody waits for");
                }
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}

/// A job on the blocking pool. Holds the request's admission slot and counts
/// towards `running` until dropped at the end of the blocking closure.
struct RunningJob {
    running: Arc<AtomicUsize>,
    _slot: OwnedSemaphorePermit,
}

impl RunningJob {
    fn start(running: &Arc<AtomicUsize>, slot: OwnedSemaphorePermit) -> Self {
        running.fetch_add(1, Ordering::AcqRel);
        Self {
            running: Arc::clone(running),
            _slot: slot,
        }
    }
}

impl Drop for RunningJob {
    // The counter drops before the permit field, so a free slot never
    // coexists with a job still counted as running.
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Runs one job on the blocking pool.
///
/// If `cancelled` fires first the caller gets [`Error::RequestCancelled`]
/// right away. The blocking job notices the token at its next stage boundary,
/// drops whatever it built so far and only then gives its slot back.
async fn run_cancellable(
    request: NormalizedRequest,
    cancelled: &CancellationToken,
    job: RunningJob,
) -> Result<GenerationResponse, Error> {
    let span = tracing::Span::current();
    let token = cancelled.clone();
    let task = tokio::task::spawn_blocking(move || {
        let _enter = span.enter();
        let _job = job;
        generate_until(&request, || token.is_cancelled())
    });

    tokio::select! {
        () = cancelled.cancelled() => Err(Error::RequestCancelled),
        joined = task => match joined {
            Ok(result) => result.map_err(Error::from),
            Err(e) => Err(Error::from(qrcodeapi::Error::InternalEncoding {
                context: format!("generation task failed: {e}"),
            })),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use qrcodeapi::{GenerationRequest, Limits, validate};
    use tokio::sync::{Semaphore, oneshot};

    fn normalized(content: &str, side: i32) -> NormalizedRequest {
        let req = GenerationRequest {
            content: content.into(),
            width: side,
            height: side,
            ..Default::default()
        };
        validate(&req, &Limits::default()).unwrap()
    }

    async fn slot() -> OwnedSemaphorePermit {
        Arc::new(Semaphore::new(1)).acquire_owned().await.unwrap()
    }

    #[tokio::test]
    async fn generates_then_acknowledges_shutdown() {
        let (tx, rx) = mpsc::channel(1);
        let running = Arc::new(AtomicUsize::new(0));
        let handle = tokio::spawn(worker_loop(0, rx, Arc::clone(&running)));

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkRequest::Generate {
            request: normalized("worker", 100),
            cancelled: CancellationToken::new(),
            slot: slot().await,
            response: reply_tx,
        })
        .await
        .unwrap();
        let image = reply_rx.await.unwrap().unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!((image.width, image.height), (100, 100));
        assert_eq!(running.load(Ordering::Acquire), 0);

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(WorkRequest::Shutdown { response: ack_tx })
            .await
            .unwrap();
        ack_rx.await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_work_is_skipped() {
        let (tx, rx) = mpsc::channel(1);
        let running = Arc::new(AtomicUsize::new(0));
        tokio::spawn(worker_loop(1, rx, Arc::clone(&running)));

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkRequest::Generate {
            request: normalized("never rendered", 100),
            cancelled,
            slot: slot().await,
            response: reply_tx,
        })
        .await
        .unwrap();
        assert!(matches!(
            reply_rx.await.unwrap(),
            Err(Error::RequestCancelled)
        ));
        assert_eq!(running.load(Ordering::Acquire), 0);
    }

    #[tokio::test]
    async fn capacity_errors_are_returned() {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(worker_loop(2, rx, Arc::new(AtomicUsize::new(0))));

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkRequest::Generate {
            request: normalized(&"x".repeat(3000), 100),
            cancelled: CancellationToken::new(),
            slot: slot().await,
            response: reply_tx,
        })
        .await
        .unwrap();
        assert!(matches!(
            reply_rx.await.unwrap(),
            Err(Error::Generation(qrcodeapi::Error::ContentTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn cancelled_job_keeps_its_slot_until_it_stops() {
        let (tx, rx) = mpsc::channel(1);
        let running = Arc::new(AtomicUsize::new(0));
        tokio::spawn(worker_loop(3, rx, Arc::clone(&running)));

        let permits = Arc::new(Semaphore::new(1));
        let cancelled = CancellationToken::new();
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkRequest::Generate {
            request: normalized(&"q".repeat(2000), 4096),
            cancelled: cancelled.clone(),
            slot: Arc::clone(&permits).acquire_owned().await.unwrap(),
            response: reply_tx,
        })
        .await
        .unwrap();

        while running.load(Ordering::Acquire) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        cancelled.cancel();
        assert!(matches!(
            reply_rx.await.unwrap(),
            Err(Error::RequestCancelled)
        ));

        tokio::time::timeout(Duration::from_secs(60), async {
            loop {
                // Read the slot first: once it is free the job must be gone.
                let free = permits.available_permits();
                let still_running = running.load(Ordering::Acquire);
                if free == 1 {
                    assert_eq!(still_running, 0);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }
}
