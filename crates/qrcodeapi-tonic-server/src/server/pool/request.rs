use qrcodeapi::{GenerationResponse, NormalizedRequest};
use qrcodeapi_tonic_core::Error;
use tokio::sync::{OwnedSemaphorePermit, oneshot};
use tokio_util::sync::CancellationToken;

/// A message sent from the worker pool to an individual worker task.
#[derive(Debug)]
pub enum WorkRequest {
    /// Encode and render one validated request.
    ///
    /// - `request`: The validated request.
    /// - `cancelled`: Fires when the caller goes away or the service shuts
    ///   down. The worker then drops the job and any partial result.
    /// - `slot`: The admission permit. It moves into the blocking job and is
    ///   only released when that job returns, so a job whose caller already
    ///   left still counts against `MAX_INFLIGHT`.
    /// - `response`: Where the finished image (or error) is delivered.
    Generate {
        request: NormalizedRequest,
        cancelled: CancellationToken,
        slot: OwnedSemaphorePermit,
        response: oneshot::Sender<Result<GenerationResponse, Error>>,
    },

    /// Request the worker to shut down gracefully.
    ///
    /// - `response`: One-shot channel for acknowledging that the worker has
    ///   completed its shutdown routine.
    Shutdown { response: oneshot::Sender<()> },
}
