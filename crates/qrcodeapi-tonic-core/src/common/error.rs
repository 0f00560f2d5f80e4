//! Error type for the QR code service.
//!
//! `From<Error> for tonic::Status` is the one place service errors become
//! status codes:
//!
//! | Error                              | Status               |
//! |------------------------------------|----------------------|
//! | `Generation(Validation)`           | `INVALID_ARGUMENT`   |
//! | `Generation(ContentTooLarge)`      | `RESOURCE_EXHAUSTED` |
//! | `Generation(UnsupportedFormat)`    | `UNIMPLEMENTED`      |
//! | `Generation(InternalEncoding)`     | `INTERNAL`           |
//! | `Generation(Cancelled)`            | `CANCELLED`          |
//! | `ChannelError`                     | `INTERNAL`           |
//! | `RequestCancelled`                 | `CANCELLED`          |
//! | `ServiceShutdown`                  | `UNAVAILABLE`        |
//!
//! Internal failures carry a generic message only; callers log the details
//! before converting.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the QR code service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// Internal channel send/receive failure (closed worker channel, dropped
    /// reply).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The generation pipeline rejected the request or failed.
    #[error(transparent)]
    Generation(#[from] qrcodeapi::Error),

    /// The client went away before a result was produced.
    #[error("Request cancelled by client")]
    RequestCancelled,

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    /// Whether this error points at a server-side defect.
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::ChannelError { .. } => true,
            Self::Generation(err) => !err.is_client_error(),
            Self::RequestCancelled | Self::ServiceShutdown => false,
        }
    }
}

impl From<qrcodeapi::ValidationError> for Error {
    fn from(err: qrcodeapi::ValidationError) -> Self {
        Self::Generation(err.into())
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        use qrcodeapi::Error as Gen;

        match err {
            Error::Generation(Gen::Validation(e)) => Status::invalid_argument(e.to_string()),
            Error::Generation(e @ Gen::ContentTooLarge { .. }) => {
                Status::resource_exhausted(e.to_string())
            }
            Error::Generation(e @ Gen::UnsupportedFormat { .. }) => {
                Status::unimplemented(e.to_string())
            }
            Error::Generation(Gen::Cancelled) | Error::RequestCancelled => {
                Status::cancelled("Request was cancelled")
            }
            Error::Generation(_) => Status::internal("Internal encoding error"),
            Error::ChannelError { .. } => Status::internal("Internal error"),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
