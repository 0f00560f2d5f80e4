use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use qrcodeapi::Limits;

/// Runtime configuration for the `qrcodeapi-tonic-server` binary.
///
/// Every value can come from a CLI flag or the matching environment variable
/// (a `.env` file is loaded first). Defaults suit a single-host deployment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "qrcodeapi-tonic-server",
    version,
    about = "A gRPC and grpc-web service that renders QR codes"
)]
pub struct CliArgs {
    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:8080" or "/tmp/qrcodeapi.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Number of worker tasks that encode and render images.
    ///
    /// Each worker hands the CPU-bound work to the blocking thread pool and
    /// handles one request at a time.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = num_cpus::get())]
    pub num_workers: usize,

    /// Maximum number of generation requests processed at once. Further
    /// requests wait for a slot.
    ///
    /// Bounds peak memory: every in-flight request may hold a full pixel
    /// buffer of up to `MAX_DIMENSION` squared bytes.
    ///
    /// Environment variable: `MAX_INFLIGHT`
    #[arg(long, env = "MAX_INFLIGHT", default_value_t = 64)]
    pub max_inflight: usize,

    /// Largest accepted width or height in pixels.
    ///
    /// Environment variable: `MAX_DIMENSION`
    #[arg(long, env = "MAX_DIMENSION", default_value_t = qrcodeapi::MAX_DIMENSION)]
    pub max_dimension: u32,

    /// Side length used when a request leaves width or height at zero.
    ///
    /// Environment variable: `DEFAULT_DIMENSION`
    #[arg(long, env = "DEFAULT_DIMENSION", default_value_t = qrcodeapi::DEFAULT_DIMENSION)]
    pub default_dimension: u32,

    /// Per-request deadline in milliseconds. Requests still running when it
    /// expires are cancelled.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// Seconds to wait for in-flight requests to drain on shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,

    /// HTTP/2 keepalive ping interval in seconds.
    ///
    /// Environment variable: `KEEPALIVE_INTERVAL`
    #[arg(long, env = "KEEPALIVE_INTERVAL", default_value_t = 5)]
    pub keepalive_interval: u64,

    /// Seconds to wait for a keepalive ping acknowledgement before closing
    /// the connection.
    ///
    /// Environment variable: `KEEPALIVE_TIMEOUT`
    #[arg(long, env = "KEEPALIVE_TIMEOUT", default_value_t = 1)]
    pub keepalive_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub num_workers: usize,
    pub max_inflight: usize,
    pub limits: Limits,
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub keepalive_interval: Duration,
    pub keepalive_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.max_inflight == 0 {
            bail!("MAX_INFLIGHT must be greater than 0");
        }

        if args.max_dimension == 0 {
            bail!("MAX_DIMENSION must be greater than 0");
        }

        if args.default_dimension == 0 || args.default_dimension > args.max_dimension {
            bail!(
                "DEFAULT_DIMENSION ({}) must be between 1 and MAX_DIMENSION ({})",
                args.default_dimension,
                args.max_dimension
            );
        }

        if args.request_timeout_ms == 0 {
            bail!("REQUEST_TIMEOUT_MS must be greater than 0");
        }

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            num_workers: args.num_workers,
            max_inflight: args.max_inflight,
            limits: Limits {
                max_dimension: args.max_dimension,
                default_dimension: args.default_dimension,
            },
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            keepalive_interval: Duration::from_secs(args.keepalive_interval),
            keepalive_timeout: Duration::from_secs(args.keepalive_timeout),
        })
    }
}
