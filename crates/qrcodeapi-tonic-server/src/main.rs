#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use core::future::Future;
use futures::Stream;
use qrcodeapi_tonic_core::proto::{FILE_DESCRIPTOR_SET, qr_code_server::QrCodeServer};
use server::config::{CliArgs, ServerConfig};
use server::service::handler::QrService;
use server::telemetry::init_telemetry;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let res = if config.uds {
        #[cfg(unix)]
        {
            use tokio::net::UnixListener;
            use tokio_stream::wrappers::UnixListenerStream;
            let uds_path = config.server_addr.clone();
            let uds = UnixListener::bind(&uds_path)?;
            let incoming = UnixListenerStream::new(uds);
            log_startup_info(&uds_path, &config);
            let res = serve(incoming, config, shutdown_signal()).await;
            // Best effort: a panic can still leave the socket file behind.
            let _ = std::fs::remove_file(&uds_path);
            res
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!("Unix domain sockets are not supported on this platform");
        }
    } else {
        let tcp = TcpListener::bind(&config.server_addr).await?;
        let incoming = TcpListenerStream::new(tcp);
        log_startup_info(&config.server_addr, &config);
        serve(incoming, config, shutdown_signal()).await
    };

    providers.shutdown();
    res
}

/// Serves the QR code, health and reflection services on `incoming` until
/// `signal` resolves, then drains the worker pool.
async fn serve<I, IO, IE, F>(incoming: I, config: ServerConfig, signal: F) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
    F: Future<Output = ()>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<QrCodeServer<QrService>>()
        .await;

    let service = QrService::new(config.clone());

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .timeout(config.request_timeout)
        .http2_keepalive_interval(Some(config.keepalive_interval))
        .http2_keepalive_timeout(Some(config.keepalive_timeout))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_qr_service(service.clone()))
        .serve_with_incoming_shutdown(incoming, drain(signal, service, health_reporter))
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(addr: &str, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting QR code service on {addr} with full config: {config:#?}");
    } else {
        tracing::info!(
            "Starting QR code service on {addr} with {} workers",
            config.num_workers
        );
    }
}

fn build_qr_service(service: QrService) -> QrCodeServer<QrService> {
    QrCodeServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

/// Waits for `signal`, marks the service as not serving and drains the
/// worker pool. The server stops accepting connections once this returns.
async fn drain<F>(signal: F, service: QrService, health_reporter: HealthReporter)
where
    F: Future<Output = ()>,
{
    signal.await;
    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Publish the status
    health_reporter
        .set_not_serving::<QrCodeServer<QrService>>()
        .await;

    // 2. Refuse new work and let in-flight requests finish
    if let Err(e) = service.shutdown().await {
        tracing::error!("Error during service shutdown: {e:?}");
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install is logged
/// and never fires, leaving the other one in charge.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
