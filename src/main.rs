use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use sondeo::backend::ProfilerBackend;
use sondeo::cli::{BackendKind, Cli};
use sondeo::lifecycle::ProfilerController;
use sondeo::sampling::SamplingBackend;
use sondeo::server::{app, AppState};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Build the configured profiler backend
fn build_backend(kind: BackendKind, frequency: i32) -> Box<dyn ProfilerBackend> {
    match kind {
        BackendKind::Sampling => Box::new(SamplingBackend::new(frequency)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Sampling above 1000 Hz starves the process; below 1 Hz is useless
    if !(1..=1000).contains(&args.frequency) {
        anyhow::bail!(
            "Invalid value for --frequency: {} (must be 1-1000 Hz)",
            args.frequency
        );
    }
    if !args.prefix.is_empty() && !args.prefix.starts_with('/') {
        anyhow::bail!(
            "Invalid value for --prefix: {:?} (must start with '/')",
            args.prefix
        );
    }

    init_tracing(args.debug);

    let backend = build_backend(args.backend, args.frequency);
    let state = AppState {
        controller: Arc::new(ProfilerController::new(backend)),
    };
    let router = app(state, &args.prefix);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, prefix = %args.prefix, "profiler control listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    // Exit cleanly on ctrl-c; any error here just means we serve until killed
    let _ = tokio::signal::ctrl_c().await;
}
