// offline-gateway - Cache-first offline gateway for the Quran reader
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use offline_gateway::cache;
use offline_gateway::cli::Args;
use offline_gateway::config::AppConfig;
use offline_gateway::network::HttpFetcher;
use offline_gateway::server::{create_router, LocalHost};
use offline_gateway::utils::logging;
use offline_gateway::worker::OfflineGateway;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load_from(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting offline-gateway v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> Result<()> {
    // Phase 3: Open cache storage and wire the gateway
    info!("Opening {} cache storage", config.cache.backend);
    let storage = cache::open_storage(&config.cache).await?;
    let fetcher = Arc::new(HttpFetcher::new(&config.gateway.origin, &config.performance)?);
    let host = Arc::new(LocalHost::new(
        &config.gateway.origin,
        config.notifications.launch_browser,
    )?);

    let gateway = OfflineGateway::builder(config.gateway.clone())
        .notifications(config.notifications.clone())
        .storage(storage)
        .fetcher(fetcher)
        .host(host.clone())
        .build()?;

    // Phase 4: Install the current generation, then activate it
    let state = gateway.start().await;
    info!("Gateway for {} is {:?}", config.gateway.cache_name, state);

    // Phase 5: Build and start HTTP server
    let app = create_router(config.clone(), gateway.clone(), host)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Proxying {} on {}", config.gateway.origin, addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight cache writes land
    gateway.wait_for_background().await;
    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
