//! Bootstrap (C5)
//!
//! Assembles the tier stack (origin → filesystem → memory, slowest to
//! fastest) onto a [`Manager`], spawns the prefetch and watcher background
//! tasks, and serves the HTTP frontend with graceful shutdown. Assembly
//! order and the watch/prefetch wiring follow `main.go`; the
//! `tracing-subscriber` setup and the shutdown-via-`broadcast::channel`
//! idiom follow teacher's `main.rs` and `controlplane/api/server.rs`.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use layercache::cache::storage::{filesystem::FilesystemStore, memory::MemoryStore, origin::OriginStore};
use layercache::cache::Manager;
use layercache::config::Args;
use layercache::http;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!("Starting layercache");
    info!("  version: {}", layercache::VERSION);
    info!("  listen: {}", args.listen);
    info!("  origin region: {}", args.origin_region);
    info!("  fallback key: {:?}", args.fallback_key);
    info!("  memory cache bytes: {}", args.memory_cache_bytes);

    let origin = Arc::new(OriginStore::new());
    let filesystem = Arc::new(FilesystemStore::new(&args.fs_root));
    let memory = Arc::new(MemoryStore::new(args.memory_cache_bytes));

    let mut manager = Manager::new(args.fallback_key.clone());
    manager.add_layer("origin", origin, false);
    manager.add_layer("filesystem", filesystem, true);
    manager.add_layer("memory", memory, true);
    manager.ensure_ready();
    let manager = Arc::new(manager);

    for prefix in &args.prefetch_prefixes {
        info!("prefetching prefix {}", prefix);
        tokio::spawn({
            let manager = manager.clone();
            let prefix = prefix.clone();
            async move { manager.prefetch_prefix(&prefix).await }
        });
    }

    if args.watch_delay_secs > 0 {
        let watch_manager = manager.clone();
        let interval = Duration::from_secs(args.watch_delay_secs);
        tokio::spawn(async move { watch_manager.watch(interval).await });
        info!("watcher enabled, interval {}s", args.watch_delay_secs);
    } else {
        info!("watcher disabled");
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let app = http::router(manager);
    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;

    info!("listening on {}", args.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap())
        .add_directive("axum=info".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
