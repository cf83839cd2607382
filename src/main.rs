mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::router::build_router;
use crate::features::chat::ChatService;
use crate::features::files::FileService;
use crate::modules::provider::{GeminiClient, GenerativeProvider};
use crate::modules::storage::LocalFileCache;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let gemini = GeminiClient::new(&config.gemini)
        .map_err(|e| anyhow::anyhow!("Failed to create Gemini client: {}", e))?;
    tracing::info!(
        "Gemini client initialized (model: {}, base_url: {})",
        gemini.model(),
        config.gemini.base_url
    );
    let provider: Arc<dyn GenerativeProvider> = Arc::new(gemini);

    let cache = LocalFileCache::new(&config.storage.uploads_dir);
    tokio::fs::create_dir_all(cache.root()).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to create uploads directory {}: {}",
            cache.root().display(),
            e
        )
    })?;
    tracing::info!("Local file cache at {}", cache.root().display());

    let file_service = Arc::new(FileService::new(
        Arc::clone(&provider),
        cache,
        config.gemini.list_page_size,
    ));
    tracing::info!("File service initialized");

    let chat_service = Arc::new(ChatService::new(
        Arc::clone(&provider),
        Arc::clone(&file_service),
        config.gemini.system_instruction.clone(),
    ));
    tracing::info!("Chat service initialized");

    let app = build_router(file_service, chat_service, &config);

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;
    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
