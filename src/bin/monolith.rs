//! Monolith Binary - single-server deployment
//!
//! Wires up:
//! - Local adapters (ffmpeg, filesystem, Redis or in-memory status)
//! - In-process scheduler and its worker pool
//! - Event listener and HTTP inbound adapter

use ladder::adapters::local::http::{self, AppState};
use ladder::adapters::local::{
    events, EventHub, FfmpegEncoder, FsStorage, InMemoryAssetRepository, RedisAssetRepository,
};
use ladder::application::pipeline::TranscodePipeline;
use ladder::application::scheduler::{RetryPolicy, Scheduler};
use ladder::config::LocalConfig;
use ladder::domain::layout::OutputLayout;
use ladder::ports::repository::AssetRepository;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match LocalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    match &config.redis_url {
        Some(url) => match RedisAssetRepository::new(url) {
            Ok(pool) => serve(config.clone(), pool).await,
            Err(e) => {
                error!(error = %e, "Failed to create Redis pool");
                std::process::exit(1);
            }
        },
        None => {
            info!("REDIS_URL not set, keeping asset status in memory");
            serve(config.clone(), InMemoryAssetRepository::new()).await
        }
    }
}

async fn serve<R>(config: LocalConfig, repository: R)
where
    R: AssetRepository + 'static,
{
    let pipeline_config = &config.pipeline;

    // 1. Adapters
    let layout = OutputLayout::new(&pipeline_config.output_root);
    let encoder = Arc::new(FfmpegEncoder::new(pipeline_config.encoder_program.clone()));

    // 2. Application services
    let scheduler = Scheduler::new(RetryPolicy::from(pipeline_config));
    let pipeline = Arc::new(TranscodePipeline::new(
        pipeline_config,
        scheduler.clone(),
        repository,
        FsStorage::new(layout),
        encoder,
    ));

    // 3. Start workers
    let workers = scheduler.run_workers(pipeline_config.worker_count, pipeline.clone());
    info!(
        workers = workers.len(),
        output_root = ?pipeline_config.output_root,
        rungs = pipeline_config.ladder.len(),
        "Started transcoding workers"
    );

    // 4. Event system
    let event_hub = EventHub::new();
    let listener = events::listener::start(&event_hub, pipeline.clone());

    // 5. HTTP layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = http::router(AppState {
        trigger: pipeline,
        scheduler: scheduler.clone(),
        events: event_hub,
    })
    .layer(cors);

    // 6. Start server
    let bind = format!("{}:{}", config.addr, config.port);
    let tcp = match tokio::net::TcpListener::bind(&bind).await {
        Ok(tcp) => tcp,
        Err(e) => {
            error!(%bind, error = %e, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    info!(%bind, "Listening");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutting down");
    };
    if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(shutdown).await {
        error!(error = %e, "Server failed");
    }

    // the router (and its hub sender) is gone, so the listener drains and stops
    scheduler.shutdown();
    futures::future::join_all(workers).await;
    let _ = listener.await;
}
