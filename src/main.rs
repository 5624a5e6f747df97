use anyhow::{Context, Result};
use clap::Parser;
use digital_interview::{
    create_router, AnswerCapturePipeline, AppState, BackendClient, Config, HttpAnswerApi,
    HttpGateway, InterviewHandle, NatsClient,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "digital-interview", about = "Digital interview session orchestrator")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/digital-interview")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Digital Interview v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Backend: {}", cfg.backend.base_url);

    let backend = BackendClient::new(&cfg.backend).context("Failed to build backend client")?;
    let gateway = Arc::new(HttpGateway::new(backend.clone(), cfg.avatar.clone()));
    let pipeline = Arc::new(AnswerCapturePipeline::new(
        Arc::new(HttpAnswerApi::new(backend)),
        cfg.retry_policy(),
    ));

    let mut state = AppState::new(gateway, pipeline, cfg.controller());

    if let Some(nats_cfg) = &cfg.nats {
        match NatsClient::connect(&nats_cfg.url, nats_cfg.subject_prefix.clone()).await {
            Ok(nats) => {
                state = state.with_observer(Arc::new(move |handle: &InterviewHandle| {
                    nats.forward(handle);
                }));
            }
            Err(e) => warn!("State events disabled: {:#}", e),
        }
    }

    let bind = args.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutting down, ending running interviews");
    state.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
