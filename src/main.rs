mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;
mod sweeper;

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::sweeper::spawn_sweeper;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "throttle_gate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // parse cli arguments
    let args = Args::parse();
    let login_policy = args.login_policy()?;
    let form_policy = args.form_policy()?;
    let sweep_every = args.sweep_every()?;
    let request_timeout = args.request_timeout()?;

    let client = reqwest::Client::builder()
        .timeout(request_timeout)
        .build()?;

    // one limiter per process, owned here and shared through state
    let limiter = Arc::new(RateLimiter::new());
    let sweeper = spawn_sweeper(Arc::clone(&limiter), sweep_every);

    let state = Arc::new(AppState {
        client,
        upstream_url: args.upstream_url(),
        limiter: Arc::clone(&limiter),
        login_policy,
        form_policy,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(port = args.port, "Gateway listening");
    tracing::info!(upstream = %args.upstream_url(), "Forwarding guarded actions");
    tracing::info!(
        max_attempts = login_policy.max_attempts(),
        window = ?login_policy.window(),
        block = ?login_policy.block_duration(),
        "Sign-in limit"
    );
    tracing::info!(
        max_attempts = form_policy.max_attempts(),
        window = ?form_policy.window(),
        "Form limit"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    if !limiter.is_empty() {
        tracing::info!(keys = limiter.len(), "Clearing limiter");
    }
    limiter.clear();
    Ok(())
}
