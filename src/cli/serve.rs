use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::context::CliContext;
use crate::server::{build_router, ServeState};

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Port to listen on (default: server.port from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind (default: server.bind from config)
    #[arg(long)]
    pub bind: Option<String>,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let server = &ctx.config().server;
    let bind = args.bind.unwrap_or_else(|| server.bind.clone());
    let port = args.port.unwrap_or(server.port);
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;
    let addr = SocketAddr::new(ip, port);

    let state = ServeState::new(ctx.orchestrator().await?);
    state.mark_live();
    state.mark_ready();
    info!(
        backend = state.orchestrator.backend(),
        id_lookup = state.orchestrator.id_lookup_available(),
        target = %ctx.config().target.base_url,
        "workflow API ready"
    );

    let router = build_router(state.clone());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind workflow API on {addr}"))?;
    info!(%addr, "workflow API listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("workflow API exited unexpectedly")?;
    info!("workflow API stopped");
    Ok(())
}

/// Resolves on ctrl-c; readiness drops before in-flight requests drain.
async fn shutdown_signal(state: ServeState) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    state.mark_unready("shutting down");
    info!("shutdown requested, draining workflow API");
}
