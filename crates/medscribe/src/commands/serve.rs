//! `serve`: run the HTTP function server until SIGINT/SIGTERM.

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use medscribe_server::AppState;

use crate::cli::{GlobalOpts, ServeArgs};
use crate::config;
use crate::error::CliError;

pub async fn handle(args: ServeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let (name, profile) = config::effective_profile(global, &cfg)?;
    let bind = args
        .bind
        .or_else(|| profile.bind.clone())
        .unwrap_or_else(|| cfg.defaults.bind.clone());

    let service_config = medscribe_config::profile_to_service_config(&profile, &name)?;
    if service_config.store.is_none() {
        warn!(profile = %name, "no store configured, subscription routes will fail");
    }
    if service_config.gemini.is_none() {
        warn!(profile = %name, "no Gemini key configured, generation routes will fail");
    }
    if service_config.speech.is_none() {
        warn!(profile = %name, "no speech key configured, transcription will fail");
    }
    let state = AppState::from_config(&service_config)?;

    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| CliError::validation("bind", format!("cannot listen on {bind}: {e}")))?;
    if !global.quiet {
        eprintln!("medscribe listening on http://{}", listener.local_addr()?);
    }

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        trigger.cancel();
    });

    medscribe_server::serve(listener, state, shutdown).await?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("cannot register unix signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
