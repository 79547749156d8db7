use clap::Parser;
use drive_client::DriveClient;
use drive_oauth::RefreshTokenSource;
use drive_uploader::{AppState, Config, build_router};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "drive_uploader=info,drive_client=info,drive_oauth=info".into()
            }),
        )
        .init();

    let config = Config::parse();
    let settings = config.upload_settings();

    tokio::fs::create_dir_all(&settings.upload_dir)
        .await
        .map_err(|e| {
            format!(
                "Failed to create upload directory '{}': {}",
                settings.upload_dir.display(),
                e
            )
        })?;

    let tokens = RefreshTokenSource::new(config.oauth(), config.refresh_token.clone());
    let storage = DriveClient::new(config.drive_api_address.clone(), tokens);

    tracing::info!(
        folder_id = %settings.folder_id,
        upload_dir = %settings.upload_dir.display(),
        drive_api = %config.drive_api_address,
        "configured"
    );

    let app = build_router(AppState::new(settings, Arc::new(storage)));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| format!("Failed to bind port {}: {}", config.port, e))?;

    tracing::info!("Server running at http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve on SIGINT (Ctrl+C), or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
            _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("Received SIGINT, shutting down...");
    }
}
