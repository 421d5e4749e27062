mod catalog;
mod catalyst;
mod config;
mod handlers;
mod models;
mod render;
mod router;
mod store;
mod utils;

use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalyst::CatalystClient;
use config::Config;
use store::Store;

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub catalyst: Option<Arc<CatalystClient>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "template_catalog=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting Template Catalog Server");
    tracing::info!("Templates: {}", cfg.templates_dir);
    tracing::info!("Categories: {}", cfg.categories_file);
    tracing::info!("Listen: {}", cfg.listen_addr);

    // Initialize template store (creates built-in category dirs, finishes interrupted deletes)
    let store = Store::new(&cfg.templates_dir, &cfg.categories_file);
    store.init().await?;

    // Catalyst Center client, only when a controller is configured
    let catalyst = match &cfg.catalyst {
        Some(dnac) => {
            if !dnac.verify_ssl {
                tracing::warn!("Catalyst Center TLS verification disabled");
            }
            let client = CatalystClient::new(
                dnac.base_url(),
                dnac.username.clone(),
                dnac.password.clone(),
                dnac.verify_ssl,
            )?;
            tracing::info!("Catalyst Center: {}", dnac.base_url());
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("Catalyst Center not configured (DNAC_HOST unset)");
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState {
        store,
        config: cfg.clone(),
        catalyst,
    });

    // Build router
    let app = router::build(state, &cfg.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!("Template Catalog listening on {}", cfg.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Template Catalog shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
