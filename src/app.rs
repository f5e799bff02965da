use std::sync::Arc;

use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::fetcher::KmaSnowFetcher;
use crate::services::SnowService;

/// Application with the spawned HTTP server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build the state shared by all requests and spawn the HTTP server
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let fetcher = KmaSnowFetcher::from_config(&config)?;
        let snow_service = SnowService::new(fetcher, config.fetch_workers, config.utc_offset);
        info!(
            "Snow fetches: {} workers, {}s timeout, {} stations",
            config.fetch_workers,
            config.request_timeout_secs,
            config.stations.len()
        );

        let app_state = AppState {
            snow_service,
            stations: Arc::new(config.stations.clone()),
        };
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
