use std::sync::Arc;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::db::{EtlStore, PgEtlStore};
use crate::services::{EtlService, ReportService};

/// Running HTTP server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Wire the store, services and router, then spawn the server
    pub async fn build(config: Config, pool: PgPool) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let store: Arc<dyn EtlStore> = Arc::new(PgEtlStore::new(pool));

        let etl_service = EtlService::new(store.clone(), config.etl_settings());
        let report_service = ReportService::new(store);

        info!(
            "ETL reads TRX from sheet '{}' and NPP from sheet '{}', uploads up to {} bytes",
            config.trx_sheet_name, config.npp_sheet_name, config.max_upload_bytes
        );

        let app_state = AppState {
            etl_service,
            report_service,
            max_upload_bytes: config.max_upload_bytes,
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

    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
