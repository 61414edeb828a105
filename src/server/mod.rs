//! HTTP backend serving the step configuration and onboarding records.

pub mod password;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use tracing::info;

pub use routes::{AppState, cors_layer, onboarding_routes};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::store::{Database, LibSqlBackend};

/// Open the database, bind the listener and serve until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let cors = cors_layer(config.cors_origin.as_deref())?;
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
    let app = onboarding_routes(db).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    info!(addr = %config.listen_addr(), "Onboarding server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
