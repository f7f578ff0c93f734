use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aide::openapi::OpenApi;
use anyhow::Context;
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::routes;
use crate::{
    blob_storage::BlobStore,
    types::{AppConfig, Environment},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the application router: API routes, docs, and the static UI as fallback
pub fn router(environment: Environment, store: Arc<dyn BlobStore>, static_dir: &Path) -> Router {
    let mut openapi = OpenApi::default();

    routes::handler()
        .finish_api(&mut openapi)
        .fallback_service(ServeDir::new(static_dir))
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(store))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Verifies storage access, then binds the listener and serves until a shutdown signal
///
/// Nothing is bound when the storage check fails.
///
/// # Errors
///
/// Returns an error if the container cannot be ensured with the configured credentials,
/// or if the server fails to bind to the port
pub async fn start(config: AppConfig, store: Arc<dyn BlobStore>) -> anyhow::Result<()> {
    store.ensure_container().await.with_context(|| {
        format!(
            "Storage container {} is not usable with the configured credentials",
            store.container()
        )
    })?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Upload grant issuer started on http://{addr}");

    let app = router(config.environment, store, &config.server.static_dir);
    serve(listener, app, shutdown_signal()).await
}

/// Serves `router` on an already bound listener until `shutdown` resolves
///
/// # Errors
///
/// Returns an error if the server stops abnormally
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
