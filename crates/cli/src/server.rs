use std::future::Future;
use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use edutrack_core::engagement::infrastructure::snapshot_publisher::SnapshotReader;

#[derive(Clone)]
struct AppState {
    snapshots: SnapshotReader,
}

/// `subject` is accepted for dashboard compatibility and otherwise ignored.
#[derive(Deserialize)]
struct RealtimeQuery {
    #[allow(dead_code)]
    subject: Option<String>,
}

/// Routes for the dashboard: the realtime snapshot and a health probe.
pub fn router(snapshots: SnapshotReader) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/classroom/realtime", get(realtime))
        .route("/health", get(health))
        .layer(cors)
        .with_state(AppState { snapshots })
}

async fn realtime(State(state): State<AppState>, Query(_query): Query<RealtimeQuery>) -> Response {
    let snapshot = state.snapshots.get_snapshot();
    Json(&*snapshot).into_response()
}

async fn health(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshots.get_snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "live": snapshot.live,
        "frame": snapshot.frame,
    }))
    .into_response()
}

/// Serves [`router`] on `addr` until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, snapshots: SnapshotReader, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        "Serving engagement snapshots on http://{}/api/classroom/realtime",
        listener.local_addr()?
    );
    axum::serve(listener, router(snapshots))
        .with_graceful_shutdown(shutdown)
        .await?;
    log::info!("Server shutdown complete");
    Ok(())
}
