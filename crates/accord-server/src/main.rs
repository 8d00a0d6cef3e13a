use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use accord_engine::Engine;
use accord_engine::audit::TracingSink;
use accord_types::api::PostMessageRequest;
use accord_types::events::InboundMessage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accord=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("ACCORD_DB_PATH").unwrap_or_else(|_| "accord.db".into());
    let host = std::env::var("ACCORD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ACCORD_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Arc::new(accord_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let engine = Arc::new(Engine::with_audit(db, Arc::new(TracingSink)));

    // Routes
    let app = Router::new()
        .route("/rooms/{room_id}/messages", post(post_message))
        .with_state(engine)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Accord server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One message in, at most one reply out. `204 No Content` means the
/// facilitator has nothing to say about this message.
async fn post_message(
    State(engine): State<Arc<Engine>>,
    Path(room_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let msg = InboundMessage {
        room_id,
        user_id: req.user_id,
        text: req.text,
    };

    // Run blocking engine work off the async runtime
    let reply = tokio::task::spawn_blocking(move || engine.handle(&msg))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?;

    match reply {
        Some(reply) => Ok(Json(reply).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
