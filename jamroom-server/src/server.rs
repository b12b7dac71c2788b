use crate::clock::SystemClock;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::room::{Coordinator, RoomRegistry};
use crate::signaling::{SignalingService, get_room, list_rooms, ws_handler};
use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/api/rooms", get(list_rooms))
        .route("/api/rooms/{id}", get(get_room))
        .with_state(service)
}

/// Starts the coordinator task and returns the service that feeds it.
/// The task ends once the service and all its clones are dropped.
pub fn start_coordinator(config: ServerConfig) -> (SignalingService, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_queue_depth);
    let service = SignalingService::new(cmd_tx, config);

    let registry = RoomRegistry::new(service.output(), Arc::new(SystemClock));
    let coordinator = tokio::spawn(Coordinator::new(registry, cmd_rx).run());

    (service, coordinator)
}

pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_on(listener, config).await
}

pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<(), ServerError> {
    let (service, _coordinator) = start_coordinator(config);
    let sweeper = service.spawn_rate_limit_sweeper();

    if let Ok(addr) = listener.local_addr() {
        info!("Signaling server listening on http://{}", addr);
    }

    let app = router(service).into_make_service_with_connect_info::<SocketAddr>();
    let result = axum::serve(listener, app).await.map_err(ServerError::Serve);

    sweeper.abort();
    result
}
