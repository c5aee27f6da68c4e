//! Binary entrypoint for the chatgraph HTTP server.
//!
//! Reads configuration from environment variables:
//! - `CHATGRAPH_DB_PATH`: SQLite database file path (default: "chatgraph.db")
//! - `CHATGRAPH_PORT`: Server listen port (default: "3000")
//! - `CHATGRAPH_GRAPH_ID`: id of the remote graph to synchronize (required)
//! - `CHATGRAPH_API_BASE`: remote graph API root
//!   (default: "https://graphcommons.com/api/v1")
//! - `CHATGRAPH_API_TOKEN`: bearer token for the remote graph API
//! - `CHATGRAPH_BOOTSTRAP`: "1" to load the remote graph dump at startup

use chatgraph_server::router::build_router;
use chatgraph_server::state::{AppConfig, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let db_path = std::env::var("CHATGRAPH_DB_PATH")
        .unwrap_or_else(|_| "chatgraph.db".to_string());
    let port = std::env::var("CHATGRAPH_PORT")
        .unwrap_or_else(|_| "3000".to_string());
    let graph_id = std::env::var("CHATGRAPH_GRAPH_ID")
        .expect("CHATGRAPH_GRAPH_ID must be set");
    let api_base = std::env::var("CHATGRAPH_API_BASE")
        .unwrap_or_else(|_| "https://graphcommons.com/api/v1".to_string());
    let api_token = std::env::var("CHATGRAPH_API_TOKEN").ok();

    let config = AppConfig {
        db_path,
        graph_id,
        api_base,
        api_token,
    };
    let state = AppState::new(&config)
        .expect("Failed to initialize application state");

    if std::env::var("CHATGRAPH_BOOTSTRAP").as_deref() == Ok("1") {
        let mut connector = state.connector.lock().await;
        match connector.bootstrap_from_remote().await {
            Ok(summary) => tracing::info!(
                users = summary.users,
                channels = summary.channels,
                memberships = summary.memberships,
                "bootstrapped from remote graph"
            ),
            Err(err) => tracing::warn!(error = %err, "bootstrap from remote graph failed"),
        }
    }

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("chatgraph server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
