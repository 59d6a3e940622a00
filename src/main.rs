mod config;
mod error;
mod export;
mod finance;
mod model;
mod remote;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let port = config.port;
    let client = remote::SupabaseClient::new(&config.remote).expect("remote client init failed");
    let state = state::AppState::new(Arc::new(client), config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "backoffice listening");
    axum::serve(listener, app).await.expect("server failed");
}
