use std::net::SocketAddr;

use anyhow::Result;
use triage_api::{build_app, ServerSettings};
use triage_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("triage_api");

    let settings = ServerSettings::from_env()?;
    let bind = settings.bind.clone();
    let app = build_app(settings)?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "triage api started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
