// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use axum::http::HeaderName;
use server::config::{Backend, Config};
use server::database::{self, SqliteRepository};
use server::identity::ACTOR_HEADER;
use server::local_store::LocalRepository;
use server::repository::Repository;
use server::routes::{self, AppState};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    if let Err(e) = run().await {
        tracing::error!("Server stopped: {:?}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;

    let repo: Arc<dyn Repository> = match &config.backend {
        Backend::Sqlite { database_url } => {
            let pool = database::establish_connection_pool(database_url).await?;
            tracing::info!("Database connection was made successfully.");
            Arc::new(SqliteRepository::new(pool))
        }
        Backend::Local { data_file } => {
            let repo = LocalRepository::open(data_file)?;
            tracing::info!("Using local data file {}.", repo.path().display());
            Arc::new(repo)
        }
    };

    let app_routes = routes::create_router(AppState::new(repo));

    // Explicit list of headers the frontend sends.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static(ACTOR_HEADER),
        ])
        .allow_origin(Any);

    let app = app_routes.layer(cors); // Apply the CORS layer

    tracing::info!("The server listens on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
