use crate::app_env::{AppSettings, SessionSettings};
use crate::domain::session::SessionScheme;
use anyhow::Context;
use axum::extract::State;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod api;
mod app_env;
mod db;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routes;
mod routing_utils;

/// State every request handler can reach
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub sessions: SessionScheme,
}

/// Extractor shorthand for the application's [SharedData]
pub type AppState = State<Arc<SharedData>>;

fn session_scheme(settings: SessionSettings) -> Result<SessionScheme, anyhow::Error> {
    match settings {
        SessionSettings::Signed { secret, ttl } => SessionScheme::signed(secret, ttl)
            .with_context(|| format!("{} is unusable", app_env::SESSION_SECRET)),
        SessionSettings::Legacy => Ok(SessionScheme::Legacy),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    if dotenv().is_err() {
        println!("Starting server without .env file.");
    }
    let settings = AppSettings::from_env()?;
    logging::init(settings.otel.as_ref())?;

    let sessions = session_scheme(settings.session)?;
    if !sessions.verifies_passwords() {
        warn!("Legacy authentication is enabled: logins skip password checks");
    }

    let db_pool = db::connect_sqlx(&settings.database_url)?;
    db::migrate(&db_pool).await?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        sessions,
    });
    let router = routes::build_router(shared_data);

    let listener = TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("binding to {}", settings.listen_addr))?;
    info!("Starting server on {}.", settings.listen_addr);
    axum::serve(listener, router)
        .await
        .context("serving HTTP requests")?;

    Ok(())
}
