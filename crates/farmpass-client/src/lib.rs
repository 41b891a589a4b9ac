//! # farmpass-client
//!
//! The FarmPass client: a backend adapter, the claim coordinator and the
//! three portals (customer, restaurant, farmer), driven from a terminal
//! shell.

pub mod api;
pub mod badges;
pub mod claim;
pub mod config;
pub mod error;
pub mod portal;
pub mod router;
pub mod scanner;
pub mod shell;
pub mod wallet;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use farmpass_store::Database;

use crate::api::HttpBackend;
use crate::config::ClientConfig;
use crate::shell::Shell;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("farmpass_client_lib=debug,farmpass_store=info,warn")),
        )
        .init();

    info!("Starting FarmPass client v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    // Same file opened twice; WAL mode lets both handles share it.
    let open = || match &config.db_path {
        Some(path) => Database::open_at(path),
        None => Database::new(),
    };
    let customer_db = open()?;
    let restaurant_db = open()?;

    let backend = Arc::new(HttpBackend::new(&config.api_base_url)?);

    let mut shell = Shell::new(
        backend,
        customer_db,
        restaurant_db,
        config.explorer_tx_base.clone(),
    );
    shell.run().await?;

    info!("FarmPass client stopped");
    Ok(())
}
