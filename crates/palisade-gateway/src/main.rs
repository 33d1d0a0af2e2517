//! `palisade-gateway` binary entrypoint.
//!
//! Loads configuration from environment variables, opens the storage roots,
//! and starts the HTTP server with the unattended catalog refresh.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::sync::Arc;

use anyhow::Result;

use palisade_core::observability::{LogFormat, init_logging};
use palisade_core::storage::FsBackend;
use palisade_gateway::config::Config;
use palisade_gateway::server::Server;

fn choose_log_format(config: &Config) -> LogFormat {
    if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(choose_log_format(&config));

    let cache_store = FsBackend::open(&config.cache_dir).await?;
    let submission_store = FsBackend::open(&config.submission_dir).await?;
    tracing::info!(
        cache_dir = %config.cache_dir.display(),
        submission_dir = %config.submission_dir.display(),
        "storage roots ready"
    );

    let server = Server::with_stores(config, Arc::new(cache_store), Arc::new(submission_store));
    server.serve().await?;
    Ok(())
}
