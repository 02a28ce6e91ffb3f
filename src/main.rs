//! Entry point: initializes logging, loads configuration, builds the
//! storage engine and command table, and runs the server.
//! See `original_source/cmd/respect/main.go`.

mod command;
mod config;
mod errors;
mod resp;
mod server;
mod storage;

use std::sync::Arc;

use config::Config;
use errors::Context as _;
use storage::{Memory, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("loading configuration")?;
    let storage: Arc<dyn Storage> = Arc::new(Memory::new());
    let handlers = command::storage::storage_handlers(storage);

    log::info!("starting on port {}", config.port);
    server::Server::new(config, handlers).run().await
}
