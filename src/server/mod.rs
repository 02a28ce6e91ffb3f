//! The TCP accept loop. See `original_source/pkg/server/server.go`.

pub mod connection;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::command::Handlers;
use crate::config::Config;

pub struct Server {
    config: Config,
    handlers: Arc<Handlers>,
}

impl Server {
    pub fn new(config: Config, handlers: Handlers) -> Self {
        Server {
            config,
            handlers: Arc::new(handlers),
        }
    }

    /// Binds the configured port and spawns a task per accepted connection.
    /// Returns only on a listener-level error.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        log::info!("listening on {addr}");

        loop {
            let (stream, peer) = listener.accept().await?;
            let handlers = self.handlers.clone();
            tokio::spawn(async move {
                log::debug!("accepted connection from {peer}");
                if let Err(e) = connection::handle(stream, handlers).await {
                    log::error!("connection {peer} ended with error: {e}");
                }
                log::debug!("connection from {peer} closed");
            });
        }
    }
}
