//! Server network layer: TCP accept loop and session spawning

use crate::config::ServerConfig;
use crate::game::GameStore;
use crate::session::Session;
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// Accepts connections and runs one [`Session`] task per client.
///
/// At most `max_sessions` sessions run at once. A connection arriving while
/// the server is full is closed straight away; there is no waiting list.
pub struct Server {
    listener: TcpListener,
    store: Arc<GameStore>,
    sessions: Arc<Semaphore>,
    max_sessions: usize,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        Self::with_store(config, Arc::new(GameStore::new())).await
    }

    /// Binds a server around an existing store, e.g. one built with custom
    /// combat policies.
    pub async fn with_store(config: &ServerConfig, store: Arc<GameStore>) -> io::Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(config.bind_addr()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            store,
            sessions: Arc::new(Semaphore::new(config.max_sessions)),
            max_sessions: config.max_sessions,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn store(&self) -> Arc<GameStore> {
        Arc::clone(&self.store)
    }

    /// Accept loop. Only returns if the task is cancelled.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };

            let permit = match Arc::clone(&self.sessions).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(
                        "Rejecting {}: {} sessions already running",
                        addr, self.max_sessions
                    );
                    drop(stream);
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }

            info!("Client connected from {}", addr);
            let session = Session::new(addr, Arc::clone(&self.store));
            tokio::spawn(async move {
                match session.run(stream).await {
                    Ok(()) => info!("Session {} closed", addr),
                    Err(e) => warn!("Session {} terminated: {}", addr, e),
                }
                drop(permit);
            });
        }
    }
}
