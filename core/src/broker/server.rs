//! TCP acceptor and server runtime.

use crate::broker::connection::Connection;
use crate::config::BrokerConfig;
use crate::storage::{create_store, MessageStore};
use crate::{RelayError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Accepts client sockets and spawns a [`Connection`] task per peer.
///
/// The accept loop runs until [`shutdown`](BrokerServer::shutdown) is
/// called or the configured deadline expires. In-flight connections are
/// not forcibly cancelled beyond socket closure; a connection torn down
/// while a delivery is unacknowledged returns the message to its topic.
pub struct BrokerServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    storage: Arc<dyn MessageStore>,
    max_frame_bytes: usize,
    deadline: Option<Duration>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BrokerServer {
    /// Binds the listening socket and builds the storage backend. Binding
    /// port 0 selects an ephemeral port; [`local_addr`] reports the bound
    /// endpoint.
    ///
    /// [`local_addr`]: BrokerServer::local_addr
    pub async fn bind(config: BrokerConfig) -> Result<Self> {
        config.validate().map_err(RelayError::Config)?;

        let addr = format!("{}:{}", config.endpoint_address, config.endpoint_port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        let storage = create_store(config.storage_type, config.queue_type);
        let (shutdown_tx, _) = broadcast::channel(16);

        info!("relaymq broker listening on {}", local_addr);
        info!(
            "storage type: {}, queue type: {}",
            config.storage_type.as_str(),
            config.queue_type.as_str()
        );
        match config.deadline() {
            Some(deadline) => info!("deadline: {} seconds", deadline.as_secs()),
            None => info!("deadline: disabled"),
        }

        Ok(Self {
            listener,
            local_addr,
            storage,
            max_frame_bytes: config.max_frame_bytes,
            deadline: config.deadline(),
            shutdown_tx,
        })
    }

    /// The endpoint the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Requests a graceful stop of the accept loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Runs the accept loop until shutdown is requested or the deadline
    /// expires.
    pub async fn run(&self) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let deadline = async {
            match self.deadline {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            if let Err(e) = stream.set_nodelay(true) {
                                warn!("failed to set TCP_NODELAY for {}: {}", peer, e);
                            }
                            debug!("accepted client {}", peer);
                            let connection = Connection::new(
                                stream,
                                peer,
                                Arc::clone(&self.storage),
                                self.max_frame_bytes,
                            );
                            tokio::spawn(connection.run());
                        }
                        Err(e) => error!("failed to accept connection: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown requested, stopping accept loop");
                    break;
                }
                _ = &mut deadline => {
                    info!("deadline expired, stopping server");
                    break;
                }
            }
        }

        info!("server stopped");
        Ok(())
    }
}
