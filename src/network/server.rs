//! TCP Server
//!
//! Accepts connections and hands each to its own worker thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use super::limiter::{ConnectionLimiter, ConnectionPermit};
use super::Connection;

/// TCP server for ReelDB
pub struct Server {
    config: Config,
    listener: TcpListener,
    limiter: ConnectionLimiter,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running server's accept loop from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// What a worker needs to open its own store handle
#[derive(Clone)]
struct WorkerSettings {
    db_path: PathBuf,
    busy_timeout: Duration,
    read_timeout: Option<Duration>,
}

impl Server {
    /// Bind the listen address
    ///
    /// The listener is non-blocking so the accept loop can notice shutdown;
    /// accepted sockets are switched back to blocking mode.
    pub fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        tracing::info!(
            "Listening on {} (max connections: {})",
            listener.local_addr()?,
            if config.max_connections == 0 {
                "unbounded".to_string()
            } else {
                config.max_connections.to_string()
            }
        );

        Ok(Self {
            limiter: ConnectionLimiter::new(config.max_connections),
            config,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to stop accepting
    ///
    /// Workers already running finish serving their clients.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.limiter.active()
    }

    /// Run the accept loop (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        let poll = self.config.accept_poll();
        let settings = WorkerSettings {
            db_path: self.config.db_path.clone(),
            busy_timeout: self.config.busy_timeout(),
            read_timeout: self.config.read_timeout(),
        };
        let mut next_id: u64 = 0;

        while !self.shutdown.load(Ordering::Relaxed) {
            // At the limit, wait here and let the backlog queue new clients
            let Some(permit) = self.limiter.acquire_timeout(poll) else {
                continue;
            };

            match self.listener.accept() {
                Ok((stream, addr)) => {
                    next_id += 1;
                    tracing::info!("Accepted connection #{} from {}", next_id, addr);
                    self.spawn_worker(next_id, stream, addr, permit, settings.clone());
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    drop(permit);
                    thread::sleep(poll);
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::Interrupted | ErrorKind::ConnectionAborted
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Accept loop stopped");
        Ok(())
    }

    /// Start a detached worker; it owns the socket, the permit and its store
    fn spawn_worker(
        &self,
        id: u64,
        stream: TcpStream,
        addr: SocketAddr,
        permit: ConnectionPermit,
        settings: WorkerSettings,
    ) {
        let spawned = thread::Builder::new()
            .name(format!("reeldb-conn-{}", id))
            .spawn(move || {
                let _permit = permit;
                serve_connection(stream, addr, &settings);
            });

        // On failure the closure is dropped, closing the socket and
        // returning the permit
        if let Err(e) = spawned {
            tracing::error!("Failed to spawn worker for {}: {}", addr, e);
        }
    }
}

/// Worker body: open a private store handle and serve until the peer leaves
fn serve_connection(stream: TcpStream, addr: SocketAddr, settings: &WorkerSettings) {
    if let Err(e) = stream.set_nonblocking(false) {
        tracing::warn!("Dropping {}: cannot switch to blocking mode: {}", addr, e);
        return;
    }

    let store = match CatalogStore::open(&settings.db_path, settings.busy_timeout) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store for {}: {}", addr, e);
            return;
        }
    };

    let mut connection = match Connection::new(stream, Dispatcher::new(store)) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to set up connection from {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = connection.set_read_timeout(settings.read_timeout) {
        tracing::warn!("Failed to set read timeout for {}: {}", addr, e);
        return;
    }

    match connection.handle() {
        Ok(()) => tracing::debug!(
            "Connection from {} closed after {} requests",
            addr,
            connection.served()
        ),
        Err(e) => tracing::warn!("Connection from {} ended with error: {}", addr, e),
    }
}
