//! `CyberwarriorServer` builder and server loop.
//!
//! This is the entry point for running a Cyberwarrior game server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;

use cyberwarrior_catalog::CardCatalog;
use cyberwarrior_protocol::{Codec, JsonCodec};
use cyberwarrior_room::{ActionRouter, RoomConfig};
use cyberwarrior_session::{DEFAULT_OUTBOUND_CAPACITY, SessionManager};
use cyberwarrior_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::CyberwarriorError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
/// The router guards its own registry; sessions sit behind a `Mutex`
/// that is only held for a single insert or remove.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) router: ActionRouter,
    pub(crate) codec: C,
    /// Capacity of each connection's outbound event queue.
    pub(crate) outbound_capacity: usize,
}

/// Builder for configuring and starting a Cyberwarrior server.
///
/// # Example
///
/// ```rust,ignore
/// use cyberwarrior::prelude::*;
///
/// let catalog = CardCatalog::load("cards.json")?;
/// let server = CyberwarriorServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(catalog)
///     .await?;
/// server.run().await
/// ```
pub struct CyberwarriorServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    outbound_capacity: usize,
}

impl CyberwarriorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every new room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how many events may wait for a slow client before new ones
    /// are dropped.
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }

    /// Binds the listener and prepares the shared state.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`. The catalog must be fully
    /// loaded here; rooms only ever read it.
    pub async fn build(
        self,
        catalog: impl Into<Arc<CardCatalog>>,
    ) -> Result<CyberwarriorServer<JsonCodec>, CyberwarriorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let catalog = catalog.into();

        tracing::info!(
            addr = %self.bind_addr,
            cards = catalog.len(),
            hand_size = self.room_config.hand_size,
            "server bound"
        );

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new()),
            router: ActionRouter::new(catalog, self.room_config),
            codec: JsonCodec,
            outbound_capacity: self.outbound_capacity,
        });

        Ok(CyberwarriorServer { transport, state })
    }
}

impl Default for CyberwarriorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Cyberwarrior game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CyberwarriorServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl CyberwarriorServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> CyberwarriorServerBuilder {
        CyberwarriorServerBuilder::new()
    }
}

impl<C: Codec> CyberwarriorServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), CyberwarriorError> {
        tracing::info!("cyberwarrior server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
