//! `StorychainServer` builder and server loop.
//!
//! This is the entry point for running a Storychain server. It ties
//! together all the layers: transport → protocol → rooms → hub, with the
//! HTTP API served alongside the WebSocket listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use storychain_ai::{ContentProvider, Storyteller};
use storychain_hub::BroadcastHub;
use storychain_protocol::{Codec, JsonCodec};
use storychain_room::{RoomRegistry, RoomSettings};
use storychain_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;

use crate::gateway::handle_connection;
use crate::{ServerConfig, StorychainError, http};

/// Shared server state passed to each connection task and HTTP handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Nothing in
/// here needs a lock: the registry and hub synchronize internally.
pub(crate) struct ServerState<P: ContentProvider, C: Codec> {
    pub(crate) registry: RoomRegistry,
    pub(crate) storyteller: Storyteller<P>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

impl<P: ContentProvider, C: Codec> ServerState<P, C> {
    pub(crate) fn hub(&self) -> &Arc<BroadcastHub> {
        self.registry.hub()
    }
}

/// Builder for configuring and starting a Storychain server.
///
/// # Example
///
/// ```rust,ignore
/// use storychain::prelude::*;
///
/// let server = StorychainServerBuilder::new()
///     .bind("0.0.0.0:3001")
///     .http_bind("0.0.0.0:3000")
///     .build(GeminiProvider::new(api_key))
///     .await?;
/// server.run().await
/// ```
pub struct StorychainServerBuilder {
    config: ServerConfig,
}

impl StorychainServerBuilder {
    /// Creates a new builder with [`ServerConfig::default`].
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address the WebSocket listener binds to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets the address the HTTP API binds to.
    pub fn http_bind(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self
    }

    /// Sets the settings used when a create request leaves them out.
    pub fn room_defaults(mut self, settings: RoomSettings) -> Self {
        self.config.room_defaults = settings;
        self
    }

    /// Bounds every content provider call.
    pub fn content_timeout(mut self, timeout: Duration) -> Self {
        self.config.content_timeout = timeout;
        self
    }

    /// Turns automatic twist injection on or off.
    pub fn auto_twists(mut self, enabled: bool) -> Self {
        self.config.auto_twists = enabled;
        self
    }

    /// Binds both listeners and assembles the server around `provider`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<P: ContentProvider>(
        self,
        provider: P,
    ) -> Result<StorychainServer<P, JsonCodec>, StorychainError> {
        let transport = WebSocketTransport::bind(&self.config.ws_addr).await?;
        let listener = TcpListener::bind(&self.config.http_addr).await?;

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(Arc::new(BroadcastHub::new())),
            storyteller: Storyteller::new(provider, self.config.content_timeout),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(StorychainServer {
            transport,
            listener,
            state,
        })
    }
}

impl Default for StorychainServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Storychain server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct StorychainServer<P: ContentProvider, C: Codec> {
    transport: WebSocketTransport,
    listener: TcpListener,
    state: Arc<ServerState<P, C>>,
}

impl<P, C> StorychainServer<P, C>
where
    P: ContentProvider,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> StorychainServerBuilder {
        StorychainServerBuilder::new()
    }

    /// Returns the address the WebSocket listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the address the HTTP API is bound to.
    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The rooms this server hosts.
    pub fn registry(&self) -> &RoomRegistry {
        &self.state.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// The HTTP API as a `Router`, sharing this server's rooms.
    pub fn router(&self) -> axum::Router {
        http::router(Arc::clone(&self.state))
    }

    /// Runs the WebSocket accept loop and the HTTP API together.
    ///
    /// Each accepted connection gets its own task. Runs until the process
    /// is terminated or the HTTP server fails.
    pub async fn run(self) -> Result<(), StorychainError> {
        let Self {
            transport,
            listener,
            state,
        } = self;

        tracing::info!(
            ws = %transport.local_addr()?,
            http = %listener.local_addr()?,
            "storychain server listening"
        );

        let app = http::router(Arc::clone(&state));
        let serve_http = async move { axum::serve(listener, app).await.map_err(StorychainError::Io) };

        tokio::try_join!(serve_http, accept_loop(transport, state))?;
        Ok(())
    }
}

async fn accept_loop<P, C>(
    mut transport: WebSocketTransport,
    state: Arc<ServerState<P, C>>,
) -> Result<(), StorychainError>
where
    P: ContentProvider,
    C: Codec,
{
    loop {
        match transport.accept().await {
            Ok(conn) => {
                let state = Arc::clone(&state);
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
