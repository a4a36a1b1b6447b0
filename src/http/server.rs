//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Wrap caller routes with shell middleware (tracing, timeout, request scope)
//! - Bind the listener when serving starts
//! - Drive HTTP/1.1 and HTTP/2 connections with header read and size limits
//! - Stop gracefully on shutdown, or drop every connection on forced close

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{middleware, Router};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::{conn::auto::Builder, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::{
    timeout::{ResponseBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::validation::MIN_HEADER_BYTES;
use crate::config::{ListenerConfig, ShellConfig};
use crate::error::{Outcome, ShellError};
use crate::http::request::{attach_scope, ScopeTemplate};
use crate::lifecycle::Server;

/// Per-connection limits applied by the connection builder.
#[derive(Debug, Clone, Copy)]
struct ConnectionLimits {
    read_timeout: Duration,
    max_header_bytes: usize,
}

impl ConnectionLimits {
    fn from_config(listener: &ListenerConfig) -> Self {
        Self {
            read_timeout: listener.read_timeout(),
            max_header_bytes: listener.max_header_bytes.max(MIN_HEADER_BYTES),
        }
    }
}

/// HTTP server managed by the shell.
pub struct HttpServer {
    router: Router,
    bind_address: String,
    limits: ConnectionLimits,
    /// Cancelled to begin a graceful drain.
    graceful: CancellationToken,
    /// Cancelled to drop the accept loop immediately.
    force: CancellationToken,
    /// Cancelled once `serve` has returned.
    stopped: CancellationToken,
    local_addr: watch::Sender<Option<SocketAddr>>,
}

impl HttpServer {
    /// Create a server for `routes`, configured from `config`.
    pub fn new(config: &ShellConfig, routes: Router) -> Self {
        let (local_addr, _) = watch::channel(None);
        Self {
            router: Self::build_router(config, routes),
            bind_address: config.listener.bind_address.clone(),
            limits: ConnectionLimits::from_config(&config.listener),
            graceful: CancellationToken::new(),
            force: CancellationToken::new(),
            stopped: CancellationToken::new(),
            local_addr,
        }
    }

    /// Wrap the caller's routes with the shell middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ShellConfig, routes: Router) -> Router {
        let template = Arc::new(ScopeTemplate::from_config(&config.request));
        routes
            .layer(middleware::from_fn_with_state(template.clone(), attach_scope))
            .layer(TimeoutLayer::new(template.timeout()))
            .layer(ResponseBodyTimeoutLayer::new(config.listener.write_timeout()))
            .layer(TraceLayer::new_for_http())
    }

    fn connection_builder(&self) -> Builder<TokioExecutor> {
        let header_list = u32::try_from(self.limits.max_header_bytes).unwrap_or(u32::MAX);
        let mut builder = Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.limits.read_timeout)
            .max_buf_size(self.limits.max_header_bytes);
        builder
            .http2()
            .timer(TokioTimer::new())
            .max_header_list_size(header_list);
        builder
    }

    /// The bound address, once serving has started.
    ///
    /// Returns `None` if the server stopped without binding.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let mut rx = self.local_addr.subscribe();
        tokio::select! {
            bound = rx.wait_for(Option::is_some) => bound.ok().and_then(|addr| *addr),
            _ = self.stopped.cancelled() => *self.local_addr.borrow(),
        }
    }

    async fn run(&self) -> Outcome {
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .map_err(|e| ShellError::ServerStart {
                error: format!("bind {}: {e}", self.bind_address),
            })?;
        let addr = listener.local_addr().map_err(|e| ShellError::ServerStart {
            error: e.to_string(),
        })?;
        self.local_addr.send_replace(Some(addr));
        tracing::info!(address = %addr, "HTTP server starting");

        let builder = self.connection_builder();
        let service = TowerToHyperService::new(self.router.clone());
        let connections = GracefulShutdown::new();

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
                _ = self.graceful.cancelled() => break,
                _ = self.force.cancelled() => {
                    tracing::warn!(address = %addr, "HTTP server listener force closed");
                    return Ok(());
                }
            };

            let connection =
                builder.serve_connection_with_upgrades(TokioIo::new(stream), service.clone());
            let connection = connections.watch(connection.into_owned());
            let force = self.force.clone();
            tokio::spawn(async move {
                tokio::select! {
                    served = connection => {
                        if let Err(e) = served {
                            tracing::debug!(peer = %peer, error = %e, "Connection error");
                        }
                    }
                    _ = force.cancelled() => {
                        tracing::debug!(peer = %peer, "Connection force closed");
                    }
                }
            });
        }

        drop(listener);
        tracing::info!(address = %addr, "HTTP server draining connections");
        tokio::select! {
            _ = connections.shutdown() => Ok(()),
            _ = self.force.cancelled() => {
                tracing::warn!(address = %addr, "HTTP server connections force closed");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    async fn serve(&self) -> Outcome {
        let outcome = self.run().await;
        self.stopped.cancel();
        tracing::info!(outcome = ?outcome, "HTTP server stopped");
        outcome
    }

    async fn shutdown(&self, deadline: Instant) -> Outcome {
        let grace = deadline.saturating_duration_since(Instant::now());
        self.graceful.cancel();
        tokio::time::timeout_at(deadline, self.stopped.cancelled())
            .await
            .map_err(|_| ShellError::GracefulShutdownTimeout { grace })
    }

    async fn force_close(&self) -> Outcome {
        self.force.cancel();
        Ok(())
    }
}
