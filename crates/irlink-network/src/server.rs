//! HTTP server for the board API.
//!
//! # Example Usage
//!
//! ```no_run
//! use irlink_network::{AppState, HttpServer, HttpServerConfig};
//!
//! # async fn example(state: AppState) -> std::io::Result<()> {
//! let config = HttpServerConfig {
//!     bind_addr: "0.0.0.0:8080".parse().unwrap(),
//! };
//! let server = HttpServer::bind(config, state).await?;
//! server.serve().await
//! # }
//! ```

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use irlink_controller::BoardController;
use irlink_core::constants::HTTP_PORT;
use irlink_hardware::devices::AnyIrBackend;
use irlink_storage::AnyKeyValueStore;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use crate::handlers;

/// Controller type served over HTTP.
pub type SharedController = BoardController<AnyIrBackend, AnyKeyValueStore>;

/// Handler state: the one controller, behind one lock.
pub type AppState = Arc<Mutex<SharedController>>;

/// Wrap a booted controller for the router.
pub fn app_state(controller: SharedController) -> AppState {
    Arc::new(Mutex::new(controller))
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(handlers::get_info))
        .route("/status", get(handlers::get_status))
        .route("/ports", get(handlers::get_ports))
        .route("/ports/configure", post(handlers::configure_port))
        .route("/adopt", post(handlers::adopt))
        .route("/send_ir", post(handlers::send_ir))
        .route("/test_output", post(handlers::test_output))
        .route("/learning/start", post(handlers::learning_start))
        .route("/learning/stop", post(handlers::learning_stop))
        .route("/learning/status", get(handlers::learning_status))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, HTTP_PORT)),
        }
    }
}

/// Bound HTTP server.
#[derive(Debug)]
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    /// Bind the listening socket.
    pub async fn bind(config: HttpServerConfig, state: AppState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        info!(addr = %listener.local_addr()?, "HTTP server listening");
        Ok(Self {
            listener,
            router: router(state),
        })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the process exits.
    pub async fn serve(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `signal` resolves, then finish in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }
}
