//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use route_registry::config::{RouteConfig, RouterConfig};
use route_registry::http::HttpServer;
use route_registry::lifecycle::Shutdown;

/// A server running on an ephemeral port.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<RouterConfig>,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

/// Config serving the given (path, body) routes.
pub fn config_with_routes(routes: &[(&str, &str)]) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.routes = routes
        .iter()
        .map(|(path, body)| RouteConfig {
            path: path.to_string(),
            body: body.to_string(),
        })
        .collect();
    config
}

/// Start the HTTP server on 127.0.0.1 with an OS-assigned port.
#[allow(dead_code)]
pub async fn start_server(config: RouterConfig) -> RunningServer {
    start(HttpServer::new(config)).await
}

/// Run an already built server on 127.0.0.1 with an OS-assigned port.
#[allow(dead_code)]
pub async fn start(server: HttpServer) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, updates_rx, server_shutdown).await });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningServer {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

/// Client that never reuses connections or goes through a proxy.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
