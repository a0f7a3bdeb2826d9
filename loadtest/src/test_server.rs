//! In-process HTTP servers standing in for Smart Split and its auth service in tests.

use std::net::{SocketAddr, TcpListener};

use axum::Router;

/// Serves `router` on a random local port until dropped.
pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
}

impl TestServer {
    /// Spawns the server on the current tokio runtime.
    pub fn with_router(router: Router) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        Self { handle, socket }
    }

    /// Base URL of the server, without trailing slash.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.socket.port())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A URL on a local port nobody listens on.
pub fn unreachable_url() -> String {
    // bind and drop a listener to get a free port
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    format!("http://127.0.0.1:{port}")
}
