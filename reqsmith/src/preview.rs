//! Throwaway static file server for previewing the generated app.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

/// A running preview server. Dropping it without [`stop`](Self::stop)
/// leaves the task to die with the runtime.
pub struct PreviewServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PreviewServer {
    /// Serve `dir` on `addr` (port 0 picks a free port).
    pub async fn start(dir: &Path, addr: SocketAddr) -> Result<Self> {
        let router = Router::new()
            .fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind preview server on {addr}"))?;
        let addr = listener.local_addr()?;
        let (shutdown, signal) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = signal.await;
            });
            if let Err(e) = serve.await {
                tracing::error!("Preview server error: {e}");
            }
        });

        tracing::info!(%addr, dir = %dir.display(), "Preview server started");
        Ok(Self {
            addr,
            shutdown,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Signal shutdown and wait for the server task to finish.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task.await.context("Preview server task panicked")?;
        tracing::info!(addr = %self.addr, "Preview server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_index_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("index.html"), "<h1>hi</h1>")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("main.js"), "let x = 1;")
            .await
            .unwrap();

        let server = PreviewServer::start(dir.path(), "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let url = server.url();

        let index = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(index, "<h1>hi</h1>");
        let js = reqwest::get(format!("{url}main.js"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(js, "let x = 1;");

        let addr = server.addr();
        server.stop().await.unwrap();
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }
}
