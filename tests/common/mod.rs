//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use edge_router::config::EdgeConfig;
use edge_router::lifecycle::{self, EdgeRouter, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Start a mock backend that answers every request with `response`.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // Requests under test have no body; the headers fit one read.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Replace `dir/name` atomically, so a concurrent reader sees old or new contents only.
pub fn replace_file(dir: &Path, name: &str, contents: &str) {
    let staging = dir.join(format!(".{}.tmp", name));
    std::fs::write(&staging, contents).unwrap();
    std::fs::rename(&staging, dir.join(name)).unwrap();
}

/// Config for a router on ephemeral ports with the admin API enabled.
pub fn test_config(rules: &Path) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.rules.path = rules.to_path_buf();
    config.upstream.request_timeout_secs = 5;
    config.admin.enabled = true;
    config.admin.bind_address = "127.0.0.1:0".to_string();
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

pub async fn start_edge(config: EdgeConfig) -> (EdgeRouter, Shutdown) {
    let shutdown = Shutdown::new();
    let edge = lifecycle::start(config, &shutdown).await.unwrap();
    (edge, shutdown)
}

/// GET `path` on the edge router, addressed to `host`.
pub async fn get(edge: &EdgeRouter, host: &str, path: &str) -> (u16, String) {
    let res = reqwest::Client::new()
        .get(format!("http://{}{}", edge.local_addr, path))
        .header("Host", host)
        .send()
        .await
        .unwrap();
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}

/// Poll until `done` holds, panicking after a few seconds.
pub async fn wait_until<F>(what: &str, mut done: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for {}", what);
}
