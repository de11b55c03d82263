//! Test utilities & fixtures.
//! Builds throwaway configs under a temp dir and runs a live server on an
//! ephemeral port.

#![allow(dead_code)]

use std::path::Path;

use chirpy::config::{Argon2Config, Config, SecurityConfig};
use chirpy::server::ChirpyServer;
use tokio::sync::oneshot;

pub const TEST_SECRET: &str = "test-secret-test-secret-test-secret-0123";

/// Config rooted in `root` with cheap Argon2 params so tests stay fast.
pub fn test_config(root: &Path, platform: &str) -> Config {
    let mut cfg = Config::default();
    cfg.server.bind_addr = "127.0.0.1:0".to_string();
    cfg.server.platform = platform.to_string();
    cfg.server.static_dir = root.join("public").to_string_lossy().into_owned();
    cfg.auth.token_secret = TEST_SECRET.to_string();
    cfg.security = Some(SecurityConfig {
        argon2: Some(Argon2Config {
            memory_kib: Some(1024),
            time_cost: Some(1),
            parallelism: Some(1),
        }),
    });
    cfg.storage.data_dir = root.join("data").to_string_lossy().into_owned();
    cfg.logging.file = None;
    cfg.logging.security_file = None;
    cfg
}

/// A running server plus the temp dir backing it. Dropping it stops the
/// server and removes the data.
pub struct TestServer {
    pub base: String,
    pub config: Config,
    shutdown: Option<oneshot::Sender<()>>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn spawn_server(platform: &str) -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let public = dir.path().join("public");
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(public.join("index.html"), "<html><body>Welcome to Chirpy</body></html>")
        .unwrap();

    let config = test_config(dir.path(), platform);
    let server = ChirpyServer::new(config.clone()).await.expect("server");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(server.serve(listener, async move {
        let _ = rx.await;
    }));

    TestServer {
        base: format!("http://{}", addr),
        config,
        shutdown: Some(tx),
        _dir: dir,
    }
}
