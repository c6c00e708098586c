//! Test utilities shared by the integration tests in this crate.

use std::path::Path;
use std::time::Duration;

use axum_test::TestServer;

use crate::config::{Config, LimitsConfig, ProcessingConfig, ProgressConfig, StorageConfig};

/// Small limits, no engine delay and a fast progress channel, with all storage under `root`.
pub fn create_test_config(root: &Path) -> Config {
    Config {
        port: 0,
        storage: StorageConfig::rooted_at(root),
        limits: LimitsConfig {
            max_file_size: 1024,
            max_batch_files: 3,
            ..Default::default()
        },
        processing: ProcessingConfig {
            delay: Duration::ZERO,
            ..Default::default()
        },
        progress: ProgressConfig {
            interval: Duration::from_millis(5),
            step: 10,
        },
        ..Default::default()
    }
}

pub async fn create_test_app(config: Config) -> TestServer {
    crate::Application::new(config)
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// Like [`create_test_app`] but served over a real socket, which WebSocket tests need.
pub async fn create_http_test_app(config: Config) -> TestServer {
    let app = crate::Application::new(config).await.expect("Failed to create application");
    TestServer::builder()
        .http_transport()
        .build(app.router)
        .expect("Failed to create test server")
}

/// Files whose name starts with `<anything>_<filename>` in the uploads directory
pub fn stored_copies(root: &Path, filename: &str) -> Vec<std::path::PathBuf> {
    let suffix = format!("_{filename}");
    std::fs::read_dir(root.join("uploads"))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(&suffix)))
                .collect()
        })
        .unwrap_or_default()
}
