//! Boots the real binary against a scratch config and checks the HTTP
//! surface comes up with empty stores.

use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn minimal_config(port: u16, download_dir: &std::path::Path, db: &std::path::Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"

[fetcher]
executable = "/bin/sh"
download_dir = "{}"
refresh_interval_hours = 0
"#,
        port,
        db.display(),
        download_dir.display(),
    )
}

async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_grabarr"))
        .env("GRABARR_CONFIG", config_path)
        .env("RUST_LOG", "error")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_server_starts_and_serves_empty_stores() {
    let tmp = tempfile::tempdir().unwrap();
    let port = get_available_port();

    let mut config_file = NamedTempFile::new().unwrap();
    config_file
        .write_all(minimal_config(port, tmp.path(), &tmp.path().join("grabarr.db")).as_bytes())
        .unwrap();

    let _server = spawn_server(config_file.path()).await;
    assert!(wait_for_server(port, 100).await, "server did not come up");

    let client = Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let health: serde_json::Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let queue: serde_json::Value = client
        .get(format!("{}/api/queue", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(queue, serde_json::json!([]));

    let history: serde_json::Value = client
        .get(format!("{}/api/history", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history, serde_json::json!([]));

    // Cancelling an unknown pid over the API is a silent no-op.
    let cancel = client
        .delete(format!("{}/api/queue/ghost", base))
        .send()
        .await
        .unwrap();
    assert_eq!(cancel.status(), 204);

    let metrics = client
        .get(format!("{}/api/metrics", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("grabarr_downloads_started_total"));
}
