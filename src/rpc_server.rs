//! PageMark RPC Server: newline-delimited JSON over stdin/stdout.
//!
//! The embedding browser shell forwards extension messages and page events
//! here, one JSON object per line.
//! Request:  {"id":1, "action":"savePosition", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr (filter via `PAGEMARK_LOG`).

use std::sync::{Arc, Mutex};
use std::time::Instant;

use pagemark::app::App;
use pagemark::config::{init_logging, AppConfig};
use pagemark::rpc_handler::handle_message;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Requests accepted per one-second window.
const MAX_REQUESTS_PER_SECOND: u32 = 200;

/// Fixed-window request limiter.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

async fn write_line(stdout: &mut tokio::io::Stdout, value: &Value) -> std::io::Result<()> {
    stdout.write_all(value.to_string().as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let config = AppConfig::from_env();
    tracing::info!(data_dir = %config.data_dir.display(), "starting pagemark-rpc");

    let app = Arc::new(Mutex::new(App::new(config)?));
    let mut stdout = tokio::io::stdout();
    write_line(&mut stdout, &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")})).await?;

    let mut rate_limiter = RateLimiter::new(MAX_REQUESTS_PER_SECOND);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request");
                write_line(&mut stdout, &json!({"id": null, "error": format!("parse error: {}", e)})).await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        if !rate_limiter.check() {
            write_line(&mut stdout, &json!({"id": id, "error": "rate limit exceeded"})).await?;
            continue;
        }

        let action = req.get("action").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let params = req.get("params").cloned().unwrap_or(json!({}));
        tracing::debug!(%action, "request");

        // The store is synchronous SQLite; keep it off the async reader.
        let app = Arc::clone(&app);
        let result = tokio::task::spawn_blocking(move || handle_message(&app, &action, &params))
            .await
            .unwrap_or_else(|e| Err(format!("handler panicked: {}", e)));

        let response = match result {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        write_line(&mut stdout, &response).await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
