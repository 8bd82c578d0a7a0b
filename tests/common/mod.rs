//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry_sdk::trace::TracerProvider;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use playlists_api::config::AppConfig;
use playlists_api::http::HttpServer;
use playlists_api::lifecycle::{startup, Shutdown};
use playlists_api::observability::Tracing;
use playlists_api::playlists::{KeyValueStore, StoreError};
use playlists_api::videos::HttpVideoClient;

/// What the mock video service does for one request.
#[allow(dead_code)]
pub enum Reply {
    /// 200 with this body.
    Ok(String),
    /// Arbitrary status and body.
    Status(u16, String),
    /// Close the socket without answering.
    Hangup,
}

/// A request as seen by the mock video service.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: HashMap<String, String>,
}

pub type Recorder = Arc<Mutex<Vec<Recorded>>>;

/// Valid video JSON for `id`.
pub fn video_json(id: &str) -> String {
    format!(
        r#"{{"id":"{id}","title":"Title {id}","description":"About {id}","imageurl":"https://img/{id}.png","url":"https://videos/{id}"}}"#
    )
}

/// Start a programmable video backend on an ephemeral port.
///
/// `f` receives the video id (request path without the leading slash).
pub async fn start_video_backend<F>(f: F) -> (SocketAddr, Recorder)
where
    F: Fn(&str) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder: Recorder = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen = recorder.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        handle(socket, f.as_ref(), &seen).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, recorder)
}

async fn handle<F>(mut socket: TcpStream, f: &F, seen: &Recorder)
where
    F: Fn(&str) -> Reply,
{
    let Some(request) = read_head(&mut socket).await else {
        return;
    };
    let id = request.path.trim_start_matches('/').to_string();
    seen.lock().unwrap().push(request);

    let (status_line, body) = match f(&id) {
        Reply::Ok(body) => ("200 OK".to_string(), body),
        Reply::Status(code, body) => (format!("{} Mock", code), body),
        Reply::Hangup => {
            let _ = socket.shutdown().await;
            return;
        }
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn read_head(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut lines = head.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    Some(Recorded { path, headers })
}

/// In-memory stand-in for Redis.
#[allow(dead_code)]
pub enum MemoryStore {
    Value(Option<String>),
    Down,
    /// Answers `[]` only after the delay.
    Slow(Duration),
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        assert_eq!(key, "playlists");
        match self {
            MemoryStore::Value(v) => Ok(v.clone()),
            MemoryStore::Down => Err(StoreError::Timeout(Duration::from_millis(5))),
            MemoryStore::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Some("[]".to_string()))
            }
        }
    }
}

/// Tracer with no exporter.
pub fn test_tracing() -> Tracing {
    Tracing::from_provider(&TracerProvider::builder().build(), "playlists-api-test")
}

/// Run the service against `store` and a video backend at `videos`.
///
/// Returns the service address and the shutdown handle.
pub async fn spawn_service(
    mut config: AppConfig,
    store: MemoryStore,
    videos: SocketAddr,
    tracing: Tracing,
) -> (SocketAddr, Shutdown) {
    config.videos.base_url = format!("http://{}", videos);
    config.videos.timeout_ms = 2_000;

    let video_client = HttpVideoClient::new(&config.videos, tracing.clone()).unwrap();
    let state = startup::assemble(&config, Arc::new(store), Arc::new(video_client), tracing);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(&config, state);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that never goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
