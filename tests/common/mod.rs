//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use script_gate::{HttpServer, ProxyConfig, Shutdown};

/// Content type every mock upstream answers with.
pub const MOCK_CONTENT_TYPE: &str = "application/x-lua";

/// A mock upstream that counts calls and records request heads.
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/raw/script.lua", self.addr)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Lowercased request heads received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).to_lowercase()
}

/// Start a programmable upstream on an ephemeral port.
pub async fn start_upstream<F, Fut>(f: F) -> MockUpstream
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let f = Arc::new(f);
    start_raw_upstream(move || {
        let f = f.clone();
        async move {
            let (status, body) = f().await;
            format!(
                "HTTP/1.1 {} Mock\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                MOCK_CONTENT_TYPE,
                body.len(),
                body
            )
        }
    })
    .await
}

/// Start an upstream whose closure writes the whole HTTP response.
pub async fn start_raw_upstream<F, Fut>(f: F) -> MockUpstream
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let (c, r) = (calls.clone(), requests.clone());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let (f, c, r) = (f.clone(), c.clone(), r.clone());
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                c.fetch_add(1, Ordering::SeqCst);
                r.lock().unwrap().push(head);

                let response = f().await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockUpstream { addr, calls, requests }
}

/// Start an upstream that answers every request with `302` to `location`.
#[allow(dead_code)]
pub async fn start_redirecting_upstream(location: String) -> MockUpstream {
    start_raw_upstream(move || {
        let location = location.clone();
        async move {
            format!(
                "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                location
            )
        }
    })
    .await
}

/// Start an upstream that always answers with a fixed status and body.
#[allow(dead_code)]
pub async fn start_fixed_upstream(status: u16, body: &'static str) -> MockUpstream {
    start_upstream(move || async move { (status, body.to_string()) }).await
}

/// Start an upstream that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_upstream() -> MockUpstream {
    start_upstream(|| async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        (200, String::new())
    })
    .await
}

/// A gate running on an ephemeral port.
pub struct RunningGate {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl RunningGate {
    pub fn script_url(&self) -> String {
        format!("http://{}/obtener-script", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Baseline config: api key `k1`, upstream `url`.
#[allow(dead_code)]
pub fn config_for(url: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.gate.api_key = Some("k1".into());
    config.upstream.url = Some(url.to_string());
    config.upstream.timeout_ms = 2_000;
    config.timeouts.request_secs = 10;
    config
}

/// Start the gate with `config` on 127.0.0.1 and an ephemeral port.
pub async fn start_gate(mut config: ProxyConfig) -> RunningGate {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningGate { addr, shutdown }
}

/// HTTP client without pooling or system proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
