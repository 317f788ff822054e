//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gift_registry::config::{GiftSeed, RegistryConfig};
use gift_registry::http::HttpServer;
use gift_registry::lifecycle::startup::seed_gifts;
use gift_registry::lifecycle::Shutdown;
use gift_registry::registry::{InMemoryBackend, RegistryBackend};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const ADMIN_KEY: &str = "integration-admin-key";
pub const BACKEND_SECRET: &str = "backend-secret";

/// A running registry service.
pub struct TestServer {
    pub base_url: String,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<RegistryConfig>,
    pub backend: InMemoryBackend,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with admin enabled and rate limiting off.
pub fn test_config() -> RegistryConfig {
    let mut config = RegistryConfig::default();
    config.pix.key = "casal@example.com".into();
    config.pix.merchant_name = "Davi e Larissa".into();
    config.pix.merchant_city = "Rio de Janeiro".into();
    config.event.title = "Chá de Casa Nova".into();
    config.event.shipping_address = "Rua das Flores, 10".into();
    config.rate_limit.enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config.backend.admin_secret = BACKEND_SECRET.into();
    config
}

pub fn seed(name: &str, price: f64, max_quantity: u32) -> GiftSeed {
    GiftSeed {
        name: name.into(),
        price: Some(price),
        max_quantity,
        ..Default::default()
    }
}

/// Catalog used by most tests: ids 1..=4.
pub fn default_seeds() -> Vec<GiftSeed> {
    let mut knife = seed("Faca do chef", 180.0, 1);
    knife.warning_title = Some("Objeto cortante".into());
    knife.warning_message = Some("Entregar embrulhado".into());
    knife.category = Some("Cozinha".into());

    let mut towels = seed("Jogo de toalhas", 89.9, 3);
    towels.category = Some("Banheiro".into());

    vec![seed("Air fryer", 399.9, 1), towels, knife, seed("Porta-retrato", 35.0, 2)]
}

/// Start the service on an ephemeral port with an in-memory backend.
pub async fn spawn_server(config: RegistryConfig, seeds: &[GiftSeed]) -> TestServer {
    let backend = InMemoryBackend::with_gifts(config.backend.admin_secret.clone(), seed_gifts(seeds));
    let (base_url, shutdown, config_tx) = spawn_with_backend(config, Arc::new(backend.clone())).await;

    TestServer {
        base_url,
        shutdown,
        config_tx,
        backend,
    }
}

/// Start the service on an ephemeral port in front of `backend`.
pub async fn spawn_with_backend(
    config: RegistryConfig,
    backend: Arc<dyn RegistryBackend>,
) -> (String, Shutdown, mpsc::UnboundedSender<RegistryConfig>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, backend);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown, config_tx)
}

/// A request as seen by the mock database.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Start a programmable HTTP responder standing in for the database API.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let (status, body) = f(request).await;
                let status_text = match status {
                    200 => "200 OK",
                    201 => "201 Created",
                    204 => "204 No Content",
                    400 => "400 Bad Request",
                    401 => "401 Unauthorized",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(MockRequest { method, path, headers, body })
}
