//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// One scripted upstream response.
#[allow(dead_code)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Content-Length to advertise; defaults to the real body length.
    /// Advertising more than is sent simulates an upstream dying mid-body.
    pub advertised_length: Option<usize>,
    /// Keep the socket open after writing instead of closing it,
    /// simulating an upstream that stalls mid-body.
    pub hold_open: bool,
}

#[allow(dead_code)]
impl MockResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            advertised_length: None,
            hold_open: false,
        }
    }

    /// Advertise `advertised` bytes but send only the real body, then close.
    pub fn truncated(body: &str, advertised: usize) -> Self {
        Self {
            advertised_length: Some(advertised),
            ..Self::ok(body)
        }
    }

    /// Advertise `advertised` bytes, send only the real body, and leave the
    /// socket hanging open.
    pub fn stalled(body: &str, advertised: usize) -> Self {
        Self {
            hold_open: true,
            ..Self::truncated(body, advertised)
        }
    }

    fn to_wire(&self) -> Vec<u8> {
        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        let length = self.advertised_length.unwrap_or(self.body.len());
        format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status, reason, length, self.body
        )
        .into_bytes()
    }
}

/// Start a scripted upstream on an ephemeral port. The closure produces the
/// response for each accepted connection.
pub async fn start_upstream<F, Fut>(respond: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            tokio::spawn(async move {
                let response = respond().await;
                let _ = socket.write_all(&response.to_wire()).await;
                if response.hold_open {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                } else {
                    let _ = socket.shutdown().await;
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            });
        }
    });

    addr
}

/// Upstream that always answers 200 with a fixed body.
#[allow(dead_code)]
pub async fn start_static_upstream(body: &'static str) -> SocketAddr {
    start_upstream(move || async move { MockResponse::ok(body) }).await
}
