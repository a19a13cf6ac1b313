//! Decision service seam
//!
//! The bridge only needs "snapshot in, reply body out". The HTTP client is
//! the production implementation; tests and offline play plug in others.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;

use super::protocol::StateSnapshot;
use crate::error::BridgeError;

/// Route appended to the configured base URL
pub const GAME_STATE_ROUTE: &str = "/game_state";

/// Boxed reply future; resolves to the raw reply body
pub type DecisionFuture = Pin<Box<dyn Future<Output = Result<String, BridgeError>> + Send + 'static>>;

/// Something that turns a state snapshot into an action reply
pub trait DecisionService: Send + Sync {
    /// Build the request. Work must not start until the future is polled.
    fn decide(&self, snapshot: StateSnapshot) -> DecisionFuture;
}

/// POSTs snapshots as JSON to `{base_url}/game_state`
#[derive(Debug, Clone)]
pub struct HttpDecisionService {
    client: Client,
    endpoint: String,
}

impl HttpDecisionService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BridgeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint_for(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DecisionService for HttpDecisionService {
    fn decide(&self, snapshot: StateSnapshot) -> DecisionFuture {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let resp = client
                .post(&endpoint)
                .json(&snapshot)
                .send()
                .await?
                .error_for_status()?;
            Ok(resp.text().await?)
        })
    }
}

fn endpoint_for(base_url: &str) -> String {
    format!("{}{GAME_STATE_ROUTE}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::parse_move_payload;
    use crate::sim::{Action, Level, Rules, SimulationWorld};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer exactly one request with `status` and `body`; the task yields the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8(request).unwrap()
        });
        (base_url, handle)
    }

    /// Headers received and the body is as long as Content-Length says
    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= split + 4 + length
    }

    fn snapshot() -> StateSnapshot {
        let level = Level::level_one().unwrap();
        StateSnapshot::capture(&SimulationWorld::from_level(&level, Rules::default()))
    }

    #[test]
    fn test_endpoint_joins_route() {
        assert_eq!(endpoint_for("http://localhost:5000"), "http://localhost:5000/game_state");
        assert_eq!(endpoint_for("http://localhost:5000/"), "http://localhost:5000/game_state");
    }

    #[test]
    fn test_client_builds() {
        let service = HttpDecisionService::new("http://127.0.0.1:5001", Duration::from_millis(500)).unwrap();
        assert_eq!(service.endpoint(), "http://127.0.0.1:5001/game_state");
    }

    #[tokio::test]
    async fn test_posts_snapshot_as_json() {
        let (base_url, server) = serve_once("200 OK", r#"{"move":"down-left"}"#).await;
        let service = HttpDecisionService::new(&base_url, Duration::from_secs(5)).unwrap();

        let body = service.decide(snapshot()).await.unwrap();
        assert_eq!(parse_move_payload(&body).unwrap(), Action::DownLeft);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /game_state "), "{request}");
        let (head, payload) = request.split_once("\r\n\r\n").unwrap();
        assert!(
            head.lines()
                .any(|l| l.to_ascii_lowercase().starts_with("content-type: application/json")),
            "{head}"
        );
        let json: serde_json::Value = serde_json::from_str(payload).unwrap();
        for key in ["player", "environment", "distances"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["environment"]["moving_obstacles"].is_array());
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let (base_url, server) = serve_once("500 Internal Server Error", r#"{"error":"model crashed"}"#).await;
        let service = HttpDecisionService::new(&base_url, Duration::from_secs(5)).unwrap();

        let result = service.decide(snapshot()).await;
        assert!(matches!(result, Err(BridgeError::Unavailable(_))), "{result:?}");
        server.await.unwrap();
    }
}
