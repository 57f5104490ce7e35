use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{EntityLabel, RecognizedEntity, Recognizer};
use crate::cache::MentionCache;
use crate::config::RecognizerConfig;
use crate::error::{PanlinkError, Result};

/// Request body sent to the NER service
#[derive(Serialize)]
struct RecognizeRequest<'a> {
    text: &'a str,
}

/// Response body from the NER service
#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    entities: Vec<EntityData>,
}

/// Individual entity in the service response
#[derive(Deserialize)]
struct EntityData {
    text: String,
    label: String,
    #[serde(alias = "start_char", default)]
    start: usize,
}

/// A failed call, tagged with whether retrying might help.
struct CallError {
    retryable: bool,
    error: PanlinkError,
}

/// Client for an external NER service speaking a small JSON protocol:
/// `POST {"text": ...}` answered by `{"entities": [{"text", "label", "start"}]}`.
///
/// Retries rate-limit and server errors with exponential backoff and can
/// cache results per span, since the narrow and wide windows of neighbouring
/// identifiers often repeat.
pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
    health_endpoint: Option<String>,
    api_key: Option<String>,
    max_retries: usize,
    cache: Option<Arc<MentionCache>>,
}

impl HttpRecognizer {
    /// Create a client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PanlinkError::RecognizerUnavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint,
            health_endpoint: None,
            api_key: None,
            max_retries: 2,
            cache: None,
        })
    }

    /// Build from the `[recognizer]` config section. The API key, when
    /// configured, is read from the named environment variable.
    pub fn from_config(config: &RecognizerConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            PanlinkError::Config("recognizer.endpoint is required for the http provider".to_string())
        })?;

        let mut recognizer = Self::new(endpoint, Duration::from_millis(config.timeout_ms))?
            .with_max_retries(config.max_retries);

        if let Some(health) = &config.health_endpoint {
            recognizer = recognizer.with_health_endpoint(health.clone());
        }
        if let Some(var) = &config.api_key_env {
            match std::env::var(var) {
                Ok(key) => recognizer = recognizer.with_api_key(key),
                Err(_) => log::warn!("{} not set, calling recognizer without credentials", var),
            }
        }

        Ok(recognizer)
    }

    pub fn with_health_endpoint(mut self, url: String) -> Self {
        self.health_endpoint = Some(url);
        self
    }

    pub fn with_api_key(mut self, key: String) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_cache(mut self, cache: Arc<MentionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Single request, no retry and no cache.
    async fn recognize_once(&self, span: &str) -> std::result::Result<Vec<RecognizedEntity>, CallError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&RecognizeRequest { text: span });
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| CallError {
            retryable: e.is_timeout() || e.is_connect(),
            error: PanlinkError::Recognizer(format!("Network error: {}", e)),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(CallError {
                retryable: is_retryable_status(status),
                error: PanlinkError::Recognizer(format!("NER service error {}: {}", status, body)),
            });
        }

        let result: RecognizeResponse = response.json().await.map_err(|e| CallError {
            retryable: false,
            error: PanlinkError::Recognizer(format!("Failed to parse response: {}", e)),
        })?;

        Ok(result
            .entities
            .into_iter()
            .map(|e| RecognizedEntity {
                label: EntityLabel::from_label(&e.label),
                text: e.text,
                offset: e.start,
            })
            .collect())
    }

    async fn recognize_with_retry(&self, span: &str) -> Result<Vec<RecognizedEntity>> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_millis(500);

        loop {
            match self.recognize_once(span).await {
                Ok(entities) => {
                    log::debug!(
                        "NER call took {:?} (attempt {}, {} entities)",
                        start.elapsed(),
                        attempt + 1,
                        entities.len()
                    );
                    return Ok(entities);
                }
                Err(e) if e.retryable && attempt < self.max_retries => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e.error);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e.error),
            }
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    fn name(&self) -> &str {
        "http"
    }

    async fn check_ready(&self) -> Result<()> {
        match &self.health_endpoint {
            Some(url) => {
                let response = self.client.get(url).send().await.map_err(|e| {
                    PanlinkError::RecognizerUnavailable(format!("{}: {}", url, e))
                })?;
                if !response.status().is_success() {
                    return Err(PanlinkError::RecognizerUnavailable(format!(
                        "{} answered {}",
                        url,
                        response.status()
                    )));
                }
            }
            None => {
                self.recognize_once("")
                    .await
                    .map_err(|e| PanlinkError::RecognizerUnavailable(e.error.to_string()))?;
            }
        }
        log::info!("NER service ready at {}", self.endpoint);
        Ok(())
    }

    async fn recognize(&self, span: &str) -> Result<Vec<RecognizedEntity>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(span) {
                log::debug!("Mention cache hit ({} chars)", span.len());
                return Ok(cached);
            }
        }

        let entities = self.recognize_with_retry(span).await?;

        if let Some(cache) = &self.cache {
            cache.put(span.to_string(), entities.clone());
            log::debug!("Mention cache holds {} span(s)", cache.len());
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `responses.len()` HTTP requests on a local port, one canned
    /// `(status line, body)` per request, and return the endpoint URL.
    async fn serve(responses: Vec<(&'static str, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        format!("http://{}/ner", addr)
    }

    /// Read headers plus a Content-Length body so the client sees a clean exchange.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn recognizer(endpoint: String) -> HttpRecognizer {
        HttpRecognizer::new(endpoint, Duration::from_secs(5))
            .unwrap()
            .with_max_retries(0)
    }

    #[test]
    fn test_recognizer_defaults() {
        let r = HttpRecognizer::new("http://localhost:1/ner".to_string(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(r.max_retries, 2);
        assert!(r.cache.is_none());
        assert!(r.api_key.is_none());
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = RecognizerConfig {
            endpoint: None,
            ..RecognizerConfig::default()
        };
        assert!(matches!(
            HttpRecognizer::from_config(&config),
            Err(PanlinkError::Config(_))
        ));
    }

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_recognize_parses_entities() {
        let body = r#"{"entities":[
            {"text":"Ravi Shah","label":"PERSON","start":4},
            {"text":"Acme Ltd","label":"ORG","start_char":20},
            {"text":"Pune","label":"GPE","start":40}
        ]}"#;
        let endpoint = serve(vec![("200 OK", body.to_string())]).await;

        let entities = recognizer(endpoint).recognize("span").await.unwrap();
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].label, EntityLabel::Person);
        assert_eq!(entities[0].offset, 4);
        assert_eq!(entities[1].label, EntityLabel::Organization);
        assert_eq!(entities[1].offset, 20);
        assert_eq!(entities[2].label, EntityLabel::Other("GPE".to_string()));
    }

    #[tokio::test]
    async fn test_recognize_uses_cache() {
        let body = r#"{"entities":[{"text":"Ravi Shah","label":"PERSON","start":0}]}"#;
        // Only one response is served; a second network call would fail.
        let endpoint = serve(vec![("200 OK", body.to_string())]).await;
        let cache = Arc::new(MentionCache::new(8));
        let r = recognizer(endpoint).with_cache(cache.clone());

        let first = r.recognize("Ravi Shah ABCDE1234F").await.unwrap();
        let second = r.recognize("Ravi Shah ABCDE1234F").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_on_server_error() {
        let body = r#"{"entities":[]}"#;
        let endpoint = serve(vec![
            ("503 Service Unavailable", "busy".to_string()),
            ("200 OK", body.to_string()),
        ])
        .await;

        let r = recognizer(endpoint).with_max_retries(1);
        let entities = r.recognize("span").await.unwrap();
        assert!(entities.is_empty());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let endpoint = serve(vec![("400 Bad Request", "bad".to_string())]).await;
        let r = recognizer(endpoint).with_max_retries(3);
        let err = r.recognize("span").await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_check_ready_unreachable() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let r = recognizer(format!("http://{}/ner", addr));
        let err = r.check_ready().await.unwrap_err();
        assert!(matches!(err, PanlinkError::RecognizerUnavailable(_)));
    }

    #[tokio::test]
    async fn test_check_ready_with_health_endpoint() {
        let endpoint = serve(vec![("200 OK", "{}".to_string())]).await;
        let health = endpoint.replace("/ner", "/health");
        let r = recognizer(endpoint).with_health_endpoint(health);
        assert!(r.check_ready().await.is_ok());
    }
}
