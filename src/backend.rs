//! CRM backend client.
//!
//! The backend owns all AI reasoning and persistence. This side only posts the
//! rep's message to `/chat` and reads back the assistant's reply.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::BackendError;

/// Request body for `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response body from `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub tools_used: Option<Vec<String>>,
}

impl ChatReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            action_taken: None,
            tools_used: None,
        }
    }
}

/// Transport to the backend. Implemented over HTTP in production and by
/// in-process fakes in tests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: &str) -> Result<ChatReply, BackendError>;

    /// One-shot reachability probe
    async fn check_connection(&self) -> bool;
}

/// HTTP client for the CRM backend
pub struct HttpBackend {
    client: reqwest::Client,
    chat_url: String,
    health_url: String,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        if config.backend_url.trim().is_empty() {
            return Err(BackendError::NotConfigured);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            chat_url: config.chat_url(),
            health_url: config.health_url(),
            base_url: config.backend_url.clone(),
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        error!("Backend request failed: {}", e);
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_connect() {
            BackendError::Connect {
                url: self.base_url.clone(),
                reason: e.to_string(),
            }
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(&self, message: &str) -> Result<ChatReply, BackendError> {
        debug!("Chat URL: {}", self.chat_url);

        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        debug!("Chat response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Backend API error: {}", status);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        info!(
            "Chat reply: {} chars, {} tools used",
            reply.response.len(),
            reply.tools_used.as_ref().map_or(0, |t| t.len())
        );

        Ok(reply)
    }

    async fn check_connection(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Connection check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpBackend {
        let config = Config {
            backend_url: server.uri(),
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            ..Default::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_reply_optional_fields_default() {
        let reply: ChatReply = serde_json::from_str(r#"{"response": "ok"}"#).unwrap();
        assert_eq!(reply, ChatReply::text("ok"));
    }

    #[test]
    fn test_empty_backend_url_not_configured() {
        let config = Config {
            backend_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpBackend::new(&config),
            Err(BackendError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_send_posts_message_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(serde_json::json!({ "message": "Met Dr. Smith" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Logged your meeting with Dr. Smith.",
                "action_taken": "log_interaction",
                "tools_used": ["log_interaction", "lookup_hcp"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = backend_for(&server).send("Met Dr. Smith").await.unwrap();

        assert_eq!(reply.response, "Logged your meeting with Dr. Smith.");
        assert_eq!(reply.action_taken.as_deref(), Some("log_interaction"));
        assert_eq!(reply.tools_used.map(|t| t.len()), Some(2));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend_for(&server).send("hi").await.unwrap_err();
        assert_eq!(
            err,
            BackendError::Status {
                status: 500,
                body: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = backend_for(&server).send("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let config = Config {
            // Reserved port, nothing listens here
            backend_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            connect_timeout_secs: 1,
            ..Default::default()
        };
        let backend = HttpBackend::new(&config).unwrap();

        let err = backend.send("hi").await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Connect { .. } | BackendError::Timeout | BackendError::Request(_)
        ));
        assert!(!backend.check_connection().await);
    }

    #[tokio::test]
    async fn test_check_connection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(backend_for(&server).check_connection().await);
    }

    #[tokio::test]
    async fn test_check_connection_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!backend_for(&server).check_connection().await);
    }
}
