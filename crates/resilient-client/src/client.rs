//! Typed client for the ShardTalk HTTP surface.
//!
//! Every call passes through the circuit breaker keyed by the request URL (without the query
//! string) and is bounded by the configured timeout; the timeout drops the in-flight request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use shardtalk_core::{
    Address, ErrorBody, MessageCountResponse, MessageListResponse, NewMessage, PageRequest,
    SaveMessageResponse, TotalMessagesResponse,
};
use tracing::{debug, instrument, warn};

use crate::breaker::CircuitBreaker;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::retry::RetryPolicy;

/// Longest error body echoed back into [`ClientError`] messages.
const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct ShardTalkClient {
    http: reqwest::Client,
    base_url: Url,
    breaker: Arc<CircuitBreaker>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ShardTalkClient {
    /// Builds a client with its own breaker.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let breaker = Arc::new(CircuitBreaker::new(config.breaker));
        Self::with_breaker(config, breaker)
    }

    /// Builds a client sharing `breaker` with other clients in the process.
    pub fn with_breaker(
        config: ClientConfig,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, ClientError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ClientError::Url(format!("{}: {}", base, e)))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            breaker,
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Url(format!("{}: {}", path, e)))
    }

    /// `GET /messages?address=..&count=true`
    #[instrument(skip(self))]
    pub async fn message_count(&self, address: &str) -> Result<MessageCountResponse, ClientError> {
        let address = Address::parse(address)?;
        let url = self.endpoint("messages")?;
        let destination = url.to_string();
        let request = self
            .http
            .get(url)
            .query(&[("address", address.as_str()), ("count", "true")]);

        let body = self.execute(&destination, request).await?;
        decode(&body)
    }

    /// `GET /messages?address=..&page=..&limit=..`
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        address: &str,
        page: i64,
        limit: i64,
    ) -> Result<MessageListResponse, ClientError> {
        let address = Address::parse(address)?;
        let page = PageRequest::new(page, limit)?;
        let url = self.endpoint("messages")?;
        let destination = url.to_string();
        let request = self.http.get(url).query(&[
            ("address", address.as_str().to_string()),
            ("page", page.page().to_string()),
            ("limit", page.limit().to_string()),
        ]);

        let body = self.execute(&destination, request).await?;
        decode(&body)
    }

    /// `GET /totalmsg/{address}`
    #[instrument(skip(self))]
    pub async fn total_messages(&self, address: &str) -> Result<TotalMessagesResponse, ClientError> {
        let address = Address::parse(address)?;
        let url = self.endpoint(&format!("totalmsg/{}", address))?;
        let destination = url.to_string();
        let request = self.http.get(url);

        let body = self.execute(&destination, request).await?;
        decode(&body)
    }

    /// `POST /messages`, single attempt. A body with `success: false` is [`ClientError::Rejected`].
    #[instrument(skip(self, message), fields(message_id = ?message.message_id))]
    pub async fn save_message(&self, message: &NewMessage) -> Result<SaveMessageResponse, ClientError> {
        message.validate()?;
        let url = self.endpoint("messages")?;
        let destination = url.to_string();
        let request = self.http.post(url).json(message);

        let body = self.execute(&destination, request).await?;
        let response: SaveMessageResponse = decode(&body)?;
        if !response.success {
            return Err(ClientError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "success flag not set".to_string()),
            ));
        }
        Ok(response)
    }

    /// `POST /messages` with bounded exponential back-off. Each attempt still goes through the breaker.
    ///
    /// Input that fails local validation is returned immediately without any attempt.
    pub async fn save_message_with_retry(
        &self,
        message: &NewMessage,
    ) -> Result<SaveMessageResponse, ClientError> {
        message.validate()?;

        self.retry
            .run(move |attempt| {
                debug!(attempt, message_id = ?message.message_id, "Saving message");
                self.save_message(message)
            })
            .await
            .map_err(|e| {
                warn!(
                    attempts = e.attempts,
                    error = %e.last,
                    message_id = ?message.message_id,
                    "Message could not be persisted"
                );
                ClientError::RetriesExhausted {
                    attempts: e.attempts,
                    last: Box::new(e.last),
                }
            })
    }

    /// Sends `request` under the breaker and timeout and returns the body of a 2xx response.
    ///
    /// Network errors, timeouts and 5xx count as destination failures. A 4xx means the
    /// destination answered, so it closes the breaker but is still surfaced as an error.
    /// If this future is dropped mid-call, the breaker permit settles a pending probe.
    async fn execute(
        &self,
        destination: &str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, ClientError> {
        let permit = self.breaker.acquire(destination)?;

        let call = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>((status, body))
        };

        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                permit.failure();
                warn!(destination, timeout = ?self.timeout, "Request timed out");
                Err(ClientError::Timeout {
                    destination: destination.to_string(),
                    after: self.timeout,
                })
            }
            Ok(Err(e)) => {
                permit.failure();
                warn!(destination, error = %e, "Request failed");
                Err(ClientError::Network(e.to_string()))
            }
            Ok(Ok((status, body))) if status.is_server_error() => {
                permit.failure();
                warn!(destination, status = status.as_u16(), "Server error");
                Err(ClientError::Server {
                    status: status.as_u16(),
                    message: error_message(status, &body),
                })
            }
            Ok(Ok((status, body))) if status.is_client_error() => {
                permit.success();
                debug!(destination, status = status.as_u16(), "Request rejected");
                Err(ClientError::Client {
                    status: status.as_u16(),
                    message: error_message(status, &body),
                })
            }
            Ok(Ok((_, body))) => {
                permit.success();
                Ok(body)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return parsed.error;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return status.to_string();
    }
    text.chars().take(MAX_ERROR_BODY).collect()
}
