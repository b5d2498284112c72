//! HTTP client for the OpenAI-compatible completions endpoint

use super::error::{ProviderError, ProviderResult};
use super::sse::{delta_stream, DeltaStream};
use super::types::{ApiErrorBody, ChatCompletionRequest};
use crate::config::ModelConnection;
use crate::protocol::Message;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

const USER_AGENT: &str = concat!("docforge/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client issuing streaming chat completion requests.
///
/// Carries no per-exchange state: every call owns its own decoder and
/// cancellation token, so one client can serve concurrent exchanges. There
/// is deliberately no overall request timeout; generation runs until the
/// stream completes or the caller cancels.
#[derive(Clone, Debug)]
pub struct ChatClient {
    connection: ModelConnection,
    client: Client,
}

impl ChatClient {
    pub fn new(connection: ModelConnection) -> ProviderResult<Self> {
        connection
            .validate()
            .map_err(|err| ProviderError::Configuration(err.to_string()))?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| {
                ProviderError::Configuration(format!("failed to create HTTP client: {err}"))
            })?;

        Ok(Self { connection, client })
    }

    /// Model identifier requests are issued against
    pub fn model(&self) -> &str {
        &self.connection.model
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.connection.base_url.trim_end_matches('/')
        )
    }

    /// Issue the streaming request and hand the response body to the SSE
    /// decoder. Transport failures and non-success statuses surface here,
    /// before any delta is produced.
    pub async fn stream_chat(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> ProviderResult<DeltaStream> {
        let request_id = Uuid::new_v4();
        let url = self.completions_url();
        let body = ChatCompletionRequest::streaming(&self.connection.model, messages);

        debug!(%request_id, %url, model = %self.connection.model, "dispatching chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.connection.api_key.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            warn!(%request_id, %status, "chat completion request rejected");
            return Err(map_error_response(status, &headers, text));
        }

        debug!(%request_id, "response stream opened");
        Ok(delta_stream(response.bytes_stream(), cancel))
    }
}

/// Map a non-success response onto the error taxonomy: the endpoint's typed
/// error body first, status code as the fallback.
fn map_error_response(status: StatusCode, headers: &HeaderMap, body: String) -> ProviderError {
    let retry_after_secs = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&body) {
        let detail = parsed.error;
        let error_type = detail.error_type.clone().unwrap_or_default();
        return match error_type.as_str() {
            "invalid_api_key" | "authentication_error" => {
                ProviderError::Authentication(detail.message)
            }
            "rate_limit_exceeded" | "insufficient_quota" => ProviderError::RateLimit {
                message: detail.message,
                retry_after_secs,
            },
            "invalid_request_error" => ProviderError::InvalidRequest(detail.message),
            _ => ProviderError::Endpoint {
                code: detail
                    .code
                    .or(detail.error_type)
                    .unwrap_or_else(|| status.to_string()),
                message: detail.message,
            },
        };
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(body),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit {
            message: body,
            retry_after_secs,
        },
        StatusCode::BAD_REQUEST => ProviderError::InvalidRequest(body),
        status if status.is_server_error() => ProviderError::ServiceUnavailable(body),
        status => ProviderError::Endpoint {
            code: status.to_string(),
            message: body,
        },
    }
}
