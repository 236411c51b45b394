use std::time::Instant;

use tokio::time::timeout;
use tracing::debug;

use crate::config::OpenAiConfig;
use crate::error::OpenAiError;
use crate::request::error_message;
use crate::types::{ChatRequest, ChatResponse};

/// Posts one chat completion request under the configured timeout.
pub async fn send_chat(
    client: &reqwest::Client,
    config: &OpenAiConfig,
    body: &ChatRequest,
) -> Result<ChatResponse, OpenAiError> {
    let start_time = Instant::now();

    let call = async {
        let response = client
            .post(config.chat_completions_url())
            .bearer_auth(config.api_key())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(response.json::<ChatResponse>().await?)
    };

    match timeout(config.timeout, call).await {
        Ok(result) => {
            debug!(
                elapsed_ms = start_time.elapsed().as_millis(),
                ok = result.is_ok(),
                "chat completion finished"
            );
            result
        }
        Err(_) => Err(OpenAiError::Timeout(config.timeout)),
    }
}
