//! Conversion between core requests/results and the wire types.

use coverage_core::backend::{CompletionRequest, CompletionResult, TokenUsage};

use crate::error::OpenAiError;
use crate::types::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Builds the request body for `request`.
#[must_use]
pub fn build_chat_request(request: &CompletionRequest) -> ChatRequest {
    ChatRequest {
        model: request.settings.model.clone(),
        messages: request
            .prompt
            .messages()
            .iter()
            .map(|m| ChatMessage {
                role: m.role().as_str().to_string(),
                content: m.content().to_string(),
            })
            .collect(),
        temperature: request.settings.temperature,
        max_tokens: request.settings.max_tokens,
    }
}

/// Takes the first choice's text as the completion.
///
/// # Errors
///
/// Returns `OpenAiError::EmptyResponse` when there is no choice or its content is null.
pub fn into_completion_result(response: ChatResponse) -> Result<CompletionResult, OpenAiError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(OpenAiError::EmptyResponse)?;

    Ok(CompletionResult {
        text,
        model: response.model,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

/// Pulls the message out of an error body, falling back to the truncated raw body.
#[must_use]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body).map_or_else(
        |_| body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
        |parsed| parsed.error.message,
    )
}

#[cfg(test)]
mod tests {
    use coverage_core::backend::CompletionSettings;
    use coverage_core::prompt::Prompt;

    use super::*;

    #[test]
    fn test_build_chat_request() {
        let request = CompletionRequest::new(
            Prompt::new("frame").with_user("hi").with_tool("lookup result"),
            CompletionSettings::default().with_max_tokens(50),
        );

        let body = build_chat_request(&request);

        assert_eq!(body.model, "gpt-4o-mini");
        assert_eq!(body.max_tokens, 50);
        let roles: Vec<&str> = body.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "tool"]);
    }

    #[test]
    fn test_null_content_is_empty_response() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(into_completion_result(response), Err(OpenAiError::EmptyResponse)));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error": {"message": "quota exceeded"}}"#), "quota exceeded");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }
}
