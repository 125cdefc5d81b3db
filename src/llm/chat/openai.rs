use async_trait::async_trait;
use log::{ info, warn };
use reqwest::{ Client as HttpClient, StatusCode, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::{ ChatClient, ChatMessage, CompletionResponse };
use crate::llm::{ DecodingParams, LlmConfig, RemoteError, DEFAULT_BASE_URL, DEFAULT_MODEL };

const COMPLETIONS_ROUTE: &str = "/v1/chat/completions";

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    params: DecodingParams,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        model: Option<String>,
        base_url: Option<String>,
        params: DecodingParams,
        timeout: std::time::Duration
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
            params,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Self::new(
            config.completion_model.clone(),
            config.base_url.clone(),
            config.params,
            config.timeout,
        )
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}{}", base, COMPLETIONS_ROUTE)
        }
    }
}

fn map_status(status: StatusCode) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::InvalidCredential,
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited,
        other => RemoteError::Unavailable(format!("HTTP {}", other)),
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        credential: &str
    ) -> Result<CompletionResponse, RemoteError> {
        let url = self.completions_url();
        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
            presence_penalty: self.params.presence_penalty,
            frequency_penalty: self.params.frequency_penalty,
        };

        let resp = self.http.post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", credential))
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                warn!("Completion request to {} failed: {}", url, e);
                if e.is_timeout() {
                    RemoteError::Unavailable("request timed out".to_string())
                } else {
                    RemoteError::Unavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Completion endpoint answered {}", status);
            return Err(map_status(status));
        }

        let body = resp.json::<OpenAIResponse>().await.map_err(|e| {
            warn!("Unreadable completion payload: {}", e);
            RemoteError::EmptyResponse
        })?;

        let content = body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(RemoteError::EmptyResponse)?;

        info!("Received {} characters from {}", content.len(), self.model);
        Ok(CompletionResponse { response: content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client_for(base: &str) -> OpenAIChatClient {
        OpenAIChatClient::new(None, Some(base.to_string()), DecodingParams::default(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(client_for("http://localhost:8080/").completions_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(
            client_for("https://proxy.local/openai/v1/chat/completions").completions_url(),
            "https://proxy.local/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(StatusCode::UNAUTHORIZED), RemoteError::InvalidCredential);
        assert_eq!(map_status(StatusCode::FORBIDDEN), RemoteError::InvalidCredential);
        assert_eq!(map_status(StatusCode::TOO_MANY_REQUESTS), RemoteError::RateLimited);
        assert!(matches!(map_status(StatusCode::BAD_GATEWAY), RemoteError::Unavailable(_)));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let req = OpenAIChatRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            max_tokens: 300,
            temperature: 0.7,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 300);
        assert!(value.get("presence_penalty").is_some());
        assert!(value.get("frequency_penalty").is_some());
    }
}
