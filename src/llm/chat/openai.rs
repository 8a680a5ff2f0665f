use async_trait::async_trait;
use log::{ debug, error, info };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ ChatError, LlmConfig, DEFAULT_MODEL };
use crate::models::chat::ChatTurn;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 2500;
const REFERER_HEADER: HeaderName = HeaderName::from_static("http-referer");
const TITLE_HEADER: HeaderName = HeaderName::from_static("x-title");

/// Client for OpenAI-compatible chat-completions endpoints (OpenRouter by default).
///
/// The key is optional so that a missing key surfaces as [`ChatError::NotConfigured`] on
/// every send instead of failing startup.
pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
    app_name: String,
    app_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        base_url: String,
        app_name: String,
        app_url: String,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url,
            app_name,
            app_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        let base_url = config.base_url
            .clone()
            .unwrap_or_else(|| config.llm_type.default_base_url().to_string());
        Self::new(
            config.api_key.clone(),
            config.completion_model.clone(),
            base_url,
            config.app_name.clone(),
            config.app_url.clone(),
        )
    }

    fn request_headers(&self, api_key: &str) -> Result<HeaderMap, ChatError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
            error!("API key cannot be sent as a header: {}", e);
            ChatError::InvalidCredential
        })?;
        headers.insert(AUTHORIZATION, bearer);
        if let Ok(referer) = HeaderValue::from_str(&self.app_url) {
            headers.insert(REFERER_HEADER, referer);
        }
        if let Ok(title) = HeaderValue::from_str(&self.app_name) {
            headers.insert(TITLE_HEADER, title);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<CompletionResponse, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        info!("Sending {} messages to {} ({})", messages.len(), self.base_url, self.model);
        let resp = self.http
            .post(&self.base_url)
            .headers(self.request_headers(api_key)?)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                error!("Chat request failed: {}", e);
                ChatError::from_transport(&e)
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            error!("Failed to read chat response body: {}", e);
            ChatError::from_transport(&e)
        })?;

        if !status.is_success() {
            error!("API error response ({}): {}", status, body);
            return Err(ChatError::from_status(status.as_u16(), &body));
        }
        debug!("Raw chat response: {}", body);

        let parsed: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Invalid response format from API: {}", e);
            ChatError::MalformedResponse
        })?;

        let content = parsed.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                error!("API response has no choices[0].message.content");
                ChatError::MalformedResponse
            })?;

        Ok(CompletionResponse { response: content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
