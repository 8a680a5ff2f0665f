pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use super::{ ChatError, LlmConfig };
use self::openai::OpenAIChatClient;
use crate::models::chat::ChatTurn;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub response: String,
}

/// One request/response exchange with a chat-completions backend.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<CompletionResponse, ChatError>;

    fn get_model(&self) -> String;
    fn is_configured(&self) -> bool {
        true
    }
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, reqwest::Error> {
    // Both providers speak the same chat-completions dialect.
    let client: Arc<dyn ChatClient> = Arc::new(OpenAIChatClient::from_config(config)?);
    Ok(client)
}
