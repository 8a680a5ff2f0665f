use crate::cache::{ self, ResponseCache };
use crate::llm::chat::ChatClient;
use crate::llm::ChatError;
use crate::markdown::clean_markdown;
use crate::models::chat::ChatTurn;
use log::{ info, warn };
use std::sync::Arc;

pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Turns a conversation history into a cleaned assistant reply.
pub struct ResponseService {
    client: Arc<dyn ChatClient>,
    system_prompt: String,
    history_window: usize,
    cache: Option<ResponseCache>,
}

impl ResponseService {
    pub fn new(client: Arc<dyn ChatClient>, system_prompt: impl Into<String>, history_window: usize) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            history_window,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    pub fn model(&self) -> String {
        self.client.get_model()
    }

    /// System instruction followed by the last `history_window` turns.
    pub fn build_messages(&self, history: &[ChatTurn]) -> Vec<ChatTurn> {
        let start = history.len().saturating_sub(self.history_window);
        let mut messages = Vec::with_capacity(history.len() - start + 1);
        messages.push(ChatTurn::new("system", self.system_prompt.clone()));
        messages.extend_from_slice(&history[start..]);
        messages
    }

    /// `history` already ends with the user's `question`; the question itself is only logged.
    pub async fn get_response(&self, question: &str, history: &[ChatTurn]) -> Result<String, ChatError> {
        let messages = self.build_messages(history);
        info!("Requesting answer for a {}-character question", question.chars().count());

        let key = cache::normalize(&messages[1..]);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                return Ok(hit);
            }
        }

        let completion = self.client.complete(&messages).await.map_err(|e| {
            warn!("Chat request failed: {:?}", e);
            e
        })?;
        let content = clean_markdown(&completion.response);

        if let Some(cache) = &self.cache {
            cache.insert(key, content.clone());
        }
        Ok(content)
    }
}
