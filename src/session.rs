use crate::classifier::classify;
use crate::history::{
    history_for_request,
    rename_conversation,
    upsert_front,
    ConversationStore,
};
use crate::llm::response::ResponseService;
use crate::llm::ChatError;
use crate::models::chat::{ Conversation, Message };
use log::{ error, info };

/// Application state: the conversation list, the open conversation and the pending request.
pub struct ChatSession {
    store: ConversationStore,
    responder: ResponseService,
    conversations: Vec<Conversation>,
    current_id: Option<String>,
    loading: bool,
}

impl ChatSession {
    /// Loads the stored list and opens the most recent conversation.
    pub fn new(store: ConversationStore, responder: ResponseService) -> Self {
        let conversations = store.list();
        let current_id = conversations.first().map(|c| c.id.clone());
        info!("Loaded {} stored conversations", conversations.len());
        Self {
            store,
            responder,
            conversations,
            current_id,
            loading: false,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn current(&self) -> Option<&Conversation> {
        let id = self.current_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_configured(&self) -> bool {
        self.responder.is_configured()
    }

    /// The next message starts a fresh conversation.
    pub fn new_conversation(&mut self) {
        self.current_id = None;
    }

    pub fn select(&mut self, conversation_id: &str) -> Option<&Conversation> {
        if self.conversations.iter().any(|c| c.id == conversation_id) {
            self.current_id = Some(conversation_id.to_string());
        }
        self.current()
    }

    /// Deletes through the store; the list becomes what the store kept.
    pub fn delete(&mut self, conversation_id: &str) -> bool {
        if !self.conversations.iter().any(|c| c.id == conversation_id) {
            return false;
        }
        self.conversations = self.store.delete(conversation_id);
        if self.current_id.as_deref() == Some(conversation_id) {
            self.current_id = self.conversations.first().map(|c| c.id.clone());
        }
        true
    }

    pub fn rename_current(&mut self, title: &str) -> bool {
        let id = match &self.current_id {
            Some(id) => id.clone(),
            None => return false,
        };
        if !rename_conversation(&mut self.conversations, &id, title) {
            return false;
        }
        self.store.save_all(&self.conversations);
        true
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.conversations.clear();
        self.current_id = None;
    }

    /// Sends `text` in the open conversation, creating one if none is open.
    ///
    /// The user message is persisted before the request, so it survives a failed send.
    pub async fn send_message(&mut self, text: &str) -> Result<Message, ChatError> {
        self.loading = true;
        let result = self.exchange(text).await;
        self.loading = false;
        if let Err(e) = &result {
            error!("Send failed: {:?}", e);
        }
        result
    }

    async fn exchange(&mut self, text: &str) -> Result<Message, ChatError> {
        let conversation = match self.current() {
            Some(conversation) => conversation.clone(),
            None => ConversationStore::create(text),
        };
        let conversation = ConversationStore::append(&conversation, Message::user(text));
        self.save_current(conversation.clone());

        let history = history_for_request(&conversation);
        let model_type = classify(text);
        let reply = self.responder.get_response(text, &history).await?;

        let assistant = Message::assistant(reply, model_type);
        let conversation = ConversationStore::append(&conversation, assistant.clone());
        self.save_current(conversation);
        Ok(assistant)
    }

    fn save_current(&mut self, conversation: Conversation) {
        self.current_id = Some(conversation.id.clone());
        upsert_front(&mut self.conversations, conversation);
        self.store.save_all(&self.conversations);
    }
}
