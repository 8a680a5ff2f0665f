mod file;
mod memory;

pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;

use crate::cli::Args;
use crate::models::chat::{ ChatTurn, Conversation, Message };
use chrono::Utc;
use log::{ error, info, warn };
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Key under which the whole conversation list is stored.
pub const STORAGE_KEY: &str = "aitutor_conversations";
pub const TITLE_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored conversations are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported history store type: {0}")]
    UnsupportedType(String),
}

/// A single-key blob store holding the serialized conversation list.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, blob: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    fn describe(&self) -> String;
}

pub fn create_history_store(args: &Args) -> Result<Arc<dyn HistoryStore>, StorageError> {
    match args.history_type.to_lowercase().as_str() {
        "file" => {
            let dir = match &args.history_path {
                Some(path) => PathBuf::from(path),
                None => default_data_dir(),
            };
            Ok(Arc::new(FileHistoryStore::new(dir, STORAGE_KEY)))
        }
        "memory" => Ok(Arc::new(MemoryHistoryStore::default())),
        other => Err(StorageError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_history_store(args: &Args) -> Result<Arc<dyn HistoryStore>, StorageError> {
    let store = create_history_store(args)?;
    info!("Chat history will be stored in: {}", store.describe());
    Ok(store)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aitutor")
}

/// Conversation persistence. Every mutation rewrites the whole list; the last write wins.
#[derive(Clone)]
pub struct ConversationStore {
    backend: Arc<dyn HistoryStore>,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn HistoryStore>) -> Self {
        Self { backend }
    }

    pub fn create(first_message: &str) -> Conversation {
        let now = Utc::now().timestamp_millis();
        Conversation {
            id: Uuid::new_v4().to_string(),
            title: derive_title(first_message),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a new value; `conversation` is left untouched.
    pub fn append(conversation: &Conversation, message: Message) -> Conversation {
        let mut updated = conversation.clone();
        updated.messages.push(message);
        updated.updated_at = Utc::now().timestamp_millis().max(conversation.updated_at);
        updated
    }

    /// Missing or unreadable storage yields an empty list.
    pub fn list(&self) -> Vec<Conversation> {
        let blob = match self.backend.load() {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Failed to load conversations: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Conversation>>(&blob) {
            Ok(conversations) => conversations,
            Err(e) => {
                error!("Failed to load conversations: {}", StorageError::from(e));
                Vec::new()
            }
        }
    }

    /// Write failures are logged and dropped.
    pub fn save_all(&self, conversations: &[Conversation]) {
        let result = serde_json::to_string(conversations)
            .map_err(StorageError::from)
            .and_then(|blob| self.backend.save(&blob));
        if let Err(e) = result {
            error!("Failed to save conversations: {}", e);
        }
    }

    pub fn delete(&self, conversation_id: &str) -> Vec<Conversation> {
        let remaining = remove_conversation(self.list(), conversation_id);
        self.save_all(&remaining);
        remaining
    }

    pub fn clear_all(&self) {
        if let Err(e) = self.backend.clear() {
            warn!("Failed to clear conversations: {}", e);
        }
    }
}

fn derive_title(first_message: &str) -> String {
    if first_message.chars().count() > TITLE_LIMIT {
        let head: String = first_message.chars().take(TITLE_LIMIT).collect();
        format!("{}...", head)
    } else {
        first_message.to_string()
    }
}

/// Drops the conversation with `conversation_id`; the list is unchanged if it is absent.
pub fn remove_conversation(conversations: Vec<Conversation>, conversation_id: &str) -> Vec<Conversation> {
    conversations.into_iter().filter(|c| c.id != conversation_id).collect()
}

/// Replaces the title in place. Returns false when no conversation matches.
pub fn rename_conversation(conversations: &mut [Conversation], conversation_id: &str, title: &str) -> bool {
    match conversations.iter_mut().find(|c| c.id == conversation_id) {
        Some(conversation) => {
            conversation.title = title.to_string();
            true
        }
        None => false,
    }
}

/// Moves `conversation` to the front, replacing any stored copy with the same id.
pub fn upsert_front(conversations: &mut Vec<Conversation>, conversation: Conversation) {
    conversations.retain(|c| c.id != conversation.id);
    conversations.insert(0, conversation);
}

/// Case-insensitive substring match on the title. An empty term matches everything.
pub fn title_matches(conversation: &Conversation, term: &str) -> bool {
    conversation.title.to_lowercase().contains(&term.trim().to_lowercase())
}

pub fn history_for_request(conversation: &Conversation) -> Vec<ChatTurn> {
    conversation.messages.iter().map(ChatTurn::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ ModelType, Role };

    fn store() -> (ConversationStore, Arc<MemoryHistoryStore>) {
        let backend = Arc::new(MemoryHistoryStore::default());
        (ConversationStore::new(backend.clone()), backend)
    }

    #[test]
    fn create_then_append() {
        let conversation = ConversationStore::create("hello");
        assert_eq!(conversation.title, "hello");
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.created_at, conversation.updated_at);

        let updated = ConversationStore::append(&conversation, Message::user("hello"));
        assert_eq!(updated.messages.len(), 1);
        assert_eq!(updated.title, "hello");
        assert!(updated.updated_at >= conversation.updated_at);
        assert!(conversation.messages.is_empty(), "input must not be mutated");
    }

    #[test]
    fn long_first_message_truncates_title() {
        let first = "a".repeat(80);
        let conversation = ConversationStore::create(&first);
        assert_eq!(conversation.title, format!("{}...", "a".repeat(50)));
        assert_eq!(conversation.title.chars().count(), 53);
    }

    #[test]
    fn exactly_fifty_chars_is_kept() {
        let first = "é".repeat(50);
        assert_eq!(ConversationStore::create(&first).title, first);
    }

    #[test]
    fn messages_stay_chronological() {
        let mut conversation = ConversationStore::create("q");
        conversation = ConversationStore::append(&conversation, Message::user("q"));
        conversation = ConversationStore::append(&conversation, Message::assistant("a", ModelType::Academic));
        let roles: Vec<Role> = conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        let turns = history_for_request(&conversation);
        assert_eq!(turns, vec![ChatTurn::new("user", "q"), ChatTurn::new("assistant", "a")]);
    }

    #[test]
    fn save_then_list_round_trips() {
        let (store, _) = store();
        let a = ConversationStore::append(&ConversationStore::create("a"), Message::user("a"));
        let b = ConversationStore::create("b");
        store.save_all(&[a.clone(), b.clone()]);
        assert_eq!(store.list(), vec![a, b]);
    }

    #[test]
    fn empty_or_corrupt_storage_lists_nothing() {
        let (store, backend) = store();
        assert!(store.list().is_empty());
        backend.save("{not json").unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn delete_missing_id_is_a_no_op() {
        let (store, _) = store();
        let list = vec![ConversationStore::create("a"), ConversationStore::create("b")];
        store.save_all(&list);
        assert_eq!(store.delete("missing"), list);
        assert_eq!(store.list(), list);
    }

    #[test]
    fn delete_removes_match() {
        let (store, _) = store();
        let list = vec![ConversationStore::create("a"), ConversationStore::create("b")];
        store.save_all(&list);
        let remaining = store.delete(&list[0].id);
        assert_eq!(remaining, vec![list[1].clone()]);
        assert_eq!(store.list(), remaining);
    }

    #[test]
    fn rename_and_upsert() {
        let mut list = vec![ConversationStore::create("a"), ConversationStore::create("b")];
        let id = list[1].id.clone();
        assert!(rename_conversation(&mut list, &id, "renamed"));
        assert!(!rename_conversation(&mut list, "missing", "x"));

        let touched = ConversationStore::append(&list[1], Message::user("more"));
        upsert_front(&mut list, touched);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, id);
        assert_eq!(list[0].title, "renamed");
        assert_eq!(list[0].messages.len(), 1);

        upsert_front(&mut list, ConversationStore::create("c"));
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].title, "c");
    }

    #[test]
    fn clear_all_empties_storage() {
        let (store, _) = store();
        store.save_all(&[ConversationStore::create("a")]);
        store.clear_all();
        assert!(store.list().is_empty());
    }

    #[test]
    fn title_search_ignores_case() {
        let list = vec![ConversationStore::create("Photosynthesis basics"), ConversationStore::create("Rust lifetimes")];
        let hits: Vec<&str> = list.iter().filter(|c| title_matches(c, "RUST")).map(|c| c.title.as_str()).collect();
        assert_eq!(hits, vec!["Rust lifetimes"]);
        assert!(list.iter().all(|c| title_matches(c, "")));
        assert!(!list.iter().any(|c| title_matches(c, "calculus")));
    }
}
