use super::{ HistoryStore, StorageError };
use std::sync::Mutex;

/// Keeps the blob in process memory; nothing survives a restart.
#[derive(Default)]
pub struct MemoryHistoryStore {
    blob: Mutex<Option<String>>,
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, blob: &str) -> Result<(), StorageError> {
        *self.blob.lock().unwrap_or_else(|e| e.into_inner()) = Some(blob.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.blob.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
