//! In-memory store, useful for testing and ephemeral sessions.

use async_trait::async_trait;
use colloquy_core::error::StoreError;
use colloquy_core::message::Message;
use colloquy_core::store::{MessageStore, ThreadStore};
use colloquy_core::thread::{Thread, ThreadId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store holding threads and messages in process memory.
#[derive(Clone)]
pub struct InMemoryStore {
    threads: Arc<RwLock<HashMap<ThreadId, Thread>>>,
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Total number of stored messages, across all threads.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn create(&self, message: Message) -> Result<Message, StoreError> {
        let mut messages = self.messages.write().await;
        if messages.iter().any(|m| m.id == message.id) {
            return Err(StoreError::Storage(format!(
                "message id already exists: {}",
                message.id
            )));
        }
        messages.push(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Message>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }

    async fn find_many_by_thread_id(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;
        let mut found: Vec<Message> = messages
            .iter()
            .filter(|m| &m.thread_id == thread_id)
            .cloned()
            .collect();
        // Insertion order already matches creation order; the sort keeps
        // the contract explicit and is stable for equal timestamps.
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut messages = self.messages.write().await;
        let len_before = messages.len();
        messages.retain(|m| m.id != id);
        Ok(messages.len() < len_before)
    }
}

#[async_trait]
impl ThreadStore for InMemoryStore {
    async fn create(&self, thread: Thread) -> Result<Thread, StoreError> {
        let mut threads = self.threads.write().await;
        threads.insert(thread.id.clone(), thread.clone());
        Ok(thread)
    }

    async fn get(&self, id: &ThreadId) -> Result<Option<Thread>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(id).cloned())
    }

    async fn delete(&self, id: &ThreadId) -> Result<bool, StoreError> {
        let mut threads = self.threads.write().await;
        Ok(threads.remove(id).is_some())
    }
}
