//! Persistence ports for threads and messages.
//!
//! The run loop only appends: it creates messages, never mutates persisted
//! records. Implementations live in `colloquy-store`.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::message::Message;
use crate::thread::{Thread, ThreadId};

/// Message persistence port.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message and return it as stored.
    async fn create(&self, message: Message) -> std::result::Result<Message, StoreError>;

    /// Look up a single message by id.
    async fn find_by_id(&self, id: &str) -> std::result::Result<Option<Message>, StoreError>;

    /// All messages of a thread, ascending by creation time.
    async fn find_many_by_thread_id(
        &self,
        thread_id: &ThreadId,
    ) -> std::result::Result<Vec<Message>, StoreError>;

    /// Delete a message. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> std::result::Result<bool, StoreError>;
}

/// Thread persistence port.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn create(&self, thread: Thread) -> std::result::Result<Thread, StoreError>;

    async fn get(&self, id: &ThreadId) -> std::result::Result<Option<Thread>, StoreError>;

    /// Delete a thread. Returns whether anything was removed.
    async fn delete(&self, id: &ThreadId) -> std::result::Result<bool, StoreError>;
}
