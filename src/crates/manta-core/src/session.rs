//! In-memory session log
//!
//! This module provides **[`SessionStore`]** - an append-only, ordered
//! message log keyed by session identifier, held in memory for the
//! process lifetime. It backs multi-turn conversations: the turn loop
//! appends each user message and exactly one assistant message per
//! turn, and reads the full history back before every model call.
//!
//! # Overview
//!
//! - **Append-only** - entries are never edited or reordered
//! - **Lazy creation** - a session springs into existence on first append
//! - **Thread-safe** - `Arc<RwLock<HashMap>>` for concurrent access
//! - **Ephemeral** - everything is lost on process exit, deliberately
//! - **Testing-friendly** - includes `clear()` for test isolation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  SessionStore                                │
//! │  Arc<RwLock<HashMap>>                        │
//! │  ┌────────────────────────────────────────┐  │
//! │  │  "user-session-1"                      │  │
//! │  │    ├─ [0] Message (user)               │  │
//! │  │    ├─ [1] Message (assistant)          │  │
//! │  │    └─ [2] Message (user)               │  │
//! │  │  "user-session-2"                      │  │
//! │  │    └─ [0] Message (user)               │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Distinct session keys never share state; concurrent turns on
//! different sessions only contend on the map lock itself. There is no
//! persistence beyond process memory and none is planned; anything
//! that needs durable transcripts should copy them out.
//!
//! # Example
//!
//! ```rust
//! use manta_core::{Message, SessionStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SessionStore::new();
//!
//!     store.append("user-session-1", Message::user("hello")).await;
//!     store.append("user-session-1", Message::assistant("hi!")).await;
//!
//!     let history = store.history("user-session-1").await;
//!     assert_eq!(history.len(), 2);
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::messages::Message;

/// Thread-safe session-keyed message storage
type SessionStorage = Arc<RwLock<HashMap<String, Vec<Message>>>>;

/// Append-only per-session message log, in memory only
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    storage: SessionStorage,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Append a message to a session's log
    ///
    /// The session is created on first use.
    pub async fn append(&self, session_id: &str, message: Message) {
        let mut storage = self.storage.write().await;
        storage
            .entry(session_id.to_string())
            .or_insert_with(Vec::new)
            .push(message);
    }

    /// Full ordered history for a session
    ///
    /// Unknown sessions yield an empty history.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        let storage = self.storage.read().await;
        storage.get(session_id).cloned().unwrap_or_default()
    }

    /// Number of sessions being tracked
    pub async fn session_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Number of messages in one session
    pub async fn message_count(&self, session_id: &str) -> usize {
        self.storage
            .read()
            .await
            .get(session_id)
            .map(|messages| messages.len())
            .unwrap_or(0)
    }

    /// Drop all sessions (useful for testing)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
