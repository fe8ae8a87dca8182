// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Session state for one open chat widget.
//
// Everything the original widget kept in module globals and
// sessionStorage lives here as an explicit struct with clear init and
// teardown at widget mount/unmount. The backing store is a trait so an
// embedder can bridge to its host's session storage.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Storage keys
// ---------------------------------------------------------------------------

pub mod keys {
    /// Server-assigned conversation id.
    pub const CONVERSATION_ID: &str = "conversation_id";
    /// User message pending resumption after authentication.
    pub const LAST_MESSAGE: &str = "last_message";
    /// Active token-polling session id; a newer poll supersedes an older one.
    pub const POLLING_ID: &str = "polling_id";
    /// Auth URL remembered from the last auth-trigger link.
    pub const AUTH_URL: &str = "auth_url";
}

// ---------------------------------------------------------------------------
// SessionStore trait
// ---------------------------------------------------------------------------

/// Session-scoped key-value storage.
///
/// Implementations must be thread-safe (Send + Sync): the widget, the
/// stream processor, and the token poller all hold the same store.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
}

/// In-memory store backed by `DashMap` for concurrent access.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// State scoped to one open chat session.
///
/// The conversation id, once set by the stream, persists until history
/// restoration fails or the user abandons the conversation.
pub struct ChatSession {
    store: Arc<dyn SessionStore>,
    order_tracking: AtomicBool,
}

impl ChatSession {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            order_tracking: AtomicBool::new(false),
        }
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.store.get(keys::CONVERSATION_ID)
    }

    pub fn set_conversation_id(&self, id: &str) {
        self.store.set(keys::CONVERSATION_ID, id);
    }

    pub fn clear_conversation_id(&self) {
        self.store.remove(keys::CONVERSATION_ID);
    }

    pub fn set_last_user_message(&self, message: &str) {
        self.store.set(keys::LAST_MESSAGE, message);
    }

    /// Remove and return the pending user message, if any.
    ///
    /// Taking (rather than reading) is what makes post-auth resumption
    /// exactly-once.
    pub fn take_last_user_message(&self) -> Option<String> {
        let message = self.store.get(keys::LAST_MESSAGE)?;
        self.store.remove(keys::LAST_MESSAGE);
        Some(message)
    }

    pub fn polling_id(&self) -> Option<String> {
        self.store.get(keys::POLLING_ID)
    }

    pub fn set_polling_id(&self, id: &str) {
        self.store.set(keys::POLLING_ID, id);
    }

    pub fn clear_polling_id(&self) {
        self.store.remove(keys::POLLING_ID);
    }

    pub fn auth_url(&self) -> Option<String> {
        self.store.get(keys::AUTH_URL)
    }

    pub fn set_auth_url(&self, url: &str) {
        self.store.set(keys::AUTH_URL, url);
    }

    pub fn order_tracking_mode(&self) -> bool {
        self.order_tracking.load(Ordering::Relaxed)
    }

    pub fn set_order_tracking_mode(&self, on: bool) {
        self.order_tracking.store(on, Ordering::Relaxed);
    }

    /// Abandon the conversation: wipe stored state and leave any mode.
    pub fn reset(&self) {
        self.store.clear();
        self.order_tracking.store(false, Ordering::Relaxed);
    }
}
