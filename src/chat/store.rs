//! Per-user chat session store
//!
//! [`SessionStore`] owns the signed-in user's chat sessions and the "current
//! session" pointer, and mirrors both into the local key-value store after
//! every mutation so a restart picks up where the user left off.
//!
//! Persistence is best-effort: write failures are logged and the in-memory
//! state stays authoritative; unreadable data on load is treated as a cold
//! start.

use crate::chat::session::{ChatSession, Message, MessageRole};
use crate::storage::{keys, KeyValueStore};
use std::sync::Arc;

/// Ordered collection of one user's chat sessions
///
/// Sessions are kept newest first. Whenever the list is non-empty exactly one
/// session is current.
///
/// # Examples
///
/// ```
/// use astravaani::chat::{Message, SessionStore};
/// use astravaani::storage::MemoryStore;
/// use std::sync::Arc;
///
/// let mut store = SessionStore::new(Arc::new(MemoryStore::new()));
/// store.load("user-1");
///
/// let id = store.create_session();
/// assert!(store.append_message(&id, Message::user("Namaste")));
/// assert_eq!(store.current().unwrap().title, "Namaste");
/// ```
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    current: Option<String>,
    user_id: Option<String>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// An empty store backed by `storage`; call [`SessionStore::load`] next
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sessions: Vec::new(),
            current: None,
            user_id: None,
            storage,
        }
    }

    /// Load the sessions of `user_id`
    ///
    /// If a different user was the last to load sessions from this storage,
    /// that user's slot is invalidated first. When the user has no
    /// multi-session data yet, a legacy single-thread history is migrated into
    /// one session.
    pub fn load(&mut self, user_id: &str) {
        self.invalidate_previous_user(user_id);

        self.user_id = Some(user_id.to_string());
        self.sessions.clear();
        self.current = None;

        let mut migrated = false;
        match self.read(&keys::sessions(user_id)) {
            Some(raw) => match serde_json::from_str::<Vec<ChatSession>>(&raw) {
                Ok(sessions) => self.sessions = sessions,
                Err(e) => {
                    tracing::warn!("Discarding unreadable chat sessions for {}: {}", user_id, e);
                }
            },
            None => {
                if let Some(session) = self.migrate_legacy_history() {
                    self.sessions.push(session);
                    migrated = true;
                }
            }
        }

        let saved_current = self.read(&keys::current_session(user_id));
        self.current = saved_current
            .filter(|id| self.contains(id))
            .or_else(|| self.sessions.first().map(|s| s.id.clone()));

        tracing::debug!(
            "Loaded {} chat session(s) for user {}",
            self.sessions.len(),
            user_id
        );

        if migrated {
            self.persist();
            if let Err(e) = self.storage.remove(keys::LEGACY_MESSAGES) {
                tracing::warn!("Failed to remove legacy chat history: {}", e);
            }
        }
    }

    fn invalidate_previous_user(&self, user_id: &str) {
        if let Some(previous) = self.read(keys::LAST_USER_ID) {
            if previous != user_id {
                tracing::info!("Signed-in user changed; clearing stored chats of previous user");
                for key in [
                    keys::sessions(&previous),
                    keys::current_session(&previous),
                    keys::LEGACY_MESSAGES.to_string(),
                ] {
                    if let Err(e) = self.storage.remove(&key) {
                        tracing::warn!("Failed to clear {}: {}", key, e);
                    }
                }
            }
        }

        if let Err(e) = self.storage.set(keys::LAST_USER_ID, user_id) {
            tracing::warn!("Failed to record last user id: {}", e);
        }
    }

    fn migrate_legacy_history(&self) -> Option<ChatSession> {
        let raw = self.read(keys::LEGACY_MESSAGES)?;
        let messages: Vec<Message> = match serde_json::from_str(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Ignoring unreadable legacy chat history: {}", e);
                return None;
            }
        };

        let first = messages.first()?;
        let last = messages.last()?;

        let mut session = ChatSession::new();
        session.created_at = first.timestamp;
        session.updated_at = last.timestamp;
        if let Some(first_user) = messages.iter().find(|m| m.role == MessageRole::User) {
            session.title = crate::chat::session::derive_title(&first_user.content);
        }
        session.messages = messages;

        tracing::info!(
            "Migrated {} legacy message(s) into session {}",
            session.messages.len(),
            session.id
        );
        Some(session)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    /// Write the session list and current pointer for the loaded user
    ///
    /// Never fails; errors are logged. Does nothing before [`SessionStore::load`].
    pub fn persist(&self) {
        let Some(user_id) = self.user_id.as_deref() else {
            tracing::debug!("No user loaded; skipping session persistence");
            return;
        };

        match serde_json::to_string(&self.sessions) {
            Ok(json) => {
                if let Err(e) = self.storage.set(&keys::sessions(user_id), &json) {
                    tracing::warn!("Failed to persist chat sessions: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize chat sessions: {}", e),
        }

        let pointer_key = keys::current_session(user_id);
        let result = match &self.current {
            Some(id) => self.storage.set(&pointer_key, id),
            None => self.storage.remove(&pointer_key),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to persist current session: {}", e);
        }
    }

    /// Start an empty session at the head of the list and make it current
    pub fn create_session(&mut self) -> String {
        let session = ChatSession::new();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.current = Some(id.clone());
        tracing::debug!("Created chat session {}", id);
        self.persist();
        id
    }

    /// Remove a session
    ///
    /// If it was current, the most recently created remaining session becomes
    /// current, or a fresh session is created when none remain. Unknown ids
    /// are ignored.
    pub fn delete_session(&mut self, id: &str) {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            tracing::debug!("Ignoring delete of unknown session {}", id);
            return;
        };
        self.sessions.remove(index);

        if self.current.as_deref() == Some(id) {
            let next = self
                .sessions
                .iter()
                .rev()
                .max_by_key(|s| s.created_at)
                .map(|s| s.id.clone());

            match next {
                Some(next) => self.current = Some(next),
                None => {
                    // create_session persists
                    self.create_session();
                    return;
                }
            }
        }

        self.persist();
    }

    /// Append `message` to the session `session_id`
    ///
    /// Returns false, without side effects, if the session no longer exists.
    pub fn append_message(&mut self, session_id: &str, message: Message) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            tracing::warn!("Dropping message for missing session {}", session_id);
            return false;
        };
        session.push(message);
        self.persist();
        true
    }

    /// Point the current session at `session_id`; unknown ids are ignored
    pub fn set_current(&mut self, session_id: &str) -> bool {
        if self.contains(session_id) {
            self.current = Some(session_id.to_string());
            true
        } else {
            false
        }
    }

    /// Id of the current session, creating one if none is valid
    pub fn resolve_or_create_current(&mut self) -> String {
        match self.current.as_deref() {
            Some(id) if self.contains(id) => id.to_string(),
            _ => self.create_session(),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    /// All sessions, newest first
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// Look up a session by id
    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Id of the current session
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The current session
    pub fn current(&self) -> Option<&ChatSession> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    /// User whose sessions are loaded
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}
