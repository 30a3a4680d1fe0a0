//! Key layout of the local store
//!
//! Chat data is namespaced by user id so that two accounts sharing one
//! machine never see each other's sessions.

/// Bearer token of the signed-in account
pub const TOKEN: &str = "token";

/// Id of the last user whose chat sessions were loaded
pub const LAST_USER_ID: &str = "chat_last_user_id";

/// Single-thread chat history written by older clients (not namespaced)
pub const LEGACY_MESSAGES: &str = "chat_messages";

/// Session list for one user
pub fn sessions(user_id: &str) -> String {
    format!("chat_sessions_{}", user_id)
}

/// Current-session pointer for one user
pub fn current_session(user_id: &str) -> String {
    format!("chat_current_session_{}", user_id)
}
