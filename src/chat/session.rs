//! Chat sessions and messages
//!
//! A [`ChatSession`] is an append-only thread of [`Message`]s with a title
//! derived from its first user message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Title of a session that has no user message yet
pub const DEFAULT_TITLE: &str = "New Chat";

/// Characters of the first user message kept in a session title
pub const TITLE_MAX_CHARS: usize = 30;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => f.write_str("user"),
            MessageRole::Assistant => f.write_str("assistant"),
        }
    }
}

/// Provenance attached to assistant answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    /// Chart facts the answer drew on, in the order the backend listed them
    #[serde(default)]
    pub data_points_used: Vec<String>,

    /// Whether the answer passed backend validation
    #[serde(default = "default_validation_passed")]
    pub validation_passed: bool,
}

fn default_validation_passed() -> bool {
    true
}

impl Default for MessageMetadata {
    fn default() -> Self {
        Self {
            data_points_used: Vec::new(),
            validation_passed: true,
        }
    }
}

/// One message in a chat session
///
/// # Examples
///
/// ```
/// use astravaani::chat::{Message, MessageRole};
///
/// let msg = Message::user("Will this year be good for my career?");
/// assert_eq!(msg.role, MessageRole::User);
/// assert!(msg.metadata.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    fn new(
        role: MessageRole,
        content: impl Into<String>,
        metadata: Option<MessageMetadata>,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// A message typed by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, None)
    }

    /// An assistant answer with provenance
    pub fn assistant(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self::new(MessageRole::Assistant, content, Some(metadata))
    }

    /// An assistant-role record of a failed request
    ///
    /// Keeps the failure visible in the thread without touching session state.
    pub fn assistant_error(error: impl fmt::Display) -> Self {
        Self::new(
            MessageRole::Assistant,
            format!("Sorry, I couldn't answer that: {}", error),
            None,
        )
    }
}

/// A titled thread of messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// An empty session titled [`DEFAULT_TITLE`]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message, keeping timestamps non-decreasing
    ///
    /// The first user message of a session fixes its title.
    pub fn push(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }

        if self.messages.is_empty() && message.role == MessageRole::User {
            self.title = derive_title(&message.content);
        }

        self.updated_at = message.timestamp.max(self.updated_at);
        self.messages.push(message);
    }

    /// Number of messages in the thread
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the thread has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Title for a session whose first message is `content`
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters and appends `...` when
/// anything was cut. Counts characters, not bytes.
///
/// # Examples
///
/// ```
/// use astravaani::chat::derive_title;
///
/// assert_eq!(derive_title("Hello"), "Hello");
/// assert_eq!(
///     derive_title("What does my chart say about my career?"),
///     "What does my chart say about m..."
/// );
/// ```
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
