//! Multi-session chat state
//!
//! - [`session`]: sessions, messages, and title derivation
//! - [`store`]: the per-user, persisted session list
//! - [`usage`]: the advisory remaining-question gate
//! - [`controller`]: question submission across the three

pub mod controller;
pub mod session;
pub mod store;
pub mod usage;

pub use controller::{ChatController, GuidanceBackend, PendingSubmission, SubmitOutcome};
pub use session::{
    derive_title, ChatSession, Message, MessageMetadata, MessageRole, DEFAULT_TITLE,
    TITLE_MAX_CHARS,
};
pub use store::SessionStore;
pub use usage::{UsageGate, UsageSource, UsageStatus, DEFAULT_LIMIT_MESSAGE};
